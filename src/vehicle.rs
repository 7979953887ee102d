//! EUC balance model.
//!
//! Everything here is a pure function of its arguments. The vehicle system
//! feeds calibrated lean input through [`ride`] once per tick and applies
//! the result to the rider's components; it raises a fall when [`ride`]
//! reports a [`FallCause`].

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::components::{EucState, Hazard, ObstacleKind};
use crate::config::VehicleTuning;
use crate::constants::PWM_CEILING;
use crate::numeric::{finite_or, lerp, move_towards};

/// Normalised rider lean, each axis in `[-1, 1]`.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LeanInput {
    /// Positive leans forward (accelerate), negative leans back (brake).
    pub forward: f32,
    /// Positive leans right.
    pub side: f32,
}

impl LeanInput {
    /// Reading with the given axes, unclamped.
    #[must_use]
    pub const fn new(forward: f32, side: f32) -> Self {
        Self { forward, side }
    }

    /// Clamps both axes into `[-1, 1]`; non-finite readings become zero.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            forward: finite_or(self.forward, 0.0).clamp(-1.0, 1.0),
            side: finite_or(self.side, 0.0).clamp(-1.0, 1.0),
        }
    }

    /// Combined lean of both axes.
    #[must_use]
    pub fn magnitude(self) -> f32 {
        self.forward.hypot(self.side)
    }
}

/// Neutral lean recorded while the rider stands still during calibration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Reading that maps to zero lean.
    pub neutral: LeanInput,
}

impl Calibration {
    /// Calibration around `neutral`; non-finite axes become zero.
    #[must_use]
    pub fn new(neutral: LeanInput) -> Self {
        Self {
            neutral: LeanInput {
                forward: finite_or(neutral.forward, 0.0),
                side: finite_or(neutral.side, 0.0),
            },
        }
    }

    /// Removes the neutral offset from a raw reading.
    ///
    /// ```
    /// use monowheel::vehicle::{Calibration, LeanInput};
    /// let calibration = Calibration::new(LeanInput::new(0.1, -0.2));
    /// let lean = calibration.apply(LeanInput::new(0.1, 1.0));
    /// assert_eq!(lean, LeanInput::new(0.0, 1.0));
    /// ```
    #[must_use]
    pub fn apply(&self, raw: LeanInput) -> LeanInput {
        LeanInput {
            forward: raw.forward - self.neutral.forward,
            side: raw.side - self.neutral.side,
        }
        .clamped()
    }
}

/// Why the rider came off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallCause {
    /// Lean left the stability envelope.
    Lean,
    /// Motor load exceeded what the motor can deliver, or the battery ran
    /// flat.
    MotorCutout,
    /// Hit a lethal obstacle.
    Collision(ObstacleKind),
}

/// Cruise speed the EUC settles at for a given forward lean.
///
/// ```
/// use monowheel::config::VehicleTuning;
/// use monowheel::vehicle::target_speed;
/// let tuning = VehicleTuning::default();
/// assert_eq!(target_speed(0.0, &tuning), tuning.min_speed);
/// assert_eq!(target_speed(1.0, &tuning), tuning.max_speed);
/// assert_eq!(target_speed(-1.0, &tuning), 0.0);
/// ```
#[must_use]
pub fn target_speed(forward_lean: f32, tuning: &VehicleTuning) -> f32 {
    let lean = finite_or(forward_lean, 0.0).clamp(-1.0, 1.0);
    if lean > 0.0 {
        lerp(tuning.min_speed, tuning.max_speed, lean)
    } else if lean < 0.0 {
        lerp(tuning.min_speed, 0.0, -lean)
    } else {
        tuning.min_speed
    }
}

/// Moves `current` towards `target`, accelerating and braking at different
/// rates. The result always lies in `[0, max_speed]`.
#[must_use]
pub fn update_speed(current: f32, target: f32, dt: f32, tuning: &VehicleTuning) -> f32 {
    let step = finite_or(dt, 0.0).max(0.0);
    let from = finite_or(current, 0.0);
    let goal = finite_or(target, tuning.min_speed).clamp(0.0, tuning.max_speed);
    let rate = if goal > from {
        tuning.acceleration
    } else {
        tuning.deceleration
    };
    move_towards(from, goal, rate * step).clamp(0.0, tuning.max_speed)
}

/// Heading change rate in rad/s. Turning authority halves at top speed.
#[must_use]
pub fn turn_rate(side_lean: f32, speed: f32, tuning: &VehicleTuning) -> f32 {
    let share = (finite_or(speed, 0.0) / tuning.max_speed).clamp(0.0, 1.0);
    finite_or(side_lean, 0.0) * tuning.max_turn_rate * 0.5f32.mul_add(-share, 1.0)
}

/// Whether the lean lies on or outside the circular stability envelope.
///
/// ```
/// use monowheel::vehicle::check_fall;
/// assert!(check_fall(0.95, 0.0, 0.95));
/// assert!(!check_fall(0.6, 0.6, 0.95));
/// ```
#[must_use]
pub fn check_fall(forward_lean: f32, side_lean: f32, critical_lean: f32) -> bool {
    forward_lean.hypot(side_lean) >= critical_lean
}

/// Extra motor load from asking for acceleration.
#[must_use]
pub fn accel_demand(forward_lean: f32, tuning: &VehicleTuning) -> f32 {
    tuning.accel_demand_gain * finite_or(forward_lean, 0.0).max(0.0)
}

/// Motor load: cruise share plus acceleration demand plus cornering.
#[must_use]
pub fn motor_load(speed: f32, forward_lean: f32, side_lean: f32, tuning: &VehicleTuning) -> f32 {
    let cruise = tuning.pwm_speed_share * finite_or(speed, 0.0) / tuning.max_speed;
    let corner = tuning.pwm_side_share * finite_or(side_lean, 0.0).abs();
    (cruise + accel_demand(forward_lean, tuning) + corner).clamp(0.0, PWM_CEILING)
}

/// Whether `pwm` exceeds what the motor can deliver.
#[must_use]
pub const fn motor_cutout(pwm: f32, tuning: &VehicleTuning) -> bool {
    pwm > tuning.pwm_cutout
}

/// Side-lean disturbance while riding over a manhole or pothole. Decays to
/// zero as the timer runs out.
#[must_use]
pub fn wobble_offset(wobble_timer: f32, tuning: &VehicleTuning) -> f32 {
    if wobble_timer <= 0.0 || tuning.wobble_duration <= 0.0 {
        return 0.0;
    }
    let remaining = (wobble_timer / tuning.wobble_duration).clamp(0.0, 1.0);
    let elapsed = tuning.wobble_duration - wobble_timer;
    tuning.wobble_amplitude * remaining * (tuning.wobble_frequency * elapsed).sin()
}

/// Battery percent used over `dt` at `speed`.
#[must_use]
pub fn battery_drain(speed: f32, dt: f32, tuning: &VehicleTuning) -> f32 {
    let v = finite_or(speed, 0.0);
    tuning.battery_drain_k * v * v * finite_or(dt, 0.0).max(0.0)
}

/// Starts the effect of riding over a hazard.
pub fn apply_hazard(state: &mut EucState, hazard: Hazard, tuning: &VehicleTuning) {
    match hazard {
        Hazard::Puddle => {
            state.puddle_timer = tuning.puddle_duration;
            state.in_puddle = true;
        }
        Hazard::Wobble => state.wobble_timer = tuning.wobble_duration,
    }
}

/// Outcome of one [`ride`] tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RideStep {
    /// State after the tick.
    pub state: EucState,
    /// Heading change in radians; negative turns right.
    pub yaw_delta: f32,
    /// Why the rider fell this tick, if they did.
    pub fall: Option<FallCause>,
}

/// Advances the balance model by `dt` with calibrated lean input.
///
/// Lean is checked against the stability envelope before motor load, so a
/// rider leaning far past critical is reported as a lean fall even when the
/// motor would also have cut out.
#[must_use]
pub fn ride(state: &EucState, input: LeanInput, dt: f32, tuning: &VehicleTuning) -> RideStep {
    let step = finite_or(dt, 0.0).max(0.0);
    let lean = input.clamped();
    let mut next = *state;

    let authority = if next.puddle_timer > 0.0 {
        tuning.puddle_control_factor
    } else {
        1.0
    };
    next.forward_lean = lean.forward * authority;
    next.side_lean = lean
        .side
        .mul_add(authority, wobble_offset(next.wobble_timer, tuning))
        .clamp(-1.0, 1.0);

    next.puddle_timer = (next.puddle_timer - step).max(0.0);
    next.in_puddle = next.puddle_timer > 0.0;
    next.wobble_timer = (next.wobble_timer - step).max(0.0);

    let target = target_speed(next.forward_lean, tuning);
    next.speed = update_speed(next.speed, target, step, tuning);
    let yaw_delta = -turn_rate(next.side_lean, next.speed, tuning) * step;
    next.pwm = motor_load(next.speed, next.forward_lean, next.side_lean, tuning);

    let fall = if check_fall(next.forward_lean, next.side_lean, tuning.critical_lean) {
        Some(FallCause::Lean)
    } else if motor_cutout(next.pwm, tuning) {
        Some(FallCause::MotorCutout)
    } else {
        None
    };
    RideStep {
        state: next,
        yaw_delta,
        fall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn tuning() -> VehicleTuning {
        VehicleTuning::default()
    }

    #[rstest]
    #[case(0.5, 7.5)]
    #[case(-0.5, 1.5)]
    #[case(3.0, 12.0)]
    #[case(f32::NAN, 3.0)]
    fn target_speed_interpolates(tuning: VehicleTuning, #[case] lean: f32, #[case] expected: f32) {
        assert_relative_eq!(target_speed(lean, &tuning), expected, epsilon = 1e-5);
    }

    #[rstest]
    fn update_speed_uses_separate_rates(tuning: VehicleTuning) {
        assert_relative_eq!(update_speed(5.0, 12.0, 0.5, &tuning), 7.0);
        assert_relative_eq!(update_speed(5.0, 0.0, 0.5, &tuning), 2.0);
    }

    #[rstest]
    fn update_speed_never_leaves_range(tuning: VehicleTuning) {
        assert_relative_eq!(update_speed(20.0, 12.0, 0.0, &tuning), 12.0);
        assert_relative_eq!(update_speed(-4.0, 0.0, 0.0, &tuning), 0.0);
    }

    #[rstest]
    fn turn_rate_halves_at_top_speed(tuning: VehicleTuning) {
        let slow = turn_rate(1.0, 0.0, &tuning);
        let fast = turn_rate(1.0, tuning.max_speed, &tuning);
        assert_relative_eq!(slow, tuning.max_turn_rate);
        assert_relative_eq!(fast, tuning.max_turn_rate * 0.5);
    }

    #[rstest]
    fn motor_load_is_capped(tuning: VehicleTuning) {
        let load = motor_load(1.0e6, 1.0, 1.0, &tuning);
        assert_relative_eq!(load, PWM_CEILING);
        assert!(motor_cutout(load, &tuning));
        assert!(!motor_cutout(motor_load(3.0, 0.0, 0.0, &tuning), &tuning));
    }

    #[rstest]
    fn calibration_clamps_after_offset() {
        let calibration = Calibration::new(LeanInput::new(-0.5, 0.0));
        assert_eq!(
            calibration.apply(LeanInput::new(0.9, 0.3)),
            LeanInput::new(1.0, 0.3)
        );
    }

    #[rstest]
    fn puddle_halves_authority(tuning: VehicleTuning) {
        let mut state = EucState::default();
        apply_hazard(&mut state, Hazard::Puddle, &tuning);
        let step = ride(&state, LeanInput::new(0.8, 0.4), 0.1, &tuning);
        assert_relative_eq!(step.state.forward_lean, 0.4);
        assert_relative_eq!(step.state.side_lean, 0.2);
        assert!(step.state.in_puddle);
        assert!(step.fall.is_none());
    }

    #[rstest]
    fn puddle_wears_off(tuning: VehicleTuning) {
        let mut state = EucState::default();
        apply_hazard(&mut state, Hazard::Puddle, &tuning);
        let step = ride(&state, LeanInput::default(), tuning.puddle_duration + 0.1, &tuning);
        assert!(!step.state.in_puddle);
    }

    #[rstest]
    fn wobble_decays_to_nothing(tuning: VehicleTuning) {
        assert_relative_eq!(wobble_offset(0.0, &tuning), 0.0);
        let peak = (0..80)
            .map(|i| wobble_offset(tuning.wobble_duration - i as f32 * 0.01, &tuning).abs())
            .fold(0.0_f32, f32::max);
        assert!(peak > 0.0 && peak <= tuning.wobble_amplitude);
    }

    #[rstest]
    fn positive_side_lean_turns_right(tuning: VehicleTuning) {
        let step = ride(&EucState::default(), LeanInput::new(0.0, 0.5), 0.1, &tuning);
        assert!(step.yaw_delta < 0.0);
    }

    #[rstest]
    fn lean_fall_takes_precedence(tuning: VehicleTuning) {
        let state = EucState {
            speed: tuning.max_speed,
            ..EucState::default()
        };
        let step = ride(&state, LeanInput::new(1.0, 0.0), 0.016, &tuning);
        assert_eq!(step.fall, Some(FallCause::Lean));
    }

    #[rstest]
    fn flat_out_cornering_cuts_out(tuning: VehicleTuning) {
        let state = EucState {
            speed: tuning.max_speed,
            ..EucState::default()
        };
        let step = ride(&state, LeanInput::new(0.7, 0.6), 0.016, &tuning);
        assert_eq!(step.fall, Some(FallCause::MotorCutout));
    }

    #[rstest]
    fn battery_drain_grows_with_square_of_speed(tuning: VehicleTuning) {
        let slow = battery_drain(4.0, 1.0, &tuning);
        let fast = battery_drain(8.0, 1.0, &tuning);
        assert_relative_eq!(fast, slow * 4.0);
    }
}
