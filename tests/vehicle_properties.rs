//! Properties of the balance and motor model.

use approx::assert_relative_eq;
use monowheel::components::EucState;
use monowheel::config::VehicleTuning;
use monowheel::vehicle::{
    check_fall, motor_cutout, motor_load, ride, target_speed, turn_rate, update_speed, FallCause,
    LeanInput,
};
use rstest::{fixture, rstest};

#[fixture]
fn tuning() -> VehicleTuning {
    VehicleTuning::default()
}

#[rstest]
fn fall_envelope_is_circular(tuning: VehicleTuning) {
    let critical = tuning.critical_lean;
    for step in 0..64 {
        let angle = step as f32 * std::f32::consts::TAU / 64.0;
        let (sin, cos) = angle.sin_cos();
        assert!(
            check_fall(cos * critical * 1.001, sin * critical * 1.001, critical),
            "outside at {angle}"
        );
        assert!(
            !check_fall(cos * critical * 0.99, sin * critical * 0.99, critical),
            "inside at {angle}"
        );
    }
}

#[rstest]
#[case(0.95, 0.0)]
#[case(0.0, -0.95)]
#[case(0.6, 0.8)]
fn boundary_of_envelope_falls(#[case] forward: f32, #[case] side: f32) {
    assert!(check_fall(forward, side, forward.hypot(side)));
}

#[rstest]
fn speed_converges_without_leaving_range(
    tuning: VehicleTuning,
    #[values(0.0, 3.0, 7.5, 12.0)] target: f32,
    #[values(0.0, 12.0)] start: f32,
    #[values(1.0 / 120.0, 1.0 / 30.0, 0.25)] dt: f32,
) {
    let mut speed = start;
    for _ in 0..2000 {
        speed = update_speed(speed, target, dt, &tuning);
        assert!((0.0..=tuning.max_speed).contains(&speed));
    }
    if dt > 0.0 {
        assert_relative_eq!(speed, target, epsilon = 1e-4);
    }
}

#[rstest]
fn zero_dt_holds_speed(tuning: VehicleTuning) {
    assert_relative_eq!(update_speed(5.0, 12.0, 0.0, &tuning), 5.0);
}

#[rstest]
fn turning_authority_never_grows_with_speed(
    tuning: VehicleTuning,
    #[values(0.1, 0.5, 1.0)] side: f32,
) {
    let mut previous = f32::INFINITY;
    for step in 0..=48 {
        let speed = tuning.max_speed * step as f32 / 48.0;
        let rate = turn_rate(side, speed, &tuning).abs();
        assert!(rate <= previous + 1e-6, "rate rose at {speed} m/s");
        previous = rate;
    }
}

#[rstest]
fn target_speed_follows_lean(tuning: VehicleTuning) {
    assert_relative_eq!(target_speed(0.0, &tuning), tuning.min_speed);
    assert_relative_eq!(target_speed(1.0, &tuning), tuning.max_speed);
    assert_relative_eq!(target_speed(-1.0, &tuning), 0.0);
    assert!(target_speed(0.5, &tuning) > tuning.min_speed);
}

#[rstest]
fn motor_load_saturates(tuning: VehicleTuning) {
    let load = motor_load(tuning.max_speed * 4.0, 1.0, 1.0, &tuning);
    assert_relative_eq!(load, 1.5);
    assert!(motor_cutout(load, &tuning));
    assert!(!motor_cutout(motor_load(tuning.min_speed, 0.0, 0.0, &tuning), &tuning));
}

#[rstest]
fn flat_out_in_the_envelope_still_cuts_out(tuning: VehicleTuning) {
    let mut state = EucState {
        speed: tuning.max_speed,
        ..EucState::default()
    };
    let input = LeanInput::new(0.9, 0.0);
    let mut fall = None;
    for _ in 0..240 {
        let step = ride(&state, input, 1.0 / 60.0, &tuning);
        state = step.state;
        fall = fall.or(step.fall);
    }
    assert_eq!(fall, Some(FallCause::MotorCutout));
}
