//! Tunable parameters loaded from JSON.
//!
//! Every section derives `Deserialize` with `#[serde(default)]`, so a
//! document only needs the fields it wants to change:
//!
//! ```
//! use monowheel::config::GameConfig;
//! let config = GameConfig::from_json_str(r#"{ "vehicle": { "max_speed": 14.0 } }"#)
//!     .expect("valid config");
//! assert!((config.vehicle.max_speed - 14.0).abs() < f32::EPSILON);
//! assert!((config.vehicle.min_speed - 3.0).abs() < f32::EPSILON);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;

/// Failure to load or validate a [`GameConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON for the config schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// A value parsed but lies outside its permitted range.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Human-readable explanation.
        reason: String,
    },
}

fn ensure(ok: bool, field: &'static str, reason: &str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: reason.to_owned(),
        })
    }
}

fn positive(value: f32, field: &'static str) -> Result<(), ConfigError> {
    ensure(value.is_finite() && value > 0.0, field, "must be finite and positive")
}

/// EUC balance, speed and failure-mode parameters.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleTuning {
    /// Cruising floor, m/s.
    pub min_speed: f32,
    /// Top speed, m/s.
    pub max_speed: f32,
    /// Speed gained per second at full forward lean.
    pub acceleration: f32,
    /// Speed shed per second at full back lean.
    pub deceleration: f32,
    /// Yaw rate at full side lean, rad/s.
    pub max_turn_rate: f32,
    /// Lean magnitude past which the rider falls.
    pub critical_lean: f32,
    /// Motor load per unit of forward lean.
    pub accel_demand_gain: f32,
    /// Share of the motor load contributed by cruising at top speed.
    pub pwm_speed_share: f32,
    /// Motor load contributed by side lean.
    pub pwm_side_share: f32,
    /// Motor load at which the motor cuts out.
    pub pwm_cutout: f32,
    /// Seconds of reduced control after a puddle.
    pub puddle_duration: f32,
    /// Fraction of lean authority kept in a puddle.
    pub puddle_control_factor: f32,
    /// Seconds a wobble lasts.
    pub wobble_duration: f32,
    /// Peak side-lean perturbation of a wobble.
    pub wobble_amplitude: f32,
    /// Wobble oscillation frequency, Hz.
    pub wobble_frequency: f32,
    /// Battery percent drained per (m/s)² per second.
    pub battery_drain_k: f32,
}

impl Default for VehicleTuning {
    fn default() -> Self {
        Self {
            min_speed: MIN_SPEED,
            max_speed: MAX_SPEED,
            acceleration: ACCELERATION,
            deceleration: DECELERATION,
            max_turn_rate: MAX_TURN_RATE,
            critical_lean: CRITICAL_LEAN,
            accel_demand_gain: ACCEL_DEMAND_GAIN,
            pwm_speed_share: PWM_SPEED_SHARE,
            pwm_side_share: PWM_SIDE_SHARE,
            pwm_cutout: PWM_CUTOUT,
            puddle_duration: PUDDLE_DURATION,
            puddle_control_factor: PUDDLE_CONTROL_FACTOR,
            wobble_duration: WOBBLE_DURATION,
            wobble_amplitude: WOBBLE_AMPLITUDE,
            wobble_frequency: WOBBLE_FREQUENCY,
            battery_drain_k: BATTERY_DRAIN_K,
        }
    }
}

impl VehicleTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.min_speed.is_finite() && self.min_speed >= 0.0,
            "vehicle.min_speed",
            "must be finite and non-negative",
        )?;
        ensure(
            self.max_speed > self.min_speed,
            "vehicle.max_speed",
            "must exceed min_speed",
        )?;
        positive(self.acceleration, "vehicle.acceleration")?;
        positive(self.deceleration, "vehicle.deceleration")?;
        positive(self.max_turn_rate, "vehicle.max_turn_rate")?;
        positive(self.critical_lean, "vehicle.critical_lean")?;
        positive(self.pwm_cutout, "vehicle.pwm_cutout")?;
        ensure(
            (0.0..=1.0).contains(&self.puddle_control_factor),
            "vehicle.puddle_control_factor",
            "must lie in [0, 1]",
        )?;
        ensure(
            self.battery_drain_k.is_finite() && self.battery_drain_k >= 0.0,
            "vehicle.battery_drain_k",
            "must be finite and non-negative",
        )
    }
}

/// Rigid-body solver settings.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Downward acceleration, m/s².
    pub gravity: f32,
    /// Solver substep length, seconds.
    pub fixed_timestep: f32,
    /// Substep cap per frame.
    pub max_substeps: u32,
    /// Joint solver passes per substep.
    pub solver_iterations: u32,
    /// Longest frame the solver will integrate.
    pub max_frame_dt: f32,
    /// Body speed clamp, m/s.
    pub max_linear_speed: f32,
    /// Body spin clamp, rad/s.
    pub max_angular_speed: f32,
    /// Fraction of linear velocity lost per second.
    pub linear_damping: f32,
    /// Fraction of angular velocity lost per second.
    pub angular_damping: f32,
    /// Ground friction coefficient.
    pub friction: f32,
    /// Ground bounce coefficient.
    pub restitution: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            fixed_timestep: FIXED_TIMESTEP,
            max_substeps: MAX_SUBSTEPS,
            solver_iterations: SOLVER_ITERATIONS,
            max_frame_dt: MAX_FRAME_DT,
            max_linear_speed: MAX_LINEAR_SPEED,
            max_angular_speed: MAX_ANGULAR_SPEED,
            linear_damping: LINEAR_DAMPING,
            angular_damping: ANGULAR_DAMPING,
            friction: BODY_FRICTION,
            restitution: BODY_RESTITUTION,
        }
    }
}

impl PhysicsTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        ensure(self.gravity.is_finite(), "physics.gravity", "must be finite")?;
        positive(self.fixed_timestep, "physics.fixed_timestep")?;
        ensure(self.max_substeps > 0, "physics.max_substeps", "must be at least 1")?;
        ensure(
            self.solver_iterations > 0,
            "physics.solver_iterations",
            "must be at least 1",
        )?;
        positive(self.max_frame_dt, "physics.max_frame_dt")?;
        positive(self.max_linear_speed, "physics.max_linear_speed")?;
        positive(self.max_angular_speed, "physics.max_angular_speed")?;
        ensure(
            self.linear_damping >= 0.0 && self.angular_damping >= 0.0,
            "physics.damping",
            "must be non-negative",
        )?;
        ensure(
            (0.0..=1.0).contains(&self.restitution),
            "physics.restitution",
            "must lie in [0, 1]",
        )
    }
}

/// Collision, near-miss and culling distances.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    /// Distance ahead within which obstacles are tested.
    pub window: f32,
    /// Distance behind the rider at which an obstacle counts as passed.
    pub pass_margin: f32,
    /// Near-miss gap for pedestrians, metres.
    pub near_miss_pedestrian: f32,
    /// Near-miss gap for cars, metres.
    pub near_miss_car: f32,
    /// Near-miss gap for everything else, metres.
    pub near_miss_default: f32,
    /// Distance behind the rider past which entities are despawned.
    pub cull_distance: f32,
    /// Minimum body speed for a ragdoll to knock over a standing pedestrian.
    pub knockdown_speed: f32,
    /// Seconds between two sounds for the same collider class.
    pub sound_cooldown: f32,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            window: COLLISION_WINDOW,
            pass_margin: PASS_MARGIN,
            near_miss_pedestrian: NEAR_MISS_PEDESTRIAN,
            near_miss_car: NEAR_MISS_CAR,
            near_miss_default: NEAR_MISS_DEFAULT,
            cull_distance: CULL_DISTANCE,
            knockdown_speed: KNOCKDOWN_SPEED,
            sound_cooldown: RAGDOLL_SOUND_COOLDOWN,
        }
    }
}

impl CollisionTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        positive(self.window, "collision.window")?;
        ensure(
            self.pass_margin.is_finite() && self.pass_margin >= 0.0,
            "collision.pass_margin",
            "must be finite and non-negative",
        )?;
        positive(self.cull_distance, "collision.cull_distance")?;
        ensure(
            self.cull_distance > self.window,
            "collision.cull_distance",
            "must exceed the collision window",
        )
    }
}

/// Session flow and scoring.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    /// First number of the start countdown.
    pub countdown_from: u8,
    /// Seconds spent falling before game over.
    pub fall_duration: f32,
    /// Number of high scores kept.
    pub high_score_slots: usize,
    /// Points per metre travelled.
    pub score_per_metre: f32,
    /// Points per near miss.
    pub score_per_near_miss: u32,
    /// Points per obstacle passed.
    pub score_per_pass: u32,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            countdown_from: COUNTDOWN_FROM,
            fall_duration: FALL_DURATION,
            high_score_slots: HIGH_SCORE_SLOTS,
            score_per_metre: SCORE_PER_METRE,
            score_per_near_miss: SCORE_PER_NEAR_MISS,
            score_per_pass: SCORE_PER_PASS,
        }
    }
}

impl SessionTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        positive(self.fall_duration, "session.fall_duration")?;
        ensure(
            self.high_score_slots > 0,
            "session.high_score_slots",
            "must keep at least one score",
        )
    }
}

/// Pedestrian walking and dwell behaviour.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PedestrianTuning {
    /// Pedestrian walking speed, m/s.
    pub walk_speed: f32,
    /// Distance at which a crossing target counts as reached.
    pub arrival_radius: f32,
    /// Shortest walking spell, seconds.
    pub min_walk: f32,
    /// Longest walking spell, seconds.
    pub max_walk: f32,
    /// Shortest standing or chatting spell, seconds.
    pub min_dwell: f32,
    /// Longest standing or chatting spell, seconds.
    pub max_dwell: f32,
    /// Chance a stop becomes a chat.
    pub chat_chance: f32,
}

impl Default for PedestrianTuning {
    fn default() -> Self {
        Self {
            walk_speed: PEDESTRIAN_WALK_SPEED,
            arrival_radius: PEDESTRIAN_ARRIVAL_RADIUS,
            min_walk: PEDESTRIAN_MIN_WALK,
            max_walk: PEDESTRIAN_MAX_WALK,
            min_dwell: PEDESTRIAN_MIN_DWELL,
            max_dwell: PEDESTRIAN_MAX_DWELL,
            chat_chance: PEDESTRIAN_CHAT_CHANCE,
        }
    }
}

impl PedestrianTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        positive(self.walk_speed, "pedestrian.walk_speed")?;
        positive(self.arrival_radius, "pedestrian.arrival_radius")?;
        ensure(
            self.min_walk > 0.0 && self.max_walk >= self.min_walk,
            "pedestrian.max_walk",
            "walk range must be positive and ordered",
        )?;
        ensure(
            self.min_dwell > 0.0 && self.max_dwell >= self.min_dwell,
            "pedestrian.max_dwell",
            "dwell range must be positive and ordered",
        )?;
        ensure(
            (0.0..=1.0).contains(&self.chat_chance),
            "pedestrian.chat_chance",
            "must lie in [0, 1]",
        )
    }
}

/// Car braking behaviour.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficTuning {
    /// Distance to a crossing pedestrian at which cars brake.
    pub braking_distance: f32,
    /// Deceleration while braking, m/s².
    pub braking_rate: f32,
    /// Acceleration back to cruise speed, m/s².
    pub accel_rate: f32,
    /// Half width of a lane, metres.
    pub lane_half_width: f32,
}

impl Default for TrafficTuning {
    fn default() -> Self {
        Self {
            braking_distance: CAR_BRAKING_DISTANCE,
            braking_rate: CAR_BRAKING_RATE,
            accel_rate: CAR_ACCEL_RATE,
            lane_half_width: LANE_HALF_WIDTH,
        }
    }
}

impl TrafficTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        positive(self.braking_distance, "traffic.braking_distance")?;
        positive(self.braking_rate, "traffic.braking_rate")?;
        positive(self.accel_rate, "traffic.accel_rate")?;
        positive(self.lane_half_width, "traffic.lane_half_width")
    }
}

/// Pigeon flock behaviour.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PigeonTuning {
    /// Rider distance that startles a flock.
    pub startle_radius: f32,
    /// Seconds between startle and take-off.
    pub startled_time: f32,
    /// Seconds of flight before landing.
    pub flight_time: f32,
    /// Horizontal flight speed, m/s.
    pub flight_speed: f32,
    /// Vertical flight speed, m/s.
    pub climb_rate: f32,
    /// Pigeon walking speed, m/s.
    pub walk_speed: f32,
    /// Shortest walk or peck spell, seconds.
    pub min_phase: f32,
    /// Longest walk or peck spell, seconds.
    pub max_phase: f32,
}

impl Default for PigeonTuning {
    fn default() -> Self {
        Self {
            startle_radius: PIGEON_STARTLE_RADIUS,
            startled_time: PIGEON_STARTLED_TIME,
            flight_time: PIGEON_FLIGHT_TIME,
            flight_speed: PIGEON_FLIGHT_SPEED,
            climb_rate: PIGEON_CLIMB_RATE,
            walk_speed: PIGEON_WALK_SPEED,
            min_phase: PIGEON_MIN_PHASE,
            max_phase: PIGEON_MAX_PHASE,
        }
    }
}

impl PigeonTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        positive(self.startle_radius, "pigeon.startle_radius")?;
        positive(self.startled_time, "pigeon.startled_time")?;
        positive(self.flight_time, "pigeon.flight_time")?;
        ensure(
            self.min_phase > 0.0 && self.max_phase >= self.min_phase,
            "pigeon.max_phase",
            "phase range must be positive and ordered",
        )
    }
}

/// Complete configuration for a [`crate::game::Game`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// EUC parameters.
    pub vehicle: VehicleTuning,
    /// Solver parameters.
    pub physics: PhysicsTuning,
    /// Collision and near-miss parameters.
    pub collision: CollisionTuning,
    /// Session flow and scoring.
    pub session: SessionTuning,
    /// Pedestrian behaviour.
    pub pedestrian: PedestrianTuning,
    /// Car behaviour.
    pub traffic: TrafficTuning,
    /// Pigeon behaviour.
    pub pigeon: PigeonTuning,
}

impl GameConfig {
    /// Parses and validates a JSON document.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] when a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// errors of [`GameConfig::from_json_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Checks every section for out-of-range values.
    ///
    /// # Errors
    /// Returns the first [`ConfigError::Invalid`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.vehicle.validate()?;
        self.physics.validate()?;
        self.collision.validate()?;
        self.session.validate()?;
        self.pedestrian.validate()?;
        self.traffic.validate()?;
        self.pigeon.validate()
    }
}
