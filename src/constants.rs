//! Tuning constants shared across the simulation.
//!
//! These are the defaults behind [`crate::config::GameConfig`]. A JSON config
//! may override most of them; the ones not exposed there are structural
//! (body-part dimensions, solver limits) and stay fixed.

use glam::Vec3;

// Vehicle.
/// Cruise speed with no forward lean, m/s.
pub const MIN_SPEED: f32 = 3.0;
/// Top speed at full forward lean, m/s.
pub const MAX_SPEED: f32 = 12.0;
/// Rate the EUC speeds up towards its target, m/s².
pub const ACCELERATION: f32 = 4.0;
/// Rate the EUC slows down towards its target, m/s².
pub const DECELERATION: f32 = 6.0;
/// Heading change at full side lean when standing still, rad/s.
pub const MAX_TURN_RATE: f32 = 1.6;
/// Radius of the stable lean envelope.
pub const CRITICAL_LEAN: f32 = 0.95;
/// Share of the motor load contributed by cruising at top speed.
pub const PWM_SPEED_SHARE: f32 = 0.7;
/// Share of the motor load contributed by cornering at full side lean.
pub const PWM_SIDE_SHARE: f32 = 0.15;
/// Motor load per unit of forward lean.
pub const ACCEL_DEMAND_GAIN: f32 = 0.4;
/// Upper bound reported for motor load; anything above 1.0 cuts out.
pub const PWM_CEILING: f32 = 1.5;
/// Motor load above which the motor cuts out.
pub const PWM_CUTOUT: f32 = 1.0;

/// Seconds of reduced control after a puddle.
pub const PUDDLE_DURATION: f32 = 1.5;
/// Lean authority kept while in a puddle.
pub const PUDDLE_CONTROL_FACTOR: f32 = 0.5;
/// Seconds a manhole or pothole keeps the EUC wobbling.
pub const WOBBLE_DURATION: f32 = 0.8;
/// Peak side lean added by a wobble.
pub const WOBBLE_AMPLITUDE: f32 = 0.25;
/// Wobble angular frequency, rad/s.
pub const WOBBLE_FREQUENCY: f32 = 9.0;

/// Battery percent drained per (m/s)² per second.
pub const BATTERY_DRAIN_K: f32 = 0.0025;
/// Battery percent at the start of a run.
pub const FULL_BATTERY: f32 = 100.0;

// Rigid-body engine.
/// Vertical acceleration, m/s².
pub const GRAVITY: f32 = -13.0;
/// Length of one solver step, seconds.
pub const FIXED_TIMESTEP: f32 = 1.0 / 120.0;
/// Most fixed steps run for a single frame.
pub const MAX_SUBSTEPS: u32 = 8;
/// XPBD substeps inside each fixed step.
pub const SOLVER_ITERATIONS: u32 = 4;
/// Longest frame the solver accepts before clamping.
pub const MAX_FRAME_DT: f32 = 1.0 / 30.0;
/// Linear velocity clamp, m/s.
pub const MAX_LINEAR_SPEED: f32 = 50.0;
/// Angular velocity clamp, rad/s.
pub const MAX_ANGULAR_SPEED: f32 = 30.0;
/// Linear speed under which a body may start to sleep.
pub const SLEEP_LINEAR_THRESHOLD: f32 = 0.05;
/// Angular speed under which a body may start to sleep.
pub const SLEEP_ANGULAR_THRESHOLD: f32 = 0.05;
/// Seconds a body must rest before it sleeps.
pub const SLEEP_DELAY: f32 = 0.5;
/// Fraction of linear velocity lost per second.
pub const LINEAR_DAMPING: f32 = 0.05;
/// Fraction of angular velocity lost per second.
pub const ANGULAR_DAMPING: f32 = 0.25;
/// Default Coulomb friction coefficient.
pub const BODY_FRICTION: f32 = 0.6;
/// Default restitution.
pub const BODY_RESTITUTION: f32 = 0.15;

// Ragdoll.
/// Lean magnitude above which a fall counts as a hard (collision) fall.
pub const HARD_FALL_LEAN: f32 = 0.3;
/// Tilt applied to the spawn pose per unit of lean, in radians.
pub const LEAN_TILT: f32 = 0.6;
/// Mass of the EUC body, kg.
pub const EUC_MASS: f32 = 25.0;
/// EUC wheel radius, metres.
pub const EUC_WHEEL_RADIUS: f32 = 0.2;
/// Height of the rider's hips above the EUC ground contact.
pub const HIP_HEIGHT: f32 = 1.15;
/// Minimum body speed for a ragdoll to knock over a standing pedestrian.
pub const KNOCKDOWN_SPEED: f32 = 3.0;
/// Seconds between two sounds for the same collider class.
pub const RAGDOLL_SOUND_COOLDOWN: f32 = 0.15;

// Collision and scoring.
/// Obstacles further than this along Z from the player are not tested.
pub const COLLISION_WINDOW: f32 = 6.0;
/// Distance behind the player after which an obstacle counts as passed.
pub const PASS_MARGIN: f32 = 1.0;
/// Near-miss gap for pedestrians, metres.
pub const NEAR_MISS_PEDESTRIAN: f32 = 1.2;
/// Near-miss gap for cars, metres.
pub const NEAR_MISS_CAR: f32 = 2.8;
/// Near-miss gap for every other lethal obstacle, metres.
pub const NEAR_MISS_DEFAULT: f32 = 1.0;
/// Distance behind the player after which content is despawned.
pub const CULL_DISTANCE: f32 = 40.0;
/// Points per metre ridden.
pub const SCORE_PER_METRE: f32 = 10.0;
/// Points per near miss.
pub const SCORE_PER_NEAR_MISS: u32 = 50;
/// Points per obstacle passed.
pub const SCORE_PER_PASS: u32 = 5;

// Session.
/// Seconds counted down before a run.
pub const COUNTDOWN_FROM: u8 = 3;
/// Longest frame the ECS tick accepts; the ragdoll clamps further.
pub const MAX_TICK_DT: f32 = 0.1;
/// Seconds between the fall and game over.
pub const FALL_DURATION: f32 = 3.0;
/// Entries kept in the high-score table.
pub const HIGH_SCORE_SLOTS: usize = 10;

// Pedestrians, cars and pigeons.
/// Pedestrian walking speed, m/s.
pub const PEDESTRIAN_WALK_SPEED: f32 = 1.3;
/// Distance at which a pedestrian has reached a waypoint.
pub const PEDESTRIAN_ARRIVAL_RADIUS: f32 = 0.3;
/// Shortest sidewalk walk, seconds.
pub const PEDESTRIAN_MIN_WALK: f32 = 3.0;
/// Longest sidewalk walk, seconds.
pub const PEDESTRIAN_MAX_WALK: f32 = 8.0;
/// Shortest stand or chat, seconds.
pub const PEDESTRIAN_MIN_DWELL: f32 = 1.0;
/// Longest stand or chat, seconds.
pub const PEDESTRIAN_MAX_DWELL: f32 = 4.0;
/// Probability that a standing pedestrian starts chatting instead of walking.
pub const PEDESTRIAN_CHAT_CHANCE: f32 = 0.35;
/// Distance ahead at which a car brakes for a crossing pedestrian.
pub const CAR_BRAKING_DISTANCE: f32 = 12.0;
/// Car braking rate, m/s².
pub const CAR_BRAKING_RATE: f32 = 8.0;
/// Car acceleration back to cruise, m/s².
pub const CAR_ACCEL_RATE: f32 = 3.0;
/// Half the width of a traffic lane.
pub const LANE_HALF_WIDTH: f32 = 1.6;
/// Rider distance that startles a pigeon.
pub const PIGEON_STARTLE_RADIUS: f32 = 2.5;
/// Seconds a pigeon stays startled before taking off.
pub const PIGEON_STARTLED_TIME: f32 = 0.2;
/// Longest flight before the pigeon is gone, seconds.
pub const PIGEON_FLIGHT_TIME: f32 = 2.5;
/// Flight speed, m/s.
pub const PIGEON_FLIGHT_SPEED: f32 = 4.0;
/// Walking speed, m/s.
pub const PIGEON_WALK_SPEED: f32 = 0.3;
/// Shortest walk or peck phase, seconds.
pub const PIGEON_MIN_PHASE: f32 = 0.8;
/// Longest walk or peck phase, seconds.
pub const PIGEON_MAX_PHASE: f32 = 2.5;
/// Climb speed while flying, m/s.
pub const PIGEON_CLIMB_RATE: f32 = 1.5;

// Collider sizes.
/// Rider box half extents.
pub const PLAYER_HALF_EXTENTS: Vec3 = Vec3::new(0.3, 0.9, 0.3);
/// Pedestrian box half extents.
pub const PEDESTRIAN_HALF_EXTENTS: Vec3 = Vec3::new(0.25, 0.9, 0.2);
/// Car box half extents.
pub const CAR_HALF_EXTENTS: Vec3 = Vec3::new(0.9, 0.75, 2.1);
/// Pigeon box half extents.
pub const PIGEON_HALF_EXTENTS: Vec3 = Vec3::new(0.1, 0.12, 0.15);
