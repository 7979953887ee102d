//! ECS component types used by the game.
//! Poses, velocities and colliders shared by every simulated entity, plus
//! the per-role state for the rider, obstacles, pedestrians, cars and
//! pigeons.
use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::CollisionTuning;
use crate::physics::{BodyHandle, ColliderType};
use crate::vector_math::{forward_from_yaw, yaw_rotation};

/// World pose. `yaw` is the heading about +Y; `rotation` includes any
/// visual tilt on top of it.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// World position, metres.
    pub position: Vec3,
    /// Full orientation.
    pub rotation: Quat,
    /// Heading about +Y in radians; 0 faces −Z.
    pub yaw: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            yaw: 0.0,
        }
    }
}

impl Transform {
    /// Unrotated pose at `position`.
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Sets the heading and resets the rotation to match it.
    #[must_use]
    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self.rotation = yaw_rotation(yaw);
        self
    }

    /// Unit heading on the ground plane.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        forward_from_yaw(self.yaw)
    }
}

/// Linear and angular velocity.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    /// Metres per second.
    pub linear: Vec3,
    /// Radians per second about each axis.
    pub angular: Vec3,
}

/// Collision layer bits for [`Collider::group`] and [`Collider::mask`].
pub mod layers {
    /// The rider.
    pub const PLAYER: u32 = 1;
    /// Static street furniture.
    pub const OBSTACLE: u32 = 1 << 1;
    /// Pedestrians.
    pub const PEDESTRIAN: u32 = 1 << 2;
    /// Cars.
    pub const CAR: u32 = 1 << 3;
    /// Puddles, manholes and potholes.
    pub const HAZARD: u32 = 1 << 4;
    /// Every layer.
    pub const ALL: u32 = u32::MAX;
}

/// Axis-aligned box collider relative to the entity's position.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    /// Half size along each axis.
    pub half_extents: Vec3,
    /// Box centre relative to the entity position.
    pub offset: Vec3,
    /// Layers this collider belongs to.
    pub group: u32,
    /// Layers this collider tests against.
    pub mask: u32,
}

impl Collider {
    /// Centred box in `group` that tests against every layer.
    #[must_use]
    pub const fn new(half_extents: Vec3, group: u32) -> Self {
        Self {
            half_extents,
            offset: Vec3::ZERO,
            group,
            mask: layers::ALL,
        }
    }

    /// Moves the box centre by `offset`.
    #[must_use]
    pub const fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    /// Restricts the layers this collider tests against.
    #[must_use]
    pub const fn with_mask(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }

    /// Whether `other` is on a layer this collider tests against.
    #[must_use]
    pub const fn interacts_with(&self, other: &Self) -> bool {
        self.mask & other.group != 0
    }
}

/// Balance and motor state of the rider's EUC.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct EucState {
    /// Calibrated forward lean in [-1, 1].
    pub forward_lean: f32,
    /// Calibrated side lean in [-1, 1], positive to the right.
    pub side_lean: f32,
    /// Ground speed, m/s.
    pub speed: f32,
    /// Motor load from the last tick.
    pub pwm: f32,
    /// Seconds of reduced lean authority left.
    pub puddle_timer: f32,
    /// Whether puddle control loss is in effect.
    pub in_puddle: bool,
    /// Seconds of side-lean perturbation left.
    pub wobble_timer: f32,
}

impl Default for EucState {
    fn default() -> Self {
        Self {
            forward_lean: 0.0,
            side_lean: 0.0,
            speed: crate::constants::MIN_SPEED,
            pwm: 0.0,
            puddle_timer: 0.0,
            in_puddle: false,
            wobble_timer: 0.0,
        }
    }
}

/// The rider. At most one per world.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    /// Cleared once the rider falls.
    pub alive: bool,
}

impl Default for Player {
    fn default() -> Self {
        Self { alive: true }
    }
}

/// What an obstacle is, which decides how touching it is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Standing water; control loss.
    Puddle,
    /// Manhole cover; wobble.
    Manhole,
    /// Pothole; wobble.
    Pothole,
    /// A parked or moving car.
    Car,
    /// A person on foot.
    Pedestrian,
    /// Lamp post.
    StreetLight,
    /// Recycling bin.
    RecycleBin,
    /// Bench.
    Bench,
    /// Building front.
    Building,
    /// Tree.
    Tree,
    /// Road barrier or any other solid block.
    Barrier,
}

/// Non-lethal effect of riding over an obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hazard {
    /// Lean authority is reduced for a while.
    Puddle,
    /// Side lean is perturbed for a while.
    Wobble,
}

impl ObstacleKind {
    /// The survivable effect of this kind, if it has one.
    #[must_use]
    pub const fn hazard(self) -> Option<Hazard> {
        match self {
            Self::Puddle => Some(Hazard::Puddle),
            Self::Manhole | Self::Pothole => Some(Hazard::Wobble),
            _ => None,
        }
    }

    /// Lateral gap below which passing this obstacle scores a near miss.
    #[must_use]
    pub const fn near_miss_threshold(self, tuning: &CollisionTuning) -> f32 {
        match self {
            Self::Pedestrian => tuning.near_miss_pedestrian,
            Self::Car => tuning.near_miss_car,
            _ => tuning.near_miss_default,
        }
    }

    /// Whether passing close to this obstacle can score at all.
    #[must_use]
    pub const fn scores_near_miss(self) -> bool {
        self.hazard().is_none()
    }

    /// Classification of the static collider registered for this obstacle.
    #[must_use]
    pub const fn collider_type(self) -> ColliderType {
        match self {
            Self::Car => ColliderType::Car,
            Self::Pedestrian => ColliderType::Pedestrian,
            Self::StreetLight => ColliderType::StreetLight,
            Self::RecycleBin => ColliderType::RecycleBin,
            Self::Bench => ColliderType::Bench,
            Self::Building => ColliderType::Building,
            Self::Tree => ColliderType::Tree,
            Self::Puddle | Self::Manhole | Self::Pothole | Self::Barrier => ColliderType::Generic,
        }
    }

    /// Default lethality: hazards are survivable, everything else is not.
    #[must_use]
    pub const fn default_lethal(self) -> bool {
        self.hazard().is_none()
    }
}

/// Something the rider can hit or pass.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Obstacle {
    /// What it is.
    pub kind: ObstacleKind,
    /// Whether hitting it ends the run.
    pub causes_game_over: bool,
    /// Set once it falls behind the rider.
    pub passed: bool,
    /// Set once a near miss has been scored for it.
    pub near_miss_triggered: bool,
    /// Set once the rider has touched it.
    pub collided: bool,
}

impl Obstacle {
    /// Fresh obstacle with the kind's default lethality.
    #[must_use]
    pub const fn new(kind: ObstacleKind) -> Self {
        Self {
            kind,
            causes_game_over: kind.default_lethal(),
            passed: false,
            near_miss_triggered: false,
            collided: false,
        }
    }
}

/// Pedestrian AI state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PedestrianState {
    /// Heading for the kerb where it will cross.
    WalkingToCrossing,
    /// On the road.
    Crossing,
    /// Strolling along the sidewalk.
    #[default]
    Walking,
    /// Waiting on the sidewalk.
    Standing,
    /// Talking to someone.
    Chatting,
    /// Ragdolled; physics owns the body from here on.
    Falling,
}

/// Kerb-to-kerb route of a crossing pedestrian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    /// Kerb the pedestrian steps off.
    pub start: Vec3,
    /// Kerb on the far side.
    pub end: Vec3,
}

/// A person on foot.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Pedestrian {
    /// AI state.
    pub state: PedestrianState,
    /// Walking speed, m/s.
    pub walk_speed: f32,
    /// Route while crossing.
    pub crossing: Option<Crossing>,
    /// Countdown until the next walking/standing/chatting decision.
    pub timer: f32,
    /// Index into the ragdoll collection once knocked down.
    pub ragdoll: Option<usize>,
}

impl Pedestrian {
    /// Sidewalk pedestrian deciding again after `timer` seconds.
    #[must_use]
    pub const fn walking(walk_speed: f32, timer: f32) -> Self {
        Self {
            state: PedestrianState::Walking,
            walk_speed,
            crossing: None,
            timer,
            ragdoll: None,
        }
    }

    /// Pedestrian on their way to cross the road.
    #[must_use]
    pub const fn crossing(walk_speed: f32, crossing: Crossing) -> Self {
        Self {
            state: PedestrianState::WalkingToCrossing,
            walk_speed,
            crossing: Some(crossing),
            timer: 0.0,
            ragdoll: None,
        }
    }

    /// Whether a ragdoll has taken over.
    #[must_use]
    pub const fn is_down(&self) -> bool {
        matches!(self.state, PedestrianState::Falling)
    }

    /// Whether heading for or on the road.
    #[must_use]
    pub const fn is_crossing(&self) -> bool {
        matches!(
            self.state,
            PedestrianState::WalkingToCrossing | PedestrianState::Crossing
        )
    }
}

/// Car AI state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CarState {
    /// Holding or regaining cruise speed.
    #[default]
    Driving,
    /// Slowing for a crossing pedestrian.
    Braking,
}

/// A car driving along its lane.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Car {
    /// Current speed, m/s.
    pub speed: f32,
    /// Speed it returns to once clear, m/s.
    pub cruise_speed: f32,
    /// Lane centre on the X axis.
    pub lane: f32,
    /// +1 drives towards +Z, -1 towards -Z.
    pub direction: f32,
    /// AI state.
    pub state: CarState,
}

impl Car {
    /// Car at cruise speed in `lane`; only the sign of `direction` is kept.
    #[must_use]
    pub fn new(lane: f32, direction: f32, cruise_speed: f32) -> Self {
        Self {
            speed: cruise_speed,
            cruise_speed,
            lane,
            direction: direction.signum(),
            state: CarState::Driving,
        }
    }
}

/// Pigeon AI state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PigeonState {
    /// Strolling about.
    #[default]
    Walking,
    /// Pecking at the ground.
    Pecking,
    /// About to take off.
    Startled,
    /// In the air.
    Flying,
    /// Gone; despawned next update.
    Landed,
}

impl PigeonState {
    /// Startled or any later state.
    #[must_use]
    pub const fn is_alarmed(self) -> bool {
        matches!(self, Self::Startled | Self::Flying | Self::Landed)
    }
}

/// A pigeon, part of a flock that startles together.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Pigeon {
    /// Flock identifier shared with its flockmates.
    pub flock: u32,
    /// AI state.
    pub state: PigeonState,
    /// Seconds left in the current state.
    pub timer: f32,
    /// Heading about +Y, radians.
    pub heading: f32,
}

impl Pigeon {
    /// Walking pigeon in `flock`.
    #[must_use]
    pub const fn new(flock: u32, timer: f32, heading: f32) -> Self {
        Self {
            flock,
            state: PigeonState::Walking,
            timer,
            heading,
        }
    }
}

/// Static collider registered in the ragdoll world on behalf of an entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsProxy(pub BodyHandle);

/// Anything spawned for a run; despawned on restart.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gameplay;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ObstacleKind::Puddle, Some(Hazard::Puddle))]
    #[case(ObstacleKind::Manhole, Some(Hazard::Wobble))]
    #[case(ObstacleKind::Pothole, Some(Hazard::Wobble))]
    #[case(ObstacleKind::Car, None)]
    fn hazards_are_explicit(#[case] kind: ObstacleKind, #[case] hazard: Option<Hazard>) {
        assert_eq!(kind.hazard(), hazard);
        assert_eq!(Obstacle::new(kind).causes_game_over, hazard.is_none());
    }

    #[rstest]
    fn near_miss_thresholds_follow_kind() {
        let tuning = CollisionTuning::default();
        assert!((ObstacleKind::Pedestrian.near_miss_threshold(&tuning) - 1.2).abs() < 1e-6);
        assert!((ObstacleKind::Car.near_miss_threshold(&tuning) - 2.8).abs() < 1e-6);
        assert!((ObstacleKind::Bench.near_miss_threshold(&tuning) - 1.0).abs() < 1e-6);
    }

    #[rstest]
    fn masks_gate_interaction() {
        let player = Collider::new(Vec3::splat(0.3), layers::PLAYER)
            .with_mask(layers::OBSTACLE | layers::HAZARD);
        let puddle = Collider::new(Vec3::ONE, layers::HAZARD);
        let walker = Collider::new(Vec3::ONE, layers::PEDESTRIAN);
        assert!(player.interacts_with(&puddle));
        assert!(!player.interacts_with(&walker));
    }
}
