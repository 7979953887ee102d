//! Physically simulated falls.
//!
//! [`RagdollSystem`] owns a [`DynamicsWorld`] holding the ground, the static
//! colliders registered for world obstacles, the rider's ragdoll and EUC
//! while a fall is in progress, and any number of pedestrian ragdolls.
//!
//! The player ragdoll moves through `Inactive → Active → Frozen →
//! Inactive`. [`RagdollSystem::start_fall`] tears down any previous rider
//! before building a new one, [`RagdollSystem::freeze`] only acts on an
//! active ragdoll, and [`RagdollSystem::stop`] is safe to call at any time.
//! Pedestrian ragdolls have their own lifecycle and survive `start_fall`.
//!
//! ```
//! use glam::Vec3;
//! use monowheel::config::{CollisionTuning, PhysicsTuning};
//! use monowheel::ragdoll::{BodyPart, FallPose, RagdollSystem};
//!
//! let mut ragdoll = RagdollSystem::new(PhysicsTuning::default(), CollisionTuning::default());
//! assert!(ragdoll.part_pose(BodyPart::Head).is_none());
//! ragdoll
//!     .start_fall(&FallPose {
//!         position: Vec3::ZERO,
//!         yaw: 0.0,
//!         velocity: Vec3::new(0.0, 0.0, -5.0),
//!         side_lean: 0.0,
//!         forward_lean: 1.0,
//!     })
//!     .expect("fall starts");
//! assert!(ragdoll.is_active());
//! ragdoll.stop(true);
//! ragdoll.stop(true);
//! assert!(!ragdoll.is_active());
//! ```

mod impulse;
mod pedestrian;
mod player;
mod rig;
mod skeleton;

use bevy_ecs::prelude::{Entity, Resource};
use glam::{Quat, Vec3};
use hashbrown::HashMap;
use log::{debug, info};

use crate::config::{CollisionTuning, PhysicsTuning};
use crate::events::GameEvent;
use crate::numeric::sanitize_dt;
use crate::physics::{
    BodyDesc, BodyHandle, ColliderShape, ColliderType, ContactReport, DynamicsWorld, JointHandle,
    PhysicsError, RigidBody,
};
use pedestrian::PedestrianRagdoll;
use player::PlayerRagdoll;

pub use impulse::{
    classify_fall, euc_impact, lean_direction, player_impact, spawn_rotation, stumble_impact,
    FallKind, FallPose, ImpactVelocity,
};
pub use pedestrian::Knock;
pub use skeleton::{BodyPart, JointSpec, PartSpec, PedestrianJoint, PedestrianPart, PlayerJoint};

/// World transform of one simulated body, for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPose {
    /// Centre of mass.
    pub position: Vec3,
    /// Orientation.
    pub rotation: Quat,
}

impl BodyPose {
    pub(crate) fn of(body: &RigidBody) -> Self {
        Self {
            position: body.position(),
            rotation: body.rotation(),
        }
    }
}

/// Lifecycle of the player's ragdoll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RagdollPhase {
    /// No rider ragdoll exists.
    #[default]
    Inactive,
    /// Falling under simulation.
    Active,
    /// Still visible, no longer simulated.
    Frozen,
}

/// A static collider registered on behalf of a world obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticCollider {
    /// Classification reported in contacts.
    pub collider_type: ColliderType,
    /// Entity it stands in for, if any.
    pub owner: Option<Entity>,
}

/// A standing pedestrian that was struck hard enough to fall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Knockdown {
    /// The pedestrian.
    pub entity: Entity,
    /// Speed of whatever hit them, m/s.
    pub impact_speed: f32,
    /// Direction the hit travelled.
    pub impact_direction: Vec3,
}

/// What happened during one [`RagdollSystem::step`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RagdollStep {
    /// Audible impacts, rate-limited per channel.
    pub events: Vec<GameEvent>,
    /// Standing pedestrians hit hard enough to fall.
    pub knockdowns: Vec<Knockdown>,
}

/// Sound channels rate-limited independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Channel {
    Player,
    Ground,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Player(BodyPart),
    Euc,
    Pedestrian(usize),
}

/// Physics for every ragdoll plus the statics they can hit.
#[derive(Resource, Debug)]
pub struct RagdollSystem {
    world: DynamicsWorld,
    physics: PhysicsTuning,
    collision: CollisionTuning,
    ground: Option<BodyHandle>,
    statics: HashMap<BodyHandle, StaticCollider>,
    player: Option<PlayerRagdoll>,
    phase: RagdollPhase,
    pedestrians: Vec<PedestrianRagdoll>,
    last_sound: HashMap<(Channel, ColliderType), f32>,
    clock: f32,
}

impl RagdollSystem {
    /// Creates an empty world with a ground plane at height zero.
    #[must_use]
    pub fn new(physics: PhysicsTuning, collision: CollisionTuning) -> Self {
        let mut world = DynamicsWorld::new(physics.clone());
        let ground = world
            .add_body(&BodyDesc::fixed(ColliderShape::Plane, ColliderType::Ground))
            .ok();
        let mut statics = HashMap::new();
        if let Some(handle) = ground {
            statics.insert(
                handle,
                StaticCollider {
                    collider_type: ColliderType::Ground,
                    owner: None,
                },
            );
        }
        Self {
            world,
            physics,
            collision,
            ground,
            statics,
            player: None,
            phase: RagdollPhase::Inactive,
            pedestrians: Vec::new(),
            last_sound: HashMap::new(),
            clock: 0.0,
        }
    }

    /// The underlying world, for diagnostics.
    #[must_use]
    pub const fn dynamics(&self) -> &DynamicsWorld {
        &self.world
    }

    /// Where the rider ragdoll is in its lifecycle.
    #[must_use]
    pub const fn phase(&self) -> RagdollPhase {
        self.phase
    }

    /// Whether the rider ragdoll is being simulated.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.phase, RagdollPhase::Active)
    }

    /// Whether the rider ragdoll is held still.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        matches!(self.phase, RagdollPhase::Frozen)
    }

    /// Severity of the current rider fall.
    #[must_use]
    pub fn fall_kind(&self) -> Option<FallKind> {
        self.player.as_ref().map(|player| player.kind)
    }

    /// Registers a static obstacle collider.
    ///
    /// # Errors
    /// Rejects degenerate shapes and non-finite poses.
    pub fn add_static_collider(
        &mut self,
        shape: ColliderShape,
        position: Vec3,
        rotation: Quat,
        collider_type: ColliderType,
        owner: Option<Entity>,
    ) -> Result<BodyHandle, PhysicsError> {
        let desc = BodyDesc::fixed(shape, collider_type).with_pose(position, rotation);
        let handle = self.world.add_body(&desc)?;
        self.statics.insert(
            handle,
            StaticCollider {
                collider_type,
                owner,
            },
        );
        Ok(handle)
    }

    /// Moves a static collider, e.g. to follow a walking pedestrian.
    pub fn set_static_pose(&mut self, handle: BodyHandle, position: Vec3, rotation: Quat) -> bool {
        self.statics.contains_key(&handle) && self.world.set_pose(handle, position, rotation)
    }

    /// Unregisters a static; the ground cannot be removed.
    pub fn remove_static_collider(&mut self, handle: BodyHandle) -> bool {
        if Some(handle) == self.ground || self.statics.remove(&handle).is_none() {
            return false;
        }
        self.world.remove_body(handle)
    }

    /// Registration behind `handle`, if it is a static.
    #[must_use]
    pub fn static_collider(&self, handle: BodyHandle) -> Option<StaticCollider> {
        self.statics.get(&handle).copied()
    }

    /// Number of registered statics, not counting the ground.
    #[must_use]
    pub fn static_collider_count(&self) -> usize {
        self.statics.len() - usize::from(self.ground.is_some())
    }

    /// Removes every static collider except the ground.
    pub fn clear_static_colliders(&mut self) {
        let doomed: Vec<BodyHandle> = self
            .statics
            .keys()
            .copied()
            .filter(|handle| Some(*handle) != self.ground)
            .collect();
        for handle in doomed {
            self.statics.remove(&handle);
            self.world.remove_body(handle);
        }
    }

    /// Builds the rider's ragdoll and EUC from the pose at failure time.
    ///
    /// Any previous rider ragdoll is torn down first; pedestrian ragdolls
    /// are left alone.
    ///
    /// # Errors
    /// Propagates body construction failures, leaving the phase
    /// `Inactive`.
    pub fn start_fall(&mut self, pose: &FallPose) -> Result<FallKind, PhysicsError> {
        self.teardown_player();
        let ragdoll = PlayerRagdoll::build(&mut self.world, pose, &self.physics)?;
        let kind = ragdoll.kind;
        info!(
            "{kind:?} fall at {} (side {:.2}, forward {:.2})",
            pose.position, pose.side_lean, pose.forward_lean
        );
        self.player = Some(ragdoll);
        self.phase = RagdollPhase::Active;
        Ok(kind)
    }

    /// Stops simulating the rider but keeps the pose visible.
    ///
    /// Returns `false`, changing nothing, unless the ragdoll is active.
    pub fn freeze(&mut self) -> bool {
        if self.phase != RagdollPhase::Active {
            return false;
        }
        if let Some(player) = &self.player {
            player.set_frozen(&mut self.world, true);
        }
        self.phase = RagdollPhase::Frozen;
        debug!("ragdoll frozen");
        true
    }

    /// Tears down the rider ragdoll and EUC, and optionally every
    /// pedestrian ragdoll. Idempotent.
    pub fn stop(&mut self, include_pedestrians: bool) {
        self.teardown_player();
        if include_pedestrians {
            self.clear_pedestrian_bodies();
        }
    }

    fn teardown_player(&mut self) {
        if let Some(player) = self.player.take() {
            player.teardown(&mut self.world);
            debug!("player ragdoll removed");
        }
        self.phase = RagdollPhase::Inactive;
    }

    /// Pose of a rider body part; `None` while inactive.
    #[must_use]
    pub fn part_pose(&self, part: BodyPart) -> Option<BodyPose> {
        self.player
            .as_ref()
            .and_then(|player| player.rig.pose(&self.world, part.index()))
    }

    /// Pose of the thrown EUC; `None` while inactive.
    #[must_use]
    pub fn euc_pose(&self) -> Option<BodyPose> {
        let player = self.player.as_ref()?;
        self.world.body(player.euc).map(BodyPose::of)
    }

    /// Handle of a rider joint while a ragdoll exists.
    #[must_use]
    pub fn player_joint(&self, joint: PlayerJoint) -> Option<JointHandle> {
        self.player
            .as_ref()
            .and_then(|player| player.rig.joints.get(joint.index()).copied())
    }

    /// Current angle of a rider joint in radians.
    #[must_use]
    pub fn player_joint_angle(&self, joint: PlayerJoint) -> Option<f32> {
        self.world.joint_angle(self.player_joint(joint)?)
    }

    /// Knocks a pedestrian over and returns the index of its ragdoll.
    ///
    /// # Errors
    /// Propagates body construction failures; nothing is added then.
    pub fn add_pedestrian_ragdoll(&mut self, knock: &Knock) -> Result<usize, PhysicsError> {
        let slot = self.pedestrians.len();
        let ragdoll = PedestrianRagdoll::build(&mut self.world, slot, knock, &self.physics)?;
        self.pedestrians.push(ragdoll);
        info!(
            "pedestrian ragdoll #{slot} at {} ({:.1} m/s)",
            knock.position, knock.impact_speed
        );
        Ok(slot)
    }

    /// Number of pedestrian ragdolls.
    #[must_use]
    pub fn pedestrian_ragdoll_count(&self) -> usize {
        self.pedestrians.len()
    }

    /// Entity a pedestrian ragdoll stands in for.
    #[must_use]
    pub fn pedestrian_ragdoll_entity(&self, index: usize) -> Option<Entity> {
        self.pedestrians.get(index).and_then(|ragdoll| ragdoll.entity)
    }

    /// Pose of one part of a pedestrian ragdoll; `None` for an unknown
    /// index.
    #[must_use]
    pub fn pedestrian_part_pose(&self, index: usize, part: PedestrianPart) -> Option<BodyPose> {
        self.pedestrians
            .get(index)
            .and_then(|ragdoll| ragdoll.rig.pose(&self.world, part.index()))
    }

    /// Removes every pedestrian ragdoll.
    pub fn clear_pedestrian_bodies(&mut self) {
        for ragdoll in self.pedestrians.drain(..) {
            ragdoll.rig.teardown(&mut self.world);
        }
    }

    /// Whether anything is left to simulate.
    #[must_use]
    pub fn has_dynamic_bodies(&self) -> bool {
        self.is_active() || !self.pedestrians.is_empty()
    }

    /// Advances the simulation and routes contacts into events and
    /// knockdowns. Does nothing when no ragdoll is simulating.
    pub fn step(&mut self, dt: f32) -> RagdollStep {
        let mut outcome = RagdollStep::default();
        if !self.has_dynamic_bodies() {
            return outcome;
        }
        self.clock += sanitize_dt(dt, self.physics.max_frame_dt);
        let reports = self.world.step(dt).to_vec();
        for report in &reports {
            self.route(report, &mut outcome);
        }
        outcome
    }

    fn owner_of(&self, handle: BodyHandle) -> Option<Owner> {
        if let Some(player) = &self.player {
            if handle == player.euc {
                return Some(Owner::Euc);
            }
            if let Some(part) = player.part_of(handle) {
                return Some(Owner::Player(part));
            }
        }
        self.pedestrians
            .iter()
            .position(|ragdoll| ragdoll.owns(handle))
            .map(Owner::Pedestrian)
    }

    fn classify_other(&self, handle: BodyHandle) -> ColliderType {
        if let Some(collider) = self.statics.get(&handle) {
            return collider.collider_type;
        }
        self.world
            .body(handle)
            .map_or(ColliderType::Generic, RigidBody::collider_type)
    }

    fn route(&mut self, report: &ContactReport, outcome: &mut RagdollStep) {
        let Some(owner) = self.owner_of(report.body) else {
            return;
        };
        let speed = self
            .world
            .body(report.body)
            .map_or(0.0, |body| body.linear_velocity().length())
            .max(report.approach_speed);

        if let Some(collider) = self.statics.get(&report.other).copied() {
            if let (ColliderType::Pedestrian, Some(entity)) = (collider.collider_type, collider.owner)
            {
                self.note_knockdown(entity, report, speed, outcome);
            }
        }

        let other_type = self.classify_other(report.other);
        if report.max_impulse < other_type.impact_threshold() {
            return;
        }
        let event = match owner {
            Owner::Player(part) if part.is_core() && Some(report.other) == self.ground => (
                Channel::Ground,
                GameEvent::RagdollGroundImpact {
                    position: report.point,
                },
            ),
            Owner::Player(_) | Owner::Euc => (
                Channel::Player,
                GameEvent::RagdollCollision {
                    collider: other_type,
                },
            ),
            Owner::Pedestrian(_) => (
                Channel::Secondary,
                GameEvent::SecondaryRagdollCollision {
                    collider: other_type,
                },
            ),
        };
        let (channel, event) = event;
        if self.cooled_down(channel, other_type) {
            outcome.events.push(event);
        }
    }

    fn note_knockdown(
        &self,
        entity: Entity,
        report: &ContactReport,
        speed: f32,
        outcome: &mut RagdollStep,
    ) {
        if speed < self.collision.knockdown_speed
            || outcome.knockdowns.iter().any(|k| k.entity == entity)
        {
            return;
        }
        let velocity = self
            .world
            .body(report.body)
            .map_or(Vec3::ZERO, RigidBody::linear_velocity);
        let direction = if velocity.length_squared() > 1e-6 {
            velocity
        } else {
            report.point
                - self
                    .world
                    .body(report.body)
                    .map_or(report.point, RigidBody::position)
        };
        outcome.knockdowns.push(Knockdown {
            entity,
            impact_speed: speed,
            impact_direction: direction,
        });
    }

    fn cooled_down(&mut self, channel: Channel, collider: ColliderType) -> bool {
        let now = self.clock;
        let cooldown = self.collision.sound_cooldown;
        match self.last_sound.get(&(channel, collider)) {
            Some(last) if now - *last < cooldown => false,
            _ => {
                self.last_sound.insert((channel, collider), now);
                true
            }
        }
    }
}
