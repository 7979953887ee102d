//! Per-tick simulation systems and the plugin that schedules them.
//!
//! Every tick runs the sets in a fixed order:
//! [`SimSet::Vehicle`] → [`SimSet::Ai`] → [`SimSet::Ragdoll`] →
//! [`SimSet::Collision`] → [`SimSet::Culling`]. Systems never despawn
//! entities directly while iterating; they go through `Commands`, which are
//! applied at the end of the set.

mod car;
mod collision;
mod culling;
mod pedestrian;
mod pigeon;
mod ragdoll;
mod vehicle;

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use hashbrown::HashSet;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

use crate::config::GameConfig;
use crate::events::GameEventOutbox;
use crate::ragdoll::{Knockdown, RagdollSystem};
use crate::session::GameSession;
use crate::vehicle::{FallCause, LeanInput};

pub use car::car_ai_system;
pub use collision::{apply_knockdowns_system, collision_system};
pub use culling::culling_system;
pub use pedestrian::pedestrian_ai_system;
pub use pigeon::pigeon_ai_system;
pub use ragdoll::{step_ragdolls_system, sync_proxies_system};
pub use vehicle::vehicle_system;

/// Scheduling groups, run in declaration order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Rider balance and motion.
    Vehicle,
    /// Pedestrians, cars and pigeons.
    Ai,
    /// Ragdoll stepping and proxy sync.
    Ragdoll,
    /// Rider-versus-obstacle tests and knockdowns.
    Collision,
    /// Despawning what fell behind.
    Culling,
}

/// Seconds simulated by the current tick, already sanitised.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime(pub f32);

/// Whether the rider is still on the EUC.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SimulationMode {
    /// The rider is balancing and steering.
    #[default]
    Riding,
    /// The rider fell; the street keeps moving around them.
    Spectating,
}

/// Run condition for systems that only make sense while riding.
#[must_use]
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn rider_in_control(mode: Res<SimulationMode>) -> bool {
    *mode == SimulationMode::Riding
}

/// The first fall raised during a run. Later causes are ignored.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FallRequest {
    cause: Option<FallCause>,
}

impl FallRequest {
    /// Records `cause` unless a fall is already pending.
    pub const fn raise(&mut self, cause: FallCause) {
        if self.cause.is_none() {
            self.cause = Some(cause);
        }
    }

    /// The pending cause, left in place.
    #[must_use]
    pub const fn peek(&self) -> Option<FallCause> {
        self.cause
    }

    /// Removes and returns the pending cause.
    pub fn take(&mut self) -> Option<FallCause> {
        self.cause.take()
    }
}

/// Flocks told to take off.
///
/// Alarms raised during a tick are only acted on by the next tick, so a
/// startle spreads through a flock with a one-tick delay regardless of the
/// order pigeons are visited in.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct FlockAlarms {
    raised: HashSet<u32>,
    active: HashSet<u32>,
}

impl FlockAlarms {
    /// Alarms `flock`, effective from the next pigeon update.
    pub fn raise(&mut self, flock: u32) {
        self.raised.insert(flock);
    }

    /// Promotes the alarms raised since the last call.
    pub(crate) fn begin_tick(&mut self) {
        self.active = std::mem::take(&mut self.raised);
    }

    pub(crate) fn is_active(&self, flock: u32) -> bool {
        self.active.contains(&flock)
    }

    /// Whether `flock` was alarmed this tick and will react on the next.
    #[must_use]
    pub fn is_pending(&self, flock: u32) -> bool {
        self.raised.contains(&flock)
    }
}

/// Pedestrians to knock down at the end of the collision pass.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct PendingKnockdowns(pub Vec<Knockdown>);

impl PendingKnockdowns {
    /// Queues `knockdown` unless that pedestrian is already queued.
    pub fn push(&mut self, knockdown: Knockdown) {
        if self.0.iter().all(|queued| queued.entity != knockdown.entity) {
            self.0.push(knockdown);
        }
    }
}

/// Deterministic random source for AI decisions.
#[derive(Resource, Debug, Clone)]
pub struct SimRng(pub Pcg64Mcg);

impl SimRng {
    /// Generator seeded with `seed`.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self(Pcg64Mcg::seed_from_u64(seed))
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::seeded(0)
    }
}

/// Installs the simulation resources and systems.
#[derive(Debug, Clone, Default)]
pub struct SimulationPlugin {
    /// Tuning installed as resources.
    pub config: GameConfig,
    /// Seed for [`SimRng`].
    pub seed: u64,
}

impl SimulationPlugin {
    /// Plugin for `config` with AI seeded by `seed`.
    #[must_use]
    pub const fn new(config: GameConfig, seed: u64) -> Self {
        Self { config, seed }
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let config = &self.config;
        app.insert_resource(config.vehicle.clone())
            .insert_resource(config.physics.clone())
            .insert_resource(config.collision.clone())
            .insert_resource(config.session.clone())
            .insert_resource(config.pedestrian.clone())
            .insert_resource(config.traffic.clone())
            .insert_resource(config.pigeon.clone())
            .insert_resource(RagdollSystem::new(
                config.physics.clone(),
                config.collision.clone(),
            ))
            .insert_resource(SimRng::seeded(self.seed))
            .init_resource::<GameSession>()
            .init_resource::<FrameTime>()
            .init_resource::<SimulationMode>()
            .init_resource::<LeanInput>()
            .init_resource::<FallRequest>()
            .init_resource::<FlockAlarms>()
            .init_resource::<PendingKnockdowns>()
            .init_resource::<GameEventOutbox>();

        app.configure_sets(
            Update,
            (
                SimSet::Vehicle,
                SimSet::Ai,
                SimSet::Ragdoll,
                SimSet::Collision,
                SimSet::Culling,
            )
                .chain(),
        );
        app.add_systems(
            Update,
            (
                vehicle_system
                    .in_set(SimSet::Vehicle)
                    .run_if(rider_in_control),
                (pedestrian_ai_system, car_ai_system, pigeon_ai_system)
                    .chain()
                    .in_set(SimSet::Ai),
                (sync_proxies_system, step_ragdolls_system)
                    .chain()
                    .in_set(SimSet::Ragdoll),
                (
                    collision_system.run_if(rider_in_control),
                    apply_knockdowns_system,
                )
                    .chain()
                    .in_set(SimSet::Collision),
                culling_system.in_set(SimSet::Culling),
            ),
        );
    }
}
