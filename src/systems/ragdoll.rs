//! Keeps the ragdoll world in step with the ECS.

use bevy_ecs::prelude::*;

use super::{FrameTime, PendingKnockdowns};
use crate::components::{Collider, PhysicsProxy, Transform};
use crate::events::GameEventOutbox;
use crate::ragdoll::RagdollSystem;

/// Moves each static proxy to its entity's current transform so moving
/// cars and walking pedestrians can be hit by a falling rider.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn sync_proxies_system(
    mut ragdoll: ResMut<RagdollSystem>,
    proxies: Query<(&PhysicsProxy, &Transform, Option<&Collider>), Changed<Transform>>,
) {
    for (proxy, transform, collider) in &proxies {
        let offset = collider.map_or(glam::Vec3::ZERO, |collider| collider.offset);
        ragdoll.set_static_pose(proxy.0, transform.position + offset, transform.rotation);
    }
}

/// Steps every ragdoll, forwarding impact events and queueing knockdowns.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn step_ragdolls_system(
    time: Res<FrameTime>,
    mut ragdoll: ResMut<RagdollSystem>,
    mut outbox: ResMut<GameEventOutbox>,
    mut knockdowns: ResMut<PendingKnockdowns>,
) {
    let step = ragdoll.step(time.0);
    outbox.extend(step.events);
    for knockdown in step.knockdowns {
        knockdowns.push(knockdown);
    }
}
