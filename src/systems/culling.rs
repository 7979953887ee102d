//! Despawns street content the rider has left far behind.

use bevy_ecs::prelude::*;
use log::debug;

use crate::components::{Car, Obstacle, Pedestrian, PhysicsProxy, Pigeon, Player, Transform};
use crate::config::CollisionTuning;
use crate::ragdoll::RagdollSystem;

type Cullable = Or<(With<Obstacle>, With<Car>, With<Pedestrian>, With<Pigeon>)>;

/// Removes anything more than the cull distance behind the rider.
///
/// Static proxies are unregistered before the entity is despawned so the
/// ragdoll world never holds colliders for entities that no longer exist.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn culling_system(
    mut commands: Commands,
    tuning: Res<CollisionTuning>,
    mut ragdoll: ResMut<RagdollSystem>,
    riders: Query<&Transform, With<Player>>,
    candidates: Query<(Entity, &Transform, Option<&PhysicsProxy>), (Cullable, Without<Player>)>,
) {
    let Some(rider) = riders.iter().next() else {
        return;
    };
    let forward = rider.forward();
    let mut culled = 0_usize;
    for (entity, transform, proxy) in &candidates {
        let behind = -(transform.position - rider.position).dot(forward);
        if behind <= tuning.cull_distance {
            continue;
        }
        if let Some(proxy) = proxy {
            ragdoll.remove_static_collider(proxy.0);
        }
        commands.entity(entity).despawn();
        culled += 1;
    }
    if culled > 0 {
        debug!("culled {culled} entities behind the rider");
    }
}
