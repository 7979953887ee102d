//! Rider-versus-obstacle handling and pedestrian knockdowns.

use bevy_ecs::prelude::*;
use glam::Vec3;
use log::{debug, info, warn};

use super::{FallRequest, FrameTime, PendingKnockdowns};
use crate::collision::{assess, Aabb, RiderSweep, Verdict};
use crate::components::{
    Collider, EucState, Obstacle, ObstacleKind, Pedestrian, PedestrianState, PhysicsProxy, Player,
    Transform, Velocity,
};
use crate::config::{CollisionTuning, VehicleTuning};
use crate::events::{GameEvent, GameEventOutbox};
use crate::ragdoll::{Knock, Knockdown, RagdollSystem};
use crate::session::GameSession;
use crate::vector_math::right_from_yaw;
use crate::vehicle::{apply_hazard, FallCause};

type RiderQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static Transform,
        &'static Velocity,
        &'static Collider,
        &'static mut EucState,
        &'static mut Player,
    ),
>;

type ObstacleQuery<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static Transform,
        &'static Collider,
        &'static mut Obstacle,
        Option<&'static Velocity>,
        Option<&'static Pedestrian>,
    ),
    Without<Player>,
>;

/// Tests the rider against nearby obstacles.
///
/// Hazards slow or unsettle the rider, lethal obstacles end the ride and
/// obstacles that fall behind are counted as passed, scoring a near miss
/// when the rider squeezed past. Each obstacle reacts to at most one
/// overlap and one pass. Contact is tested along the tick's movement of
/// both the rider and the obstacle, so an obstacle the rider went through
/// during a long frame is hit rather than passed.
#[expect(
    clippy::too_many_arguments,
    reason = "Bevy systems receive each resource as a separate parameter."
)]
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn collision_system(
    time: Res<FrameTime>,
    collision: Res<CollisionTuning>,
    vehicle: Res<VehicleTuning>,
    mut session: ResMut<GameSession>,
    mut outbox: ResMut<GameEventOutbox>,
    mut fall: ResMut<FallRequest>,
    mut knockdowns: ResMut<PendingKnockdowns>,
    mut riders: RiderQuery<'_, '_>,
    mut obstacles: ObstacleQuery<'_, '_>,
) {
    let Ok((transform, velocity, collider, mut euc, mut player)) = riders.single_mut() else {
        return;
    };
    let dt = time.0;
    let rider = RiderSweep {
        bounds: Aabb::of(transform, collider),
        position: transform.position,
        motion: velocity.linear * dt,
        forward: transform.forward(),
        right: right_from_yaw(transform.yaw),
    };

    for (entity, at, shape, mut obstacle, moving, pedestrian) in &mut obstacles {
        if !player.alive {
            break;
        }
        if obstacle.passed
            || !collider.interacts_with(shape)
            || pedestrian.is_some_and(Pedestrian::is_down)
        {
            continue;
        }
        let obstacle_motion = moving.map_or(Vec3::ZERO, |v| v.linear * dt);
        match assess(
            &rider,
            &Aabb::of(at, shape),
            obstacle_motion,
            obstacle.kind,
            &collision,
        ) {
            Verdict::Clear => {}
            Verdict::Overlap => {
                if obstacle.collided {
                    continue;
                }
                obstacle.collided = true;
                let kind = obstacle.kind;
                if let Some(hazard) = kind.hazard() {
                    apply_hazard(&mut euc, hazard, &vehicle);
                    debug!("rode through {kind:?}");
                    outbox.push(GameEvent::Collision {
                        obstacle: kind,
                        causes_game_over: false,
                    });
                    continue;
                }
                outbox.push(GameEvent::Collision {
                    obstacle: kind,
                    causes_game_over: obstacle.causes_game_over,
                });
                if !obstacle.causes_game_over {
                    debug!("brushed {kind:?}");
                    continue;
                }
                info!("hit {kind:?} at {:.1} m/s", euc.speed);
                player.alive = false;
                fall.raise(FallCause::Collision(kind));
                if kind == ObstacleKind::Pedestrian {
                    knockdowns.push(Knockdown {
                        entity,
                        impact_speed: euc.speed,
                        impact_direction: rider.forward,
                    });
                }
            }
            Verdict::Passed { gap, near_miss } => {
                obstacle.passed = true;
                session.obstacles_passed += 1;
                if near_miss && !obstacle.near_miss_triggered && !obstacle.collided {
                    obstacle.near_miss_triggered = true;
                    session.near_misses += 1;
                    debug!("near miss past {:?} ({gap:.2} m)", obstacle.kind);
                    outbox.push(GameEvent::NearMiss {
                        obstacle: obstacle.kind,
                    });
                }
            }
        }
    }
}

/// Turns queued knockdowns into pedestrian ragdolls.
///
/// The pedestrian's static proxy is removed first so the new ragdoll does
/// not start inside it; its AI then stays in `Falling` for good.
pub fn apply_knockdowns_system(
    mut commands: Commands,
    mut pending: ResMut<PendingKnockdowns>,
    mut ragdoll: ResMut<RagdollSystem>,
    mut pedestrians: Query<(
        &mut Pedestrian,
        &Transform,
        &mut Velocity,
        Option<&PhysicsProxy>,
    )>,
) {
    for knockdown in pending.0.drain(..) {
        let Ok((mut pedestrian, transform, mut velocity, proxy)) =
            pedestrians.get_mut(knockdown.entity)
        else {
            continue;
        };
        if pedestrian.is_down() {
            continue;
        }
        if let Some(proxy) = proxy {
            ragdoll.remove_static_collider(proxy.0);
            commands.entity(knockdown.entity).remove::<PhysicsProxy>();
        }
        let knock = Knock {
            position: transform.position,
            yaw: transform.yaw,
            impact_speed: knockdown.impact_speed,
            impact_direction: knockdown.impact_direction,
            entity: Some(knockdown.entity),
        };
        match ragdoll.add_pedestrian_ragdoll(&knock) {
            Ok(index) => pedestrian.ragdoll = Some(index),
            Err(err) => warn!("pedestrian ragdoll failed: {err}"),
        }
        pedestrian.state = PedestrianState::Falling;
        pedestrian.crossing = None;
        velocity.linear = Vec3::ZERO;
    }
}
