//! Pigeon flocks.
//!
//! `Walking ⇄ Pecking → Startled → Flying → Landed`. A pigeon startled by
//! the rider raises its flock's alarm; the rest of the flock reacts on the
//! following tick. Landed pigeons are despawned.

use std::f32::consts::TAU;

use bevy_ecs::prelude::*;
use glam::Vec3;
use log::debug;
use rand::Rng;

use super::{FlockAlarms, FrameTime, SimRng};
use crate::components::{Pigeon, PigeonState, Player, Transform, Velocity};
use crate::config::PigeonTuning;
use crate::vector_math::{forward_from_yaw, planar_distance, yaw_rotation, yaw_towards};

const fn startle(pigeon: &mut Pigeon, tuning: &PigeonTuning) {
    pigeon.state = PigeonState::Startled;
    pigeon.timer = tuning.startled_time;
}

/// Walks, pecks, startles and flies pigeons; startles spread flock-wide.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn pigeon_ai_system(
    mut commands: Commands,
    time: Res<FrameTime>,
    tuning: Res<PigeonTuning>,
    mut alarms: ResMut<FlockAlarms>,
    mut rng: ResMut<SimRng>,
    riders: Query<&Transform, With<Player>>,
    mut pigeons: Query<(Entity, &mut Pigeon, &mut Transform, &mut Velocity), Without<Player>>,
) {
    let dt = time.0;
    let rider = riders.iter().next().map(|transform| transform.position);
    alarms.begin_tick();

    for (entity, mut pigeon, mut transform, mut velocity) in &mut pigeons {
        if !pigeon.state.is_alarmed() {
            if alarms.is_active(pigeon.flock) {
                startle(&mut pigeon, &tuning);
            } else if rider.is_some_and(|at| {
                planar_distance(at, transform.position) < tuning.startle_radius
            }) {
                startle(&mut pigeon, &tuning);
                alarms.raise(pigeon.flock);
                debug!("flock {} startled", pigeon.flock);
            }
        }

        pigeon.timer -= dt;
        match pigeon.state {
            PigeonState::Walking => {
                velocity.linear = forward_from_yaw(pigeon.heading) * tuning.walk_speed;
                if pigeon.timer <= 0.0 {
                    pigeon.state = PigeonState::Pecking;
                    pigeon.timer = rng.0.gen_range(tuning.min_phase..=tuning.max_phase);
                }
            }
            PigeonState::Pecking => {
                velocity.linear = Vec3::ZERO;
                if pigeon.timer <= 0.0 {
                    pigeon.state = PigeonState::Walking;
                    pigeon.heading = rng.0.gen_range(0.0..TAU);
                    pigeon.timer = rng.0.gen_range(tuning.min_phase..=tuning.max_phase);
                }
            }
            PigeonState::Startled => {
                velocity.linear = Vec3::ZERO;
                if pigeon.timer <= 0.0 {
                    // Flee directly away from the rider when there is one.
                    if let Some(at) = rider {
                        pigeon.heading = yaw_towards(at, transform.position);
                    }
                    pigeon.state = PigeonState::Flying;
                    pigeon.timer = tuning.flight_time;
                }
            }
            PigeonState::Flying => {
                velocity.linear = forward_from_yaw(pigeon.heading) * tuning.flight_speed
                    + Vec3::Y * tuning.climb_rate;
                if pigeon.timer <= 0.0 {
                    pigeon.state = PigeonState::Landed;
                }
            }
            PigeonState::Landed => {
                velocity.linear = Vec3::ZERO;
                commands.entity(entity).despawn();
                continue;
            }
        }
        transform.yaw = pigeon.heading;
        transform.rotation = yaw_rotation(pigeon.heading);
        transform.position += velocity.linear * dt;
    }
}
