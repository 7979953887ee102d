//! Pedestrian behaviour.
//!
//! Crossing pedestrians walk to the kerb, cross, then join the pavement as
//! ordinary walkers. Walkers alternate between walking, standing and
//! chatting on their own timers. A knocked-down pedestrian is left alone;
//! its ragdoll owns the body from then on.

use std::f32::consts::PI;

use bevy_ecs::prelude::*;
use glam::Vec3;
use log::debug;
use rand::Rng;

use super::{FrameTime, SimRng};
use crate::components::{Pedestrian, PedestrianState, Transform, Velocity};
use crate::config::PedestrianTuning;
use crate::vector_math::{forward_from_yaw, planar_distance, yaw_rotation, yaw_towards};

fn face(transform: &mut Transform, yaw: f32) {
    transform.yaw = yaw;
    transform.rotation = yaw_rotation(yaw);
}

/// Heads for `goal`; returns `true` once within the arrival radius.
fn walk_to(
    transform: &mut Transform,
    velocity: &mut Velocity,
    goal: Vec3,
    speed: f32,
    tuning: &PedestrianTuning,
) -> bool {
    if planar_distance(transform.position, goal) <= tuning.arrival_radius {
        velocity.linear = Vec3::ZERO;
        return true;
    }
    face(transform, yaw_towards(transform.position, goal));
    velocity.linear = forward_from_yaw(transform.yaw) * speed;
    false
}

/// Advances every pedestrian's state machine and moves the ones on foot.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn pedestrian_ai_system(
    time: Res<FrameTime>,
    tuning: Res<PedestrianTuning>,
    mut rng: ResMut<SimRng>,
    mut pedestrians: Query<(&mut Pedestrian, &mut Transform, &mut Velocity)>,
) {
    let dt = time.0;
    for (mut pedestrian, mut transform, mut velocity) in &mut pedestrians {
        let speed = pedestrian.walk_speed;
        match pedestrian.state {
            PedestrianState::WalkingToCrossing => {
                let Some(crossing) = pedestrian.crossing else {
                    pedestrian.state = PedestrianState::Walking;
                    continue;
                };
                if walk_to(&mut transform, &mut velocity, crossing.start, speed, &tuning) {
                    pedestrian.state = PedestrianState::Crossing;
                }
            }
            PedestrianState::Crossing => {
                let Some(crossing) = pedestrian.crossing else {
                    pedestrian.state = PedestrianState::Walking;
                    continue;
                };
                if walk_to(&mut transform, &mut velocity, crossing.end, speed, &tuning) {
                    pedestrian.crossing = None;
                    pedestrian.state = PedestrianState::Walking;
                    pedestrian.timer = rng.0.gen_range(tuning.min_walk..=tuning.max_walk);
                    debug!("pedestrian finished crossing at {}", transform.position);
                }
            }
            PedestrianState::Walking => {
                velocity.linear = forward_from_yaw(transform.yaw) * speed;
                pedestrian.timer -= dt;
                if pedestrian.timer <= 0.0 {
                    velocity.linear = Vec3::ZERO;
                    pedestrian.state = if rng.0.gen_bool(f64::from(tuning.chat_chance)) {
                        PedestrianState::Chatting
                    } else {
                        PedestrianState::Standing
                    };
                    pedestrian.timer = rng.0.gen_range(tuning.min_dwell..=tuning.max_dwell);
                }
            }
            PedestrianState::Standing | PedestrianState::Chatting => {
                velocity.linear = Vec3::ZERO;
                pedestrian.timer -= dt;
                if pedestrian.timer <= 0.0 {
                    if rng.0.gen_bool(0.5) {
                        let yaw = transform.yaw + PI;
                        face(&mut transform, yaw);
                    }
                    pedestrian.state = PedestrianState::Walking;
                    pedestrian.timer = rng.0.gen_range(tuning.min_walk..=tuning.max_walk);
                }
            }
            PedestrianState::Falling => {
                velocity.linear = Vec3::ZERO;
                continue;
            }
        }
        transform.position += velocity.linear * dt;
    }
}
