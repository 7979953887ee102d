//! Applies the balance model to the rider every tick.

use bevy_ecs::prelude::*;
use glam::Vec3;
use log::info;

use super::{FallRequest, FrameTime};
use crate::components::{EucState, Player, Transform, Velocity};
use crate::config::VehicleTuning;
use crate::session::GameSession;
use crate::vector_math::{forward_from_yaw, yaw_rotation};
use crate::vehicle::{battery_drain, ride, FallCause, LeanInput};

/// Turns lean input into speed, heading and position, keeps the session's
/// distance, speed and battery up to date and raises a fall when the
/// balance model or the battery gives out.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn vehicle_system(
    time: Res<FrameTime>,
    input: Res<LeanInput>,
    tuning: Res<VehicleTuning>,
    mut session: ResMut<GameSession>,
    mut fall: ResMut<FallRequest>,
    mut riders: Query<(&mut Transform, &mut Velocity, &mut EucState, &mut Player)>,
) {
    let dt = time.0;
    for (mut transform, mut velocity, mut euc, mut player) in &mut riders {
        if !player.alive {
            continue;
        }
        let step = ride(&euc, *input, dt, &tuning);
        *euc = step.state;
        transform.yaw += step.yaw_delta;
        transform.rotation = yaw_rotation(transform.yaw);
        velocity.linear = forward_from_yaw(transform.yaw) * euc.speed;
        velocity.angular = Vec3::Y * (step.yaw_delta / dt.max(f32::EPSILON));
        transform.position += velocity.linear * dt;

        session.advance(euc.speed, dt, battery_drain(euc.speed, dt, &tuning));

        let cause = step
            .fall
            .or_else(|| session.battery_empty().then_some(FallCause::MotorCutout));
        if let Some(cause) = cause {
            player.alive = false;
            info!(
                "rider down: {cause:?} at {:.1} m/s (lean {:.2}/{:.2}, load {:.2})",
                euc.speed, euc.forward_lean, euc.side_lean, euc.pwm
            );
            fall.raise(cause);
        }
    }
}
