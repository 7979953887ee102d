//! Traffic: cars cruise along their lane and brake for crossing pedestrians.

use bevy_ecs::prelude::*;
use glam::Vec3;
use log::debug;

use super::FrameTime;
use crate::components::{Car, CarState, Pedestrian, Transform, Velocity};
use crate::config::TrafficTuning;
use crate::numeric::move_towards;

/// Whether a pedestrian at `position` blocks a car at `car_position`.
fn blocks(car: &Car, car_position: Vec3, position: Vec3, tuning: &TrafficTuning) -> bool {
    let ahead = (position.z - car_position.z) * car.direction;
    (position.x - car.lane).abs() <= tuning.lane_half_width
        && ahead > 0.0
        && ahead <= tuning.braking_distance
}

/// Brakes cars for crossing pedestrians ahead in their lane and moves them.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn car_ai_system(
    time: Res<FrameTime>,
    tuning: Res<TrafficTuning>,
    mut cars: Query<(&mut Car, &mut Transform, &mut Velocity), Without<Pedestrian>>,
    pedestrians: Query<(&Pedestrian, &Transform), Without<Car>>,
) {
    let dt = time.0;
    for (mut car, mut transform, mut velocity) in &mut cars {
        let blocked = pedestrians.iter().any(|(pedestrian, at)| {
            pedestrian.is_crossing() && blocks(&car, transform.position, at.position, &tuning)
        });
        let next = if blocked {
            CarState::Braking
        } else {
            CarState::Driving
        };
        if next != car.state {
            debug!("car in lane {:.1}: {:?} -> {next:?}", car.lane, car.state);
            car.state = next;
        }
        car.speed = match car.state {
            CarState::Braking => move_towards(car.speed, 0.0, tuning.braking_rate * dt),
            CarState::Driving => move_towards(car.speed, car.cruise_speed, tuning.accel_rate * dt),
        };
        velocity.linear = Vec3::new(0.0, 0.0, car.direction * car.speed);
        transform.position += velocity.linear * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Vec3::new(0.5, 0.0, 5.0), true)]
    #[case(Vec3::new(0.5, 0.0, -5.0), false)]
    #[case(Vec3::new(4.0, 0.0, 5.0), false)]
    #[case(Vec3::new(0.0, 0.0, 20.0), false)]
    fn only_pedestrians_ahead_in_lane_block(#[case] position: Vec3, #[case] expected: bool) {
        let car = Car::new(0.0, 1.0, 8.0);
        assert_eq!(
            blocks(&car, Vec3::ZERO, position, &TrafficTuning::default()),
            expected
        );
    }
}
