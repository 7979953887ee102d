//! Spawning street content.
//!
//! Every helper tags what it spawns with [`Gameplay`] so a restart can sweep
//! it up, and registers a typed static collider with the [`RagdollSystem`]
//! for anything a falling rider could hit.

use std::f32::consts::{PI, TAU};

use bevy_ecs::prelude::*;
use glam::Vec3;
use log::{info, warn};
use rand::Rng;

use crate::components::{
    layers, Car, Collider, Crossing, EucState, Gameplay, Obstacle, ObstacleKind, Pedestrian,
    PhysicsProxy, Pigeon, Player, Transform, Velocity,
};
use crate::config::{PedestrianTuning, PigeonTuning};
use crate::constants::{
    CAR_HALF_EXTENTS, PEDESTRIAN_HALF_EXTENTS, PIGEON_HALF_EXTENTS, PLAYER_HALF_EXTENTS,
};
use crate::physics::ColliderShape;
use crate::ragdoll::RagdollSystem;
use crate::systems::SimRng;

fn layer_of(kind: ObstacleKind) -> u32 {
    if kind.hazard().is_some() {
        return layers::HAZARD;
    }
    match kind {
        ObstacleKind::Car => layers::CAR,
        ObstacleKind::Pedestrian => layers::PEDESTRIAN,
        _ => layers::OBSTACLE,
    }
}

fn shape_of(kind: ObstacleKind, half_extents: Vec3) -> ColliderShape {
    match kind {
        ObstacleKind::StreetLight | ObstacleKind::Tree => ColliderShape::Cylinder {
            radius: half_extents.x.max(half_extents.z),
            half_height: half_extents.y,
        },
        _ => ColliderShape::cuboid(half_extents),
    }
}

/// Registers a static collider for `entity` and links it back.
fn attach_proxy(world: &mut World, entity: Entity, kind: ObstacleKind) {
    if kind.hazard().is_some() {
        return;
    }
    let Some((transform, collider)) = world
        .get::<Transform>(entity)
        .copied()
        .zip(world.get::<Collider>(entity).copied())
    else {
        return;
    };
    let registered = {
        let Some(mut ragdoll) = world.get_resource_mut::<RagdollSystem>() else {
            return;
        };
        ragdoll.add_static_collider(
            shape_of(kind, collider.half_extents),
            transform.position + collider.offset,
            transform.rotation,
            kind.collider_type(),
            Some(entity),
        )
    };
    match registered {
        Ok(handle) => {
            world.entity_mut(entity).insert(PhysicsProxy(handle));
        }
        Err(err) => warn!("no ragdoll collider for {kind:?}: {err}"),
    }
}

/// Spawns the rider facing `yaw` at `position`.
pub fn spawn_player(world: &mut World, position: Vec3, yaw: f32) -> Entity {
    let collider = Collider::new(PLAYER_HALF_EXTENTS, layers::PLAYER)
        .with_offset(Vec3::Y * PLAYER_HALF_EXTENTS.y)
        .with_mask(layers::OBSTACLE | layers::PEDESTRIAN | layers::CAR | layers::HAZARD);
    world
        .spawn((
            Transform::from_position(position).with_yaw(yaw),
            Velocity::default(),
            collider,
            EucState::default(),
            Player::default(),
            Gameplay,
        ))
        .id()
}

/// Spawns a static obstacle standing on the ground at `position`.
pub fn spawn_obstacle(
    world: &mut World,
    kind: ObstacleKind,
    position: Vec3,
    half_extents: Vec3,
) -> Entity {
    let collider = Collider::new(half_extents, layer_of(kind))
        .with_offset(Vec3::Y * half_extents.y)
        .with_mask(layers::PLAYER);
    let entity = world
        .spawn((
            Transform::from_position(position),
            collider,
            Obstacle::new(kind),
            Gameplay,
        ))
        .id();
    attach_proxy(world, entity, kind);
    entity
}

/// Spawns a pedestrian driven by `pedestrian`'s state machine.
pub fn spawn_pedestrian(
    world: &mut World,
    position: Vec3,
    yaw: f32,
    pedestrian: Pedestrian,
) -> Entity {
    let collider = Collider::new(PEDESTRIAN_HALF_EXTENTS, layers::PEDESTRIAN)
        .with_offset(Vec3::Y * PEDESTRIAN_HALF_EXTENTS.y)
        .with_mask(layers::PLAYER);
    let entity = world
        .spawn((
            Transform::from_position(position).with_yaw(yaw),
            Velocity::default(),
            collider,
            Obstacle::new(ObstacleKind::Pedestrian),
            pedestrian,
            Gameplay,
        ))
        .id();
    attach_proxy(world, entity, ObstacleKind::Pedestrian);
    entity
}

/// Spawns a car in the lane centred on `lane`, heading along `direction`
/// (+1 towards +Z).
pub fn spawn_car(world: &mut World, lane: f32, z: f32, direction: f32, cruise_speed: f32) -> Entity {
    let car = Car::new(lane, direction, cruise_speed);
    let yaw = if car.direction > 0.0 { PI } else { 0.0 };
    let collider = Collider::new(CAR_HALF_EXTENTS, layers::CAR)
        .with_offset(Vec3::Y * CAR_HALF_EXTENTS.y)
        .with_mask(layers::PLAYER);
    let entity = world
        .spawn((
            Transform::from_position(Vec3::new(lane, 0.0, z)).with_yaw(yaw),
            Velocity::default(),
            collider,
            Obstacle::new(ObstacleKind::Car),
            car,
            Gameplay,
        ))
        .id();
    attach_proxy(world, entity, ObstacleKind::Car);
    entity
}

fn place_flock(
    world: &mut World,
    rng: &mut SimRng,
    flock: u32,
    centre: Vec3,
    count: usize,
) -> Vec<Entity> {
    let tuning = world
        .get_resource::<PigeonTuning>()
        .cloned()
        .unwrap_or_default();
    (0..count)
        .map(|_| {
            let offset = Vec3::new(rng.0.gen_range(-1.0..1.0), 0.0, rng.0.gen_range(-1.0..1.0));
            let timer = rng.0.gen_range(tuning.min_phase..=tuning.max_phase);
            let pigeon = Pigeon::new(flock, timer, rng.0.gen_range(0.0..TAU));
            world
                .spawn((
                    Transform::from_position(centre + offset).with_yaw(pigeon.heading),
                    Velocity::default(),
                    Collider::new(PIGEON_HALF_EXTENTS, 0).with_mask(0),
                    pigeon,
                    Gameplay,
                ))
                .id()
        })
        .collect()
}

/// Spawns `count` pigeons sharing `flock`, scattered around `centre`.
pub fn spawn_pigeon_flock(world: &mut World, flock: u32, centre: Vec3, count: usize) -> Vec<Entity> {
    let mut rng = world.remove_resource::<SimRng>().unwrap_or_default();
    let pigeons = place_flock(world, &mut rng, flock, centre, count);
    world.insert_resource(rng);
    pigeons
}

/// Street layout, all distances in metres. The rider starts at the origin
/// riding towards −Z along the road centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreetLayout {
    /// Length of street to populate.
    pub length: f32,
    /// Half the carriageway width.
    pub road_half_width: f32,
    /// Width of each pavement.
    pub pavement_width: f32,
    /// Distance between blocks of street furniture.
    pub block: f32,
}

impl Default for StreetLayout {
    fn default() -> Self {
        Self {
            length: 400.0,
            road_half_width: 4.0,
            pavement_width: 3.0,
            block: 12.0,
        }
    }
}

/// Fills a straight street with traffic, pedestrians, furniture, hazards
/// and pigeons. Placement is drawn from [`SimRng`], so a seed reproduces
/// the same street.
pub fn build_demo_street(world: &mut World, layout: &StreetLayout) {
    let walk_speed = world
        .get_resource::<PedestrianTuning>()
        .map_or(PedestrianTuning::default().walk_speed, |tuning| tuning.walk_speed);
    let mut rng = world.remove_resource::<SimRng>().unwrap_or_default();
    let kerb = layout.road_half_width;
    let pavement = kerb + layout.pavement_width * 0.5;
    let mut spawned = 0_usize;
    let mut flock = 0_u32;
    let mut z = -layout.block;

    while -z < layout.length {
        let side = if rng.0.gen_bool(0.5) { 1.0 } else { -1.0 };
        let furniture = match rng.0.gen_range(0..5) {
            0 => (ObstacleKind::StreetLight, Vec3::new(0.12, 2.5, 0.12)),
            1 => (ObstacleKind::RecycleBin, Vec3::new(0.3, 0.5, 0.3)),
            2 => (ObstacleKind::Bench, Vec3::new(0.9, 0.45, 0.3)),
            3 => (ObstacleKind::Tree, Vec3::new(0.35, 3.0, 0.35)),
            _ => (ObstacleKind::Building, Vec3::new(4.0, 6.0, 5.0)),
        };
        let furniture_x = if furniture.0 == ObstacleKind::Building {
            side * (kerb + layout.pavement_width + furniture.1.x)
        } else {
            side * (kerb + 0.4)
        };
        spawn_obstacle(world, furniture.0, Vec3::new(furniture_x, 0.0, z), furniture.1);
        spawned += 1;

        let hazard_z = z - layout.block * 0.5;
        match rng.0.gen_range(0..6) {
            0 => {
                let x = rng.0.gen_range(-kerb + 1.0..kerb - 1.0);
                spawn_obstacle(
                    world,
                    ObstacleKind::Puddle,
                    Vec3::new(x, 0.0, hazard_z),
                    Vec3::new(0.8, 0.02, 0.6),
                );
                spawned += 1;
            }
            1 => {
                let x = rng.0.gen_range(-kerb + 1.0..kerb - 1.0);
                spawn_obstacle(
                    world,
                    ObstacleKind::Manhole,
                    Vec3::new(x, 0.0, hazard_z),
                    Vec3::new(0.4, 0.02, 0.4),
                );
                spawned += 1;
            }
            2 => {
                let x = rng.0.gen_range(-kerb + 1.0..kerb - 1.0);
                spawn_obstacle(
                    world,
                    ObstacleKind::Pothole,
                    Vec3::new(x, 0.0, hazard_z),
                    Vec3::new(0.3, 0.02, 0.3),
                );
                spawned += 1;
            }
            _ => {}
        }

        let yaw = if rng.0.gen_bool(0.5) { 0.0 } else { PI };
        let timer = rng.0.gen_range(1.0..6.0);
        spawn_pedestrian(
            world,
            Vec3::new(-side * pavement, 0.0, z - 3.0),
            yaw,
            Pedestrian::walking(walk_speed, timer),
        );
        spawned += 1;

        if rng.0.gen_bool(0.25) {
            let start = Vec3::new(side * (kerb + 0.3), 0.0, z - 6.0);
            let end = Vec3::new(-side * (kerb + 0.3), 0.0, z - 6.0);
            spawn_pedestrian(
                world,
                Vec3::new(side * pavement, 0.0, z - 9.0),
                0.0,
                Pedestrian::crossing(walk_speed, Crossing { start, end }),
            );
            spawned += 1;
        }

        if rng.0.gen_bool(0.3) {
            let lane = side * kerb * 0.5;
            let direction = if side > 0.0 { 1.0 } else { -1.0 };
            let cruise = rng.0.gen_range(5.0..9.0);
            spawn_car(world, lane, z - 20.0, direction, cruise);
            spawned += 1;
        }

        if rng.0.gen_bool(0.2) {
            let centre = Vec3::new(rng.0.gen_range(-kerb..kerb), 0.0, z - 4.0);
            let count = rng.0.gen_range(3..7);
            spawned += place_flock(world, &mut rng, flock, centre, count).len();
            flock += 1;
        }

        z -= layout.block;
    }
    world.insert_resource(rng);
    info!("built a {:.0} m street with {spawned} entities", layout.length);
}
