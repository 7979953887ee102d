//! Generated street layout and clean-up behind the rider.

use bevy_app::App;
use bevy_ecs::prelude::*;
use glam::Vec3;
use monowheel::components::{Obstacle, ObstacleKind, Pigeon, Transform};
use monowheel::config::GameConfig;
use monowheel::spawn::{build_demo_street, StreetLayout};
use rstest::rstest;
use test_utils::{headless_app, headless_app_with, spawn_kind, spawn_rider, tick};

fn street(seed: u64) -> App {
    let mut app = headless_app_with(GameConfig::default(), seed);
    build_demo_street(app.world_mut(), &StreetLayout::default());
    app
}

fn obstacle_layout(app: &mut App) -> Vec<(ObstacleKind, [i32; 3])> {
    let world = app.world_mut();
    let mut layout: Vec<_> = world
        .query::<(&Obstacle, &Transform)>()
        .iter(world)
        .map(|(obstacle, transform)| {
            let p = (transform.position * 100.0).round();
            (obstacle.kind, [p.x as i32, p.y as i32, p.z as i32])
        })
        .collect();
    layout.sort_by_key(|(_, position)| *position);
    layout
}

#[rstest]
fn same_seed_builds_the_same_street() {
    let first = obstacle_layout(&mut street(7));
    let second = obstacle_layout(&mut street(7));
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[rstest]
fn street_has_pigeons() {
    let mut app = street(7);
    let world = app.world_mut();
    assert!(world.query::<&Pigeon>().iter(world).count() > 0);
}

#[rstest]
fn content_far_behind_the_rider_is_culled() {
    let mut app = headless_app();
    spawn_rider(&mut app, Vec3::ZERO);
    let behind = spawn_kind(&mut app, ObstacleKind::Bench, Vec3::new(4.5, 0.0, 45.0));
    let ahead = spawn_kind(&mut app, ObstacleKind::Bench, Vec3::new(4.5, 0.0, -45.0));
    tick(&mut app, 1.0 / 60.0);
    assert!(app.world().get_entity(behind).is_err());
    assert!(app.world().get_entity(ahead).is_ok());
}
