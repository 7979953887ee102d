//! Headless app construction and fixed-step driving.
use bevy_app::App;
use bevy_ecs::prelude::*;
use glam::Vec3;
use monowheel::components::ObstacleKind;
use monowheel::config::GameConfig;
use monowheel::spawn::{spawn_obstacle, spawn_pigeon_flock, spawn_player};
use monowheel::systems::{FrameTime, SimulationPlugin};
use monowheel::vehicle::LeanInput;

/// App with the simulation plugin, default tuning and seed 0.
pub fn headless_app() -> App {
    headless_app_with(GameConfig::default(), 0)
}

pub fn headless_app_with(config: GameConfig, seed: u64) -> App {
    let mut app = App::new();
    app.add_plugins(SimulationPlugin::new(config, seed));
    app
}

/// Runs one update with a frame time of `dt` seconds.
pub fn tick(app: &mut App, dt: f32) {
    app.world_mut().insert_resource(FrameTime(dt));
    app.update();
}

pub fn tick_n(app: &mut App, dt: f32, frames: usize) {
    for _ in 0..frames {
        tick(app, dt);
    }
}

/// Sets the calibrated lean the vehicle system reads next tick.
pub fn lean(app: &mut App, forward: f32, side: f32) {
    app.world_mut()
        .insert_resource(LeanInput::new(forward, side));
}

pub fn spawn_rider(app: &mut App, position: Vec3) -> Entity {
    spawn_player(app.world_mut(), position, 0.0)
}

/// Typical half extents for each obstacle kind.
pub fn default_half_extents(kind: ObstacleKind) -> Vec3 {
    match kind {
        ObstacleKind::Puddle => Vec3::new(0.8, 0.02, 0.6),
        ObstacleKind::Manhole => Vec3::new(0.4, 0.02, 0.4),
        ObstacleKind::Pothole => Vec3::new(0.3, 0.02, 0.3),
        ObstacleKind::Car => Vec3::new(0.9, 0.75, 2.1),
        ObstacleKind::Pedestrian => Vec3::new(0.25, 0.9, 0.2),
        ObstacleKind::StreetLight => Vec3::new(0.12, 2.5, 0.12),
        ObstacleKind::RecycleBin => Vec3::new(0.3, 0.5, 0.3),
        ObstacleKind::Bench => Vec3::new(0.9, 0.45, 0.3),
        ObstacleKind::Building => Vec3::new(4.0, 6.0, 5.0),
        ObstacleKind::Tree => Vec3::new(0.35, 3.0, 0.35),
        ObstacleKind::Barrier => Vec3::new(1.0, 0.5, 0.2),
    }
}

/// Spawns a static obstacle of `kind` with its default size.
pub fn spawn_kind(app: &mut App, kind: ObstacleKind, position: Vec3) -> Entity {
    spawn_obstacle(app.world_mut(), kind, position, default_half_extents(kind))
}

pub fn spawn_flock(app: &mut App, flock: u32, centre: Vec3, count: usize) -> Vec<Entity> {
    spawn_pigeon_flock(app.world_mut(), flock, centre, count)
}
