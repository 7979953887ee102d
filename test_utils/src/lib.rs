//! Utility helpers for tests.
//!
//! A headless [`App`](bevy_app::App) carrying the simulation plugin, fixed-dt
//! ticking, spawners with sensible default sizes and an event sink that
//! records what it is told.
pub mod app;
pub mod events;
pub mod thread_safe;

pub use app::{
    default_half_extents, headless_app, headless_app_with, lean, spawn_flock, spawn_kind,
    spawn_rider, tick, tick_n,
};
pub use events::{RecordingSink, SinkCall};
pub use thread_safe::{
    lock, shared_app, shared_game, SharedApp, SharedGame, ThreadSafeApp, ThreadSafeGame,
};
