//! A flat battery stops the motor like an overload does.

use glam::Vec3;
use monowheel::components::Player;
use monowheel::session::GameSession;
use monowheel::systems::FallRequest;
use monowheel::vehicle::FallCause;
use rstest::rstest;
use test_utils::{headless_app, spawn_rider, tick};

#[rstest]
fn flat_battery_cuts_the_motor() {
    let mut app = headless_app();
    let rider = spawn_rider(&mut app, Vec3::ZERO);
    app.world_mut().resource_mut::<GameSession>().battery = 1.0e-6;
    tick(&mut app, 1.0 / 60.0);
    assert_eq!(
        app.world().resource::<FallRequest>().peek(),
        Some(FallCause::MotorCutout)
    );
    assert!(!app.world().get::<Player>(rider).expect("rider").alive);
}

#[rstest]
fn charged_battery_keeps_riding() {
    let mut app = headless_app();
    spawn_rider(&mut app, Vec3::ZERO);
    tick(&mut app, 1.0 / 60.0);
    assert_eq!(app.world().resource::<FallRequest>().peek(), None);
}
