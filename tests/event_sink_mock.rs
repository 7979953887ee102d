//! Interaction counts between the game loop and the event sink.

use glam::Vec3;
use mockall::mock;
use mockall::predicate::eq;
use monowheel::components::ObstacleKind;
use monowheel::events::{dispatch, GameEvent, GameEventSink};
use monowheel::physics::ColliderType;
use monowheel::session::{GameState, MemoryScoreStore};
use monowheel::spawn::spawn_obstacle;
use monowheel::vehicle::LeanInput;
use monowheel::{Game, GameConfig};
use test_utils::default_half_extents;

mock! {
    pub Sink {}
    impl GameEventSink for Sink {
        fn on_collision(&mut self, obstacle: ObstacleKind, causes_game_over: bool);
        fn on_near_miss(&mut self);
        fn on_ragdoll_collision(&mut self, collider: ColliderType);
        fn on_secondary_ragdoll_collision(&mut self, collider: ColliderType);
        fn on_ragdoll_ground_impact(&mut self, position: Vec3);
    }
}

#[test]
fn dispatch_routes_each_event_once() {
    let mut sink = MockSink::new();
    sink.expect_on_collision()
        .with(eq(ObstacleKind::Bench), eq(true))
        .times(1)
        .return_const(());
    sink.expect_on_near_miss().times(1).return_const(());
    sink.expect_on_ragdoll_collision()
        .with(eq(ColliderType::Tree))
        .times(1)
        .return_const(());
    sink.expect_on_secondary_ragdoll_collision()
        .with(eq(ColliderType::Ground))
        .times(1)
        .return_const(());
    sink.expect_on_ragdoll_ground_impact()
        .with(eq(Vec3::new(1.0, 0.0, -2.0)))
        .times(1)
        .return_const(());

    for event in [
        GameEvent::Collision {
            obstacle: ObstacleKind::Bench,
            causes_game_over: true,
        },
        GameEvent::NearMiss {
            obstacle: ObstacleKind::Car,
        },
        GameEvent::RagdollCollision {
            collider: ColliderType::Tree,
        },
        GameEvent::SecondaryRagdollCollision {
            collider: ColliderType::Ground,
        },
        GameEvent::RagdollGroundImpact {
            position: Vec3::new(1.0, 0.0, -2.0),
        },
    ] {
        dispatch(&mut sink, event);
    }
}

#[test]
fn a_fatal_crash_is_reported_exactly_once() {
    let mut sink = MockSink::new();
    sink.expect_on_collision()
        .with(eq(ObstacleKind::Barrier), eq(true))
        .times(1)
        .return_const(());
    sink.expect_on_near_miss().never();
    sink.expect_on_ragdoll_collision().return_const(());
    sink.expect_on_secondary_ragdoll_collision().never();
    sink.expect_on_ragdoll_ground_impact().return_const(());

    let mut game = Game::new(
        GameConfig::default(),
        0,
        Box::new(sink),
        Box::new(MemoryScoreStore::new(1)),
    )
    .expect("default config is valid")
    .with_world_generator(|world| {
        let kind = ObstacleKind::Barrier;
        spawn_obstacle(world, kind, Vec3::new(0.0, 0.0, -6.0), default_half_extents(kind));
    });
    game.finish_loading().expect("loading finishes");
    game.start_countdown().expect("countdown starts");
    for _ in 0..600 {
        if matches!(game.state(), GameState::GameOver(_)) {
            break;
        }
        game.update(1.0 / 30.0, LeanInput::default());
    }
    assert!(matches!(game.state(), GameState::GameOver(_)));
    // Dropping the game checks the call counts.
    drop(game);
}
