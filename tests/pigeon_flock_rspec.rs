//! Behaviour tests for pigeon flock startles using rust-rspec.
//!
//! One pigeon near the rider takes fright; its flockmates follow on the
//! next tick and an unrelated flock stays put.

use bevy_ecs::prelude::*;
use glam::Vec3;
use monowheel::components::{Pigeon, PigeonState};
use std::fmt;
use std::sync::{Arc, Mutex};
use test_utils::{headless_app, lock, shared_app, spawn_flock, spawn_rider, tick, SharedApp};

#[derive(Clone)]
struct FlockWorld {
    app: SharedApp,
    flock: Arc<Mutex<Vec<Entity>>>,
    bystanders: Arc<Mutex<Vec<Entity>>>,
}

impl fmt::Debug for FlockWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlockWorld")
            .field("flock", &self.flock)
            .finish_non_exhaustive()
    }
}

impl Default for FlockWorld {
    fn default() -> Self {
        Self {
            app: shared_app(headless_app()),
            flock: Arc::new(Mutex::new(Vec::new())),
            bystanders: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FlockWorld {
    fn setup(&mut self) {
        let mut app = lock(&self.app);
        app.0 = headless_app();
        spawn_rider(&mut app, Vec3::ZERO);
        // Pigeon #0 sits beside the rider, its four flockmates well away.
        let mut flock = spawn_flock(&mut app, 1, Vec3::new(0.0, 0.0, -0.5), 1);
        for i in 1..5 {
            let away = Vec3::new(12.0 + i as f32 * 3.0, 0.0, 0.0);
            flock.extend(spawn_flock(&mut app, 1, away, 1));
        }
        *lock(&self.flock) = flock;
        *lock(&self.bystanders) =
            spawn_flock(&mut app, 2, Vec3::new(-15.0, 0.0, 0.0), 3);
    }

    fn tick(&mut self) {
        let mut app = lock(&self.app);
        tick(&mut app, 1.0 / 60.0);
    }

    fn alarmed(&self, pigeons: &[Entity]) -> usize {
        let app = lock(&self.app);
        pigeons
            .iter()
            .filter(|pigeon| {
                app.world()
                    .get::<Pigeon>(**pigeon)
                    .is_some_and(|pigeon| pigeon.state.is_alarmed())
            })
            .count()
    }

    fn assert_flock_alarmed(&self, expected: usize) {
        let flock = self.flock.lock().expect("flock lock").clone();
        assert_eq!(self.alarmed(&flock), expected);
    }

    fn assert_first_startled(&self) {
        let first = self.flock.lock().expect("flock lock")[0];
        let app = lock(&self.app);
        let pigeon = app.world().get::<Pigeon>(first).expect("pigeon");
        assert_eq!(pigeon.state, PigeonState::Startled);
    }

    fn assert_bystanders_calm(&self) {
        let bystanders = self.bystanders.lock().expect("bystander lock").clone();
        assert_eq!(self.alarmed(&bystanders), 0);
    }
}

#[test]
fn startle_spreads_through_a_flock() {
    rspec::run(&rspec::given(
        "a flock of five with one pigeon beside the rider",
        FlockWorld::default(),
        |ctx| {
            ctx.before_each(|world| world.setup());

            ctx.when("the simulation ticks once", |ctx| {
                ctx.before_each(|world| world.tick());
                ctx.then("only the nearby pigeon has taken fright", |world| {
                    world.assert_first_startled();
                    world.assert_flock_alarmed(1);
                });
            });

            ctx.when("the simulation ticks twice", |ctx| {
                ctx.before_each(|world| {
                    world.tick();
                    world.tick();
                });
                ctx.then("the whole flock is startled or flying", |world| {
                    world.assert_flock_alarmed(5);
                });
                ctx.then("the other flock carries on", |world| {
                    world.assert_bystanders_calm();
                });
            });
        },
    ));
}
