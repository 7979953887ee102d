//! Behaviour tests for the rider ragdoll lifecycle using rust-rspec.
//!
//! Inactive → Active → Frozen → Inactive, with `stop` safe to repeat from
//! any phase.

use glam::Vec3;
use monowheel::config::{CollisionTuning, PhysicsTuning};
use monowheel::ragdoll::{BodyPart, FallPose, RagdollPhase, RagdollSystem};
use std::fmt;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
struct RagdollWorld {
    system: Arc<Mutex<RagdollSystem>>,
}

impl fmt::Debug for RagdollWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RagdollWorld").finish_non_exhaustive()
    }
}

impl Default for RagdollWorld {
    fn default() -> Self {
        Self {
            system: Arc::new(Mutex::new(fresh())),
        }
    }
}

fn fresh() -> RagdollSystem {
    RagdollSystem::new(PhysicsTuning::default(), CollisionTuning::default())
}

impl RagdollWorld {
    fn reset(&mut self) {
        *self.system.lock().expect("ragdoll lock") = fresh();
    }

    fn start_fall(&mut self) {
        let pose = FallPose {
            position: Vec3::new(0.0, 0.0, -3.0),
            yaw: 0.4,
            velocity: Vec3::new(0.0, 0.0, -7.0),
            side_lean: 0.2,
            forward_lean: 0.9,
        };
        self.system
            .lock()
            .expect("ragdoll lock")
            .start_fall(&pose)
            .expect("fall starts");
    }

    fn freeze(&mut self) {
        assert!(self.system.lock().expect("ragdoll lock").freeze());
    }

    fn stop(&mut self) {
        self.system.lock().expect("ragdoll lock").stop(true);
    }

    fn step(&mut self, frames: usize) {
        let mut system = self.system.lock().expect("ragdoll lock");
        for _ in 0..frames {
            system.step(1.0 / 60.0);
        }
    }

    fn assert_phase(&self, phase: RagdollPhase) {
        assert_eq!(self.system.lock().expect("ragdoll lock").phase(), phase);
    }

    fn assert_exposed(&self, exposed: bool) {
        let system = self.system.lock().expect("ragdoll lock");
        for part in BodyPart::ALL {
            assert_eq!(system.part_pose(part).is_some(), exposed, "{part:?}");
        }
        assert_eq!(system.euc_pose().is_some(), exposed);
    }

    fn assert_torso_held(&self) {
        let mut system = self.system.lock().expect("ragdoll lock");
        let before = system.part_pose(BodyPart::Torso).expect("torso visible");
        system.step(0.5);
        assert_eq!(system.part_pose(BodyPart::Torso), Some(before));
    }
}

#[test]
fn ragdoll_lifecycle() {
    rspec::run(&rspec::given(
        "a ragdoll system that has never started a fall",
        RagdollWorld::default(),
        |ctx| {
            ctx.before_each(|world| world.reset());

            ctx.when("stop is called twice", |ctx| {
                ctx.before_each(|world| {
                    world.stop();
                    world.stop();
                });
                ctx.then("nothing is active and no transform is exposed", |world| {
                    world.assert_phase(RagdollPhase::Inactive);
                    world.assert_exposed(false);
                });
            });

            ctx.when("a fall starts", |ctx| {
                ctx.before_each(|world| world.start_fall());
                ctx.then("the rider and wheel are exposed", |world| {
                    world.assert_phase(RagdollPhase::Active);
                    world.assert_exposed(true);
                });

                ctx.when("the ragdoll is frozen after tumbling", |ctx| {
                    ctx.before_each(|world| {
                        world.step(30);
                        world.freeze();
                    });
                    ctx.then("the pose stays put and visible", |world| {
                        world.assert_phase(RagdollPhase::Frozen);
                        world.assert_torso_held();
                    });
                });

                ctx.when("it is stopped twice", |ctx| {
                    ctx.before_each(|world| {
                        world.stop();
                        world.stop();
                    });
                    ctx.then("everything is torn down", |world| {
                        world.assert_phase(RagdollPhase::Inactive);
                        world.assert_exposed(false);
                    });
                });
            });
        },
    ));
}
