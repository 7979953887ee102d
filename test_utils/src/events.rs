//! An event sink that keeps what it receives.
use std::sync::{Arc, Mutex, PoisonError};

use glam::Vec3;
use monowheel::components::ObstacleKind;
use monowheel::events::GameEventSink;
use monowheel::physics::ColliderType;

/// One call made on a [`RecordingSink`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SinkCall {
    Collision {
        obstacle: ObstacleKind,
        causes_game_over: bool,
    },
    NearMiss,
    RagdollCollision(ColliderType),
    SecondaryRagdollCollision(ColliderType),
    RagdollGroundImpact(Vec3),
}

/// Records every call. Clones share one log, so a test can keep a handle
/// after boxing the sink into a game.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    log: Arc<Mutex<Vec<SinkCall>>>,
}

impl RecordingSink {
    /// Calls received so far, oldest first.
    pub fn calls(&self) -> Vec<SinkCall> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, matches: impl Fn(&SinkCall) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    fn record(&self, call: SinkCall) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl GameEventSink for RecordingSink {
    fn on_collision(&mut self, obstacle: ObstacleKind, causes_game_over: bool) {
        self.record(SinkCall::Collision {
            obstacle,
            causes_game_over,
        });
    }

    fn on_near_miss(&mut self) {
        self.record(SinkCall::NearMiss);
    }

    fn on_ragdoll_collision(&mut self, collider: ColliderType) {
        self.record(SinkCall::RagdollCollision(collider));
    }

    fn on_secondary_ragdoll_collision(&mut self, collider: ColliderType) {
        self.record(SinkCall::SecondaryRagdollCollision(collider));
    }

    fn on_ragdoll_ground_impact(&mut self, position: Vec3) {
        self.record(SinkCall::RagdollGroundImpact(position));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_log() {
        let handle = RecordingSink::default();
        let mut sink: Box<dyn GameEventSink> = Box::new(handle.clone());
        sink.on_collision(ObstacleKind::Car, true);
        sink.on_near_miss();
        assert_eq!(
            handle.calls(),
            vec![
                SinkCall::Collision {
                    obstacle: ObstacleKind::Car,
                    causes_game_over: true,
                },
                SinkCall::NearMiss,
            ]
        );
        assert_eq!(handle.count(|call| *call == SinkCall::NearMiss), 1);
    }
}
