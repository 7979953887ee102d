//! Gameplay events and the sink they are delivered to.
//!
//! Systems never call the sink directly. They push [`GameEvent`]s into the
//! [`GameEventOutbox`] resource and the game loop drains it once per tick,
//! forwarding each event to whatever [`GameEventSink`] it was given (audio,
//! UI, telemetry, or nothing at all).

use bevy_ecs::prelude::Resource;
use glam::Vec3;
use log::{debug, info};

use crate::components::ObstacleKind;
use crate::physics::ColliderType;

/// Something the host may want to react to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// The rider touched an obstacle.
    Collision {
        /// What was hit.
        obstacle: ObstacleKind,
        /// Whether the hit ends the run.
        causes_game_over: bool,
    },
    /// The rider passed an obstacle closely without touching it.
    NearMiss {
        /// What was passed.
        obstacle: ObstacleKind,
    },
    /// The player's ragdoll hit a world collider hard enough to be heard.
    RagdollCollision {
        /// Class of the collider that was struck.
        collider: ColliderType,
    },
    /// A pedestrian ragdoll hit something hard enough to be heard.
    SecondaryRagdollCollision {
        /// Class of the collider that was struck.
        collider: ColliderType,
    },
    /// The player's head or torso struck the ground.
    RagdollGroundImpact {
        /// Contact point.
        position: Vec3,
    },
}

/// Events raised during the current tick, waiting to reach the sink.
#[derive(Resource, Debug, Default)]
pub struct GameEventOutbox {
    events: Vec<GameEvent>,
}

impl GameEventOutbox {
    /// Queues one event.
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Queues every event from `events`, in order.
    pub fn extend<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = GameEvent>,
    {
        self.events.extend(events);
    }

    /// Removes and yields every queued event, oldest first.
    pub fn drain(&mut self) -> std::vec::Drain<'_, GameEvent> {
        self.events.drain(..)
    }

    /// Drops every queued event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Events queued so far, oldest first.
    #[must_use]
    pub fn as_slice(&self) -> &[GameEvent] {
        &self.events
    }
}

/// Consumer of gameplay events. Calls are fire-and-forget.
pub trait GameEventSink: Send {
    /// The rider touched `obstacle`.
    fn on_collision(&mut self, obstacle: ObstacleKind, causes_game_over: bool);
    /// A near miss was scored.
    fn on_near_miss(&mut self);
    /// The player's ragdoll struck `collider`.
    fn on_ragdoll_collision(&mut self, collider: ColliderType);
    /// A pedestrian ragdoll struck `collider`.
    fn on_secondary_ragdoll_collision(&mut self, collider: ColliderType);
    /// The player's head or torso hit the ground at `position`.
    fn on_ragdoll_ground_impact(&mut self, position: Vec3);
}

/// Routes one event to the matching sink callback.
pub fn dispatch(sink: &mut dyn GameEventSink, event: GameEvent) {
    match event {
        GameEvent::Collision {
            obstacle,
            causes_game_over,
        } => sink.on_collision(obstacle, causes_game_over),
        GameEvent::NearMiss { .. } => sink.on_near_miss(),
        GameEvent::RagdollCollision { collider } => sink.on_ragdoll_collision(collider),
        GameEvent::SecondaryRagdollCollision { collider } => {
            sink.on_secondary_ragdoll_collision(collider);
        }
        GameEvent::RagdollGroundImpact { position } => sink.on_ragdoll_ground_impact(position),
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl GameEventSink for NullEventSink {
    fn on_collision(&mut self, _obstacle: ObstacleKind, _causes_game_over: bool) {}
    fn on_near_miss(&mut self) {}
    fn on_ragdoll_collision(&mut self, _collider: ColliderType) {}
    fn on_secondary_ragdoll_collision(&mut self, _collider: ColliderType) {}
    fn on_ragdoll_ground_impact(&mut self, _position: Vec3) {}
}

/// Writes every event to the log and keeps running totals.
#[derive(Debug, Default, Clone)]
pub struct LogEventSink {
    /// Obstacle collisions seen.
    pub collisions: u32,
    /// Near misses seen.
    pub near_misses: u32,
    /// Ragdoll impacts of any kind seen.
    pub impacts: u32,
}

impl GameEventSink for LogEventSink {
    fn on_collision(&mut self, obstacle: ObstacleKind, causes_game_over: bool) {
        self.collisions += 1;
        info!("collision with {obstacle:?} (game over: {causes_game_over})");
    }

    fn on_near_miss(&mut self) {
        self.near_misses += 1;
        info!("near miss #{}", self.near_misses);
    }

    fn on_ragdoll_collision(&mut self, collider: ColliderType) {
        self.impacts += 1;
        debug!("ragdoll hit {collider:?}");
    }

    fn on_secondary_ragdoll_collision(&mut self, collider: ColliderType) {
        self.impacts += 1;
        debug!("pedestrian ragdoll hit {collider:?}");
    }

    fn on_ragdoll_ground_impact(&mut self, position: Vec3) {
        self.impacts += 1;
        debug!("ragdoll ground impact at {position}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn outbox_drains_in_order() {
        let mut outbox = GameEventOutbox::default();
        outbox.push(GameEvent::NearMiss {
            obstacle: ObstacleKind::Car,
        });
        outbox.extend([GameEvent::RagdollCollision {
            collider: ColliderType::Tree,
        }]);
        assert_eq!(outbox.len(), 2);
        let drained: Vec<_> = outbox.drain().collect();
        assert!(matches!(drained[0], GameEvent::NearMiss { .. }));
        assert!(outbox.is_empty());
    }

    #[rstest]
    fn log_sink_counts_by_category() {
        let mut sink = LogEventSink::default();
        dispatch(&mut sink, GameEvent::NearMiss {
            obstacle: ObstacleKind::Pedestrian,
        });
        dispatch(&mut sink, GameEvent::Collision {
            obstacle: ObstacleKind::Car,
            causes_game_over: true,
        });
        dispatch(&mut sink, GameEvent::RagdollGroundImpact {
            position: Vec3::ZERO,
        });
        assert_eq!((sink.collisions, sink.near_misses, sink.impacts), (1, 1, 1));
    }
}
