//! Per-run statistics and scoring.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::config::SessionTuning;
use crate::constants::FULL_BATTERY;

/// Statistics for the run in progress. Reset when a run starts.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct GameSession {
    /// Metres ridden.
    pub distance: f32,
    /// Latest speed, m/s.
    pub speed: f32,
    /// Top speed reached, m/s.
    pub max_speed: f32,
    /// Near misses scored.
    pub near_misses: u32,
    /// Obstacles passed.
    pub obstacles_passed: u32,
    /// Percent left.
    pub battery: f32,
    /// Seconds ridden.
    pub elapsed: f32,
}

impl Default for GameSession {
    fn default() -> Self {
        Self {
            distance: 0.0,
            speed: 0.0,
            max_speed: 0.0,
            near_misses: 0,
            obstacles_passed: 0,
            battery: FULL_BATTERY,
            elapsed: 0.0,
        }
    }
}

impl GameSession {
    /// Records `dt` seconds ridden at `speed`, draining `drain` percent.
    pub fn advance(&mut self, speed: f32, dt: f32, drain: f32) {
        if !(speed.is_finite() && dt.is_finite() && drain.is_finite()) {
            return;
        }
        self.speed = speed;
        self.max_speed = self.max_speed.max(speed);
        self.distance += speed * dt;
        self.elapsed += dt;
        self.battery = (self.battery - drain).max(0.0);
    }

    /// Whether the battery has run flat.
    #[must_use]
    pub const fn battery_empty(&self) -> bool {
        self.battery <= 0.0
    }

    /// Points for distance, near misses and obstacles passed.
    ///
    /// ```
    /// use monowheel::config::SessionTuning;
    /// use monowheel::session::GameSession;
    /// let session = GameSession {
    ///     distance: 12.5,
    ///     near_misses: 2,
    ///     obstacles_passed: 4,
    ///     ..GameSession::default()
    /// };
    /// assert_eq!(session.score(&SessionTuning::default()), 125 + 100 + 20);
    /// ```
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "Distance points are clamped to the u32 range before casting."
    )]
    pub fn score(&self, tuning: &SessionTuning) -> u32 {
        let metres = (self.distance * tuning.score_per_metre)
            .floor()
            .clamp(0.0, u32::MAX as f32) as u32;
        metres
            .saturating_add(self.near_misses.saturating_mul(tuning.score_per_near_miss))
            .saturating_add(
                self.obstacles_passed
                    .saturating_mul(tuning.score_per_pass),
            )
    }

    /// Freezes the run into its high-score record.
    #[must_use]
    pub fn summary(&self, tuning: &SessionTuning) -> SessionSummary {
        SessionSummary {
            score: self.score(tuning),
            distance: self.distance,
            near_misses: self.near_misses,
            obstacles_passed: self.obstacles_passed,
            max_speed: self.max_speed,
            elapsed: self.elapsed,
        }
    }
}

/// What a finished run is remembered by.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Final score.
    pub score: u32,
    /// Metres ridden.
    pub distance: f32,
    /// Near misses scored.
    pub near_misses: u32,
    /// Obstacles passed.
    pub obstacles_passed: u32,
    /// Top speed reached, m/s.
    pub max_speed: f32,
    /// Seconds ridden.
    pub elapsed: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    fn advance_accumulates_and_drains() {
        let mut session = GameSession::default();
        session.advance(6.0, 0.5, 10.0);
        session.advance(4.0, 0.5, 10.0);
        assert_relative_eq!(session.distance, 5.0);
        assert_relative_eq!(session.max_speed, 6.0);
        assert_relative_eq!(session.speed, 4.0);
        assert_relative_eq!(session.elapsed, 1.0);
        assert_relative_eq!(session.battery, 80.0);
    }

    #[rstest]
    fn battery_bottoms_out() {
        let mut session = GameSession::default();
        session.advance(1.0, 1.0, 500.0);
        assert!(session.battery_empty());
        assert_relative_eq!(session.battery, 0.0);
    }

    #[rstest]
    fn non_finite_input_is_ignored() {
        let mut session = GameSession::default();
        session.advance(f32::NAN, 1.0, 0.0);
        assert_eq!(session, GameSession::default());
    }
}
