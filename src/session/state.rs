//! The top-level mode machine.
//!
//! ```text
//! Loading → Menu ⇄ Calibrating
//! Menu → Countdown(n) → Playing ⇄ Paused
//! Playing → Falling → GameOver
//! ```
//!
//! `restart` leads back to `Countdown` from any in-run state and
//! `return_to_menu` to `Menu` from anywhere but `Loading`. Every other
//! request is rejected with a [`TransitionError`] and leaves the state
//! untouched.

use log::{info, warn};
use thiserror::Error;

use super::score::{GameSession, SessionSummary};
use crate::vehicle::FallCause;

/// An operation that is not valid in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {operation} while {state}")]
pub struct TransitionError {
    /// Mode the game was in.
    pub state: &'static str,
    /// What was attempted.
    pub operation: &'static str,
}

/// Game mode and the run data it carries.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum GameState {
    /// Assets and world not ready yet.
    #[default]
    Loading,
    /// Waiting for the player to start.
    Menu,
    /// Recording the rider's neutral lean.
    Calibrating,
    /// Counting down to the start of a run.
    Countdown {
        /// Whole seconds left.
        remaining: u8,
        /// Time into the current second.
        elapsed: f32,
    },
    /// Riding.
    Playing(GameSession),
    /// Riding, suspended.
    Paused(GameSession),
    /// The rider fell; the ragdoll plays out before game over.
    Falling {
        /// Run statistics frozen at the fall.
        session: GameSession,
        /// Why the rider fell.
        cause: FallCause,
        /// Seconds since the fall.
        elapsed: f32,
    },
    /// Run finished.
    GameOver(SessionSummary),
}

impl GameState {
    /// Human-readable mode, as used in [`TransitionError`].
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Menu => "in the menu",
            Self::Calibrating => "calibrating",
            Self::Countdown { .. } => "counting down",
            Self::Playing(_) => "playing",
            Self::Paused(_) => "paused",
            Self::Falling { .. } => "falling",
            Self::GameOver(_) => "game over",
        }
    }

    /// The run in progress, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&GameSession> {
        match self {
            Self::Playing(session) | Self::Paused(session) | Self::Falling { session, .. } => {
                Some(session)
            }
            _ => None,
        }
    }

    /// Whether the world is being stepped.
    #[must_use]
    pub const fn is_simulating(&self) -> bool {
        matches!(self, Self::Playing(_) | Self::Falling { .. })
    }

    /// Whether a run has been started and not yet abandoned.
    #[must_use]
    pub const fn in_run(&self) -> bool {
        matches!(
            self,
            Self::Countdown { .. }
                | Self::Playing(_)
                | Self::Paused(_)
                | Self::Falling { .. }
                | Self::GameOver(_)
        )
    }

    fn enter(&mut self, next: Self) {
        info!("state: {} -> {}", self.name(), next.name());
        *self = next;
    }

    fn reject(&self, operation: &'static str) -> TransitionError {
        let err = TransitionError {
            state: self.name(),
            operation,
        };
        warn!("rejected transition: {err}");
        err
    }

    /// `Loading → Menu`.
    ///
    /// # Errors
    /// Rejected outside `Loading`.
    pub fn finish_loading(&mut self) -> Result<(), TransitionError> {
        match self {
            Self::Loading => {
                self.enter(Self::Menu);
                Ok(())
            }
            _ => Err(self.reject("finish loading")),
        }
    }

    /// `Menu → Calibrating`.
    ///
    /// # Errors
    /// Rejected outside `Menu`.
    pub fn begin_calibration(&mut self) -> Result<(), TransitionError> {
        match self {
            Self::Menu => {
                self.enter(Self::Calibrating);
                Ok(())
            }
            _ => Err(self.reject("calibrate")),
        }
    }

    /// `Calibrating → Menu`.
    ///
    /// # Errors
    /// Rejected outside `Calibrating`.
    pub fn finish_calibration(&mut self) -> Result<(), TransitionError> {
        match self {
            Self::Calibrating => {
                self.enter(Self::Menu);
                Ok(())
            }
            _ => Err(self.reject("finish calibration")),
        }
    }

    /// `Menu → Countdown(from)`.
    ///
    /// # Errors
    /// Rejected outside `Menu`.
    pub fn start_countdown(&mut self, from: u8) -> Result<(), TransitionError> {
        match self {
            Self::Menu => {
                self.enter(Self::Countdown {
                    remaining: from,
                    elapsed: 0.0,
                });
                Ok(())
            }
            _ => Err(self.reject("start the countdown")),
        }
    }

    /// Advances the countdown by `dt`, entering `Playing` with a fresh
    /// session once it reaches zero. Returns `true` on that transition.
    pub fn tick_countdown(&mut self, dt: f32) -> bool {
        let Self::Countdown { remaining, elapsed } = self else {
            return false;
        };
        *elapsed += dt.max(0.0);
        while *elapsed >= 1.0 && *remaining > 0 {
            *elapsed -= 1.0;
            *remaining -= 1;
            if *remaining > 0 {
                info!("{remaining}...");
            }
        }
        if *remaining == 0 {
            self.enter(Self::Playing(GameSession::default()));
            return true;
        }
        false
    }

    /// `Playing → Paused`.
    ///
    /// # Errors
    /// Rejected outside `Playing`.
    pub fn pause(&mut self) -> Result<(), TransitionError> {
        match *self {
            Self::Playing(session) => {
                self.enter(Self::Paused(session));
                Ok(())
            }
            _ => Err(self.reject("pause")),
        }
    }

    /// `Paused → Playing`.
    ///
    /// # Errors
    /// Rejected outside `Paused`.
    pub fn resume(&mut self) -> Result<(), TransitionError> {
        match *self {
            Self::Paused(session) => {
                self.enter(Self::Playing(session));
                Ok(())
            }
            _ => Err(self.reject("resume")),
        }
    }

    /// Replaces the snapshot of the run in progress.
    pub fn refresh_session(&mut self, latest: GameSession) {
        match self {
            Self::Playing(session) | Self::Paused(session) | Self::Falling { session, .. } => {
                *session = latest;
            }
            _ => {}
        }
    }

    /// `Playing → Falling`.
    ///
    /// # Errors
    /// Rejected outside `Playing`.
    pub fn fall(&mut self, cause: FallCause) -> Result<(), TransitionError> {
        match *self {
            Self::Playing(session) => {
                self.enter(Self::Falling {
                    session,
                    cause,
                    elapsed: 0.0,
                });
                Ok(())
            }
            _ => Err(self.reject("fall")),
        }
    }

    /// Advances the fall timer. Returns the finished session once
    /// `duration` has passed; the caller then ends the run.
    pub fn tick_fall(&mut self, dt: f32, duration: f32) -> Option<GameSession> {
        let Self::Falling {
            session, elapsed, ..
        } = self
        else {
            return None;
        };
        *elapsed += dt.max(0.0);
        (*elapsed >= duration).then_some(*session)
    }

    /// `Falling → GameOver`.
    ///
    /// # Errors
    /// Rejected outside `Falling`.
    pub fn end_run(&mut self, summary: SessionSummary) -> Result<(), TransitionError> {
        match self {
            Self::Falling { .. } => {
                self.enter(Self::GameOver(summary));
                Ok(())
            }
            _ => Err(self.reject("end the run")),
        }
    }

    /// Any in-run state → `Countdown(from)`.
    ///
    /// # Errors
    /// Rejected when no run has been started.
    pub fn restart(&mut self, from: u8) -> Result<(), TransitionError> {
        if self.in_run() {
            self.enter(Self::Countdown {
                remaining: from,
                elapsed: 0.0,
            });
            Ok(())
        } else {
            Err(self.reject("restart"))
        }
    }

    /// Anything but `Loading` → `Menu`.
    ///
    /// # Errors
    /// Rejected while loading.
    pub fn return_to_menu(&mut self) -> Result<(), TransitionError> {
        match self {
            Self::Loading => Err(self.reject("return to the menu")),
            _ => {
                self.enter(Self::Menu);
                Ok(())
            }
        }
    }
}
