//! Game modes, per-run statistics and score persistence.

mod persistence;
mod score;
mod state;

pub use persistence::{JsonScoreStore, MemoryScoreStore, PersistenceError, ScoreStore};
pub use score::{GameSession, SessionSummary};
pub use state::{GameState, TransitionError};
