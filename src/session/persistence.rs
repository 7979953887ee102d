//! High-score storage port.
//!
//! Recording a run only stages it; nothing touches the backing store until
//! [`ScoreStore::flush`], so the frame that ends a run never waits on I/O
//! unless the caller chooses to flush right away.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use super::score::SessionSummary;

/// Failure to load or save high scores.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The score file could not be read or written.
    #[error("failed to access score file {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The score file is not a valid score table.
    #[error("malformed score data: {0}")]
    Format(#[from] serde_json::Error),
}

/// Where finished runs are kept.
pub trait ScoreStore: Send {
    /// Stages a finished run.
    fn record_session(&mut self, summary: SessionSummary);

    /// Commits staged runs.
    ///
    /// # Errors
    /// Returns [`PersistenceError`] when the backing store cannot be written;
    /// staged runs are kept for the next attempt.
    fn flush(&mut self) -> Result<(), PersistenceError>;

    /// Best committed run.
    fn best(&self) -> Option<SessionSummary>;

    /// Committed runs, best first.
    fn high_scores(&self) -> Vec<SessionSummary>;
}

/// Merges `staged` into `table`, best score first, keeping `capacity`.
fn merge(table: &mut Vec<SessionSummary>, staged: &[SessionSummary], capacity: usize) {
    table.extend_from_slice(staged);
    table.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.distance.total_cmp(&a.distance))
    });
    table.truncate(capacity);
}

/// Keeps scores for the lifetime of the process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryScoreStore {
    capacity: usize,
    staged: Vec<SessionSummary>,
    committed: Vec<SessionSummary>,
}

impl MemoryScoreStore {
    /// Empty table keeping at most `capacity` scores.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            staged: Vec::new(),
            committed: Vec::new(),
        }
    }

    /// Runs staged but not yet committed.
    #[must_use]
    pub fn staged(&self) -> &[SessionSummary] {
        &self.staged
    }
}

impl ScoreStore for MemoryScoreStore {
    fn record_session(&mut self, summary: SessionSummary) {
        self.staged.push(summary);
    }

    fn flush(&mut self) -> Result<(), PersistenceError> {
        merge(&mut self.committed, &self.staged, self.capacity);
        self.staged.clear();
        Ok(())
    }

    fn best(&self) -> Option<SessionSummary> {
        self.committed.first().copied()
    }

    fn high_scores(&self) -> Vec<SessionSummary> {
        self.committed.clone()
    }
}

/// Keeps the top scores in a JSON file.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonScoreStore {
    path: PathBuf,
    capacity: usize,
    staged: Vec<SessionSummary>,
    committed: Vec<SessionSummary>,
}

impl JsonScoreStore {
    /// Opens `path`, reading any scores already there. A missing file is
    /// an empty table.
    ///
    /// # Errors
    /// Returns [`PersistenceError`] if the file exists but cannot be read or
    /// parsed.
    pub fn open(path: impl Into<PathBuf>, capacity: usize) -> Result<Self, PersistenceError> {
        let file = path.into();
        let mut committed = match fs::read_to_string(&file) {
            Ok(text) => serde_json::from_str::<Vec<SessionSummary>>(&text)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(PersistenceError::Io { path: file, source }),
        };
        merge(&mut committed, &[], capacity);
        debug!("loaded {} scores from {}", committed.len(), file.display());
        Ok(Self {
            path: file,
            capacity,
            staged: Vec::new(),
            committed,
        })
    }

    /// File the table is saved to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreStore for JsonScoreStore {
    fn record_session(&mut self, summary: SessionSummary) {
        self.staged.push(summary);
    }

    fn flush(&mut self) -> Result<(), PersistenceError> {
        if self.staged.is_empty() {
            return Ok(());
        }
        let mut table = self.committed.clone();
        merge(&mut table, &self.staged, self.capacity);
        let text = serde_json::to_string_pretty(&table)?;
        fs::write(&self.path, text).map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })?;
        info!(
            "saved {} scores to {}",
            table.len(),
            self.path.display()
        );
        self.committed = table;
        self.staged.clear();
        Ok(())
    }

    fn best(&self) -> Option<SessionSummary> {
        self.committed.first().copied()
    }

    fn high_scores(&self) -> Vec<SessionSummary> {
        self.committed.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn run(score: u32) -> SessionSummary {
        SessionSummary {
            score,
            distance: score as f32 / 10.0,
            near_misses: 0,
            obstacles_passed: 0,
            max_speed: 8.0,
            elapsed: 30.0,
        }
    }

    #[rstest]
    fn staged_runs_are_invisible_until_flushed() {
        let mut store = MemoryScoreStore::new(3);
        store.record_session(run(40));
        assert!(store.best().is_none());
        assert_eq!(store.staged().len(), 1);
        store.flush().expect("memory flush");
        assert_eq!(store.best(), Some(run(40)));
        assert!(store.staged().is_empty());
    }

    #[rstest]
    fn table_keeps_the_best() {
        let mut store = MemoryScoreStore::new(2);
        for score in [10, 50, 30] {
            store.record_session(run(score));
        }
        store.flush().expect("memory flush");
        assert_eq!(store.high_scores(), vec![run(50), run(30)]);
    }
}
