//! JSON score table on disk.

use std::fs;

use monowheel::session::{JsonScoreStore, PersistenceError, ScoreStore, SessionSummary};
use rstest::{fixture, rstest};
use tempfile::TempDir;

#[fixture]
fn dir() -> TempDir {
    tempfile::tempdir().expect("temp dir")
}

fn run(score: u32, distance: f32) -> SessionSummary {
    SessionSummary {
        score,
        distance,
        near_misses: score / 50,
        obstacles_passed: 3,
        max_speed: 9.5,
        elapsed: 42.0,
    }
}

#[rstest]
fn missing_file_opens_empty(dir: TempDir) {
    let store = JsonScoreStore::open(dir.path().join("scores.json"), 10).expect("open");
    assert!(store.best().is_none());
    assert!(store.high_scores().is_empty());
    assert!(!store.path().exists());
}

#[rstest]
fn flushed_scores_survive_a_reopen(dir: TempDir) {
    let path = dir.path().join("scores.json");
    let mut store = JsonScoreStore::open(&path, 3).expect("open");
    for (score, distance) in [(120, 12.0), (480, 40.0), (300, 25.0), (480, 44.0)] {
        store.record_session(run(score, distance));
    }
    store.flush().expect("flush");

    let reopened = JsonScoreStore::open(&path, 3).expect("reopen");
    assert_eq!(
        reopened.high_scores(),
        vec![run(480, 44.0), run(480, 40.0), run(300, 25.0)]
    );
    assert_eq!(reopened.best(), Some(run(480, 44.0)));
}

#[rstest]
fn recording_alone_writes_nothing(dir: TempDir) {
    let path = dir.path().join("scores.json");
    let mut store = JsonScoreStore::open(&path, 10).expect("open");
    store.record_session(run(50, 5.0));
    assert!(!path.exists());
    assert!(store.best().is_none());
}

#[rstest]
fn malformed_file_is_a_format_error(dir: TempDir) {
    let path = dir.path().join("scores.json");
    fs::write(&path, "[{ \"score\": ").expect("write junk");
    assert!(matches!(
        JsonScoreStore::open(&path, 10),
        Err(PersistenceError::Format(_))
    ));
}

#[rstest]
fn unwritable_path_keeps_the_run_staged(dir: TempDir) {
    let path = dir.path().join("missing").join("scores.json");
    let mut store = JsonScoreStore::open(path, 10).expect("missing parent reads as empty");
    store.record_session(run(90, 9.0));
    assert!(matches!(store.flush(), Err(PersistenceError::Io { .. })));
    assert!(store.best().is_none());
}
