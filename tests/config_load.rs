//! Tuning files change how a run plays.

use std::io::Write;

use approx::assert_relative_eq;
use monowheel::session::{GameState, MemoryScoreStore};
use monowheel::vehicle::LeanInput;
use monowheel::{ConfigError, Game, GameConfig, NullEventSink};
use rstest::rstest;
use tempfile::NamedTempFile;

fn config_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(json.as_bytes()).expect("write config");
    file
}

#[rstest]
fn tuned_countdown_and_cruise_speed_apply() {
    let file = config_file(
        r#"{
            "session": { "countdown_from": 1 },
            "vehicle": { "min_speed": 5.0 }
        }"#,
    );
    let config = GameConfig::load(file.path()).expect("config loads");
    assert_eq!(config.session.countdown_from, 1);
    assert_relative_eq!(config.vehicle.max_speed, GameConfig::default().vehicle.max_speed);

    let mut game = Game::new(
        config,
        0,
        Box::new(NullEventSink),
        Box::new(MemoryScoreStore::new(1)),
    )
    .expect("valid config");
    game.finish_loading().expect("loading finishes");
    game.start_countdown().expect("countdown starts");
    let mut waited = 0;
    while !matches!(game.state(), GameState::Playing(_)) {
        assert!(waited < 12, "countdown of one second overran");
        game.update(0.1, LeanInput::default());
        waited += 1;
    }
    for _ in 0..30 {
        game.update(0.1, LeanInput::default());
    }
    let GameState::Playing(session) = *game.state() else {
        panic!("the run ended early: {:?}", game.state());
    };
    assert_relative_eq!(session.speed, 5.0, epsilon = 1e-4);
}

#[rstest]
#[case(r#"{ "vehicle": { "min_speed": 20.0 } }"#)]
#[case(r#"{ "physics": { "max_substeps": 0 } }"#)]
fn out_of_range_file_is_refused(#[case] json: &str) {
    let file = config_file(json);
    assert!(matches!(
        GameConfig::load(file.path()),
        Err(ConfigError::Invalid { .. })
    ));
}

#[rstest]
fn unknown_shapes_are_parse_errors() {
    let file = config_file(r#"{ "vehicle": { "max_speed": "fast" } }"#);
    assert!(matches!(
        GameConfig::load(file.path()),
        Err(ConfigError::Parse(_))
    ));
}
