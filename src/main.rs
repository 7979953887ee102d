//! Headless runner: rides a scripted lean profile down a generated street
//! and prints the run summary.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;
use monowheel::{
    build_demo_street, init_logging, Game, GameConfig, GameState, JsonScoreStore, LeanInput,
    LogEventSink, MemoryScoreStore, ScoreStore, StreetLayout,
};

/// Rides a scripted electric unicycle down a generated street.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// JSON tuning file; missing fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Simulated seconds to ride before giving up
    #[arg(short, long, default_value_t = 60.0)]
    seconds: f32,
    /// Seed for street layout and AI
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// High-score file; scores are kept in memory when omitted
    #[arg(long)]
    scores: Option<PathBuf>,
}

const FRAME: f32 = 1.0 / 60.0;

/// A rider leaning steadily forward while slaloming left and right.
fn weaving_lean(t: f32) -> LeanInput {
    LeanInput::new(0.45 + 0.1 * (0.5 * t).sin(), 0.35 * (0.8 * t).sin())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };
    let slots = config.session.high_score_slots;
    let store: Box<dyn ScoreStore> = match &args.scores {
        Some(path) => Box::new(
            JsonScoreStore::open(path, slots)
                .with_context(|| format!("opening scores {}", path.display()))?,
        ),
        None => Box::new(MemoryScoreStore::new(slots)),
    };

    let layout = StreetLayout::default();
    let mut game = Game::new(config, args.seed, Box::new(LogEventSink::default()), store)?
        .with_world_generator(move |world| build_demo_street(world, &layout));
    game.finish_loading()?;
    game.start_countdown()?;

    let mut clock = 0.0_f32;
    let mut riding = 0.0_f32;
    while clock < args.seconds {
        if matches!(game.state(), GameState::GameOver(_)) {
            break;
        }
        if matches!(game.state(), GameState::Playing(_)) {
            riding += FRAME;
        }
        game.update(FRAME, weaving_lean(riding));
        clock += FRAME;
    }

    match game.state() {
        GameState::GameOver(summary) => info!(
            "final score {} ({:.1} m, {} near misses, top speed {:.1} m/s)",
            summary.score, summary.distance, summary.near_misses, summary.max_speed
        ),
        state => {
            if let Some(session) = state.session() {
                info!(
                    "stopped after {:.1} s still riding: {:.1} m, {} near misses",
                    args.seconds, session.distance, session.near_misses
                );
            }
        }
    }
    if let Some(best) = game.store().best() {
        info!("best score {}", best.score);
    }
    Ok(())
}
