//! The game facade.
//!
//! [`Game`] owns the ECS [`App`], the [`GameState`] machine and the two
//! outbound ports: a [`GameEventSink`] for gameplay events and a
//! [`ScoreStore`] for finished runs. A host calls [`Game::update`] once per
//! frame with the raw lean reading and drives menus through the transition
//! methods.

use bevy_app::App;
use bevy_ecs::prelude::*;
use glam::Vec3;
use log::{debug, error, info};

use crate::components::{EucState, Gameplay, Player, Transform, Velocity};
use crate::config::{ConfigError, GameConfig};
use crate::constants::MAX_TICK_DT;
use crate::events::{dispatch, GameEventOutbox, GameEventSink};
use crate::numeric::sanitize_dt;
use crate::ragdoll::{FallPose, RagdollSystem};
use crate::session::{GameSession, GameState, ScoreStore, TransitionError};
use crate::spawn::spawn_player;
use crate::systems::{
    FallRequest, FlockAlarms, FrameTime, PendingKnockdowns, SimulationMode, SimulationPlugin,
};
use crate::vehicle::{Calibration, FallCause, LeanInput};

/// Populates the world around a freshly spawned rider.
pub type WorldGenerator = Box<dyn FnMut(&mut World) + Send>;

/// One rider's game: simulation, state machine and outbound ports.
pub struct Game {
    app: App,
    state: GameState,
    config: GameConfig,
    calibration: Calibration,
    sink: Box<dyn GameEventSink>,
    store: Box<dyn ScoreStore>,
    world_generator: Option<WorldGenerator>,
}

impl Game {
    /// Builds a game in `Loading` around a validated `config`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] when `config` fails validation.
    pub fn new(
        config: GameConfig,
        seed: u64,
        sink: Box<dyn GameEventSink>,
        store: Box<dyn ScoreStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut app = App::new();
        app.add_plugins(SimulationPlugin::new(config.clone(), seed));
        Ok(Self {
            app,
            state: GameState::default(),
            config,
            calibration: Calibration::default(),
            sink,
            store,
            world_generator: None,
        })
    }

    /// Runs `generator` every time a run starts, after the rider spawns.
    #[must_use]
    pub fn with_world_generator(
        mut self,
        generator: impl FnMut(&mut World) + Send + 'static,
    ) -> Self {
        self.world_generator = Some(Box::new(generator));
        self
    }

    /// Current mode.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Statistics of the run in progress, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&GameSession> {
        self.state.session()
    }

    /// Tuning the game was built with.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Neutral lean recorded by the last calibration.
    #[must_use]
    pub const fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// High-score storage.
    #[must_use]
    pub fn store(&self) -> &dyn ScoreStore {
        self.store.as_ref()
    }

    /// Ragdoll simulation, once the plugin has installed it.
    #[must_use]
    pub fn ragdoll(&self) -> Option<&RagdollSystem> {
        self.app.world().get_resource::<RagdollSystem>()
    }

    /// The ECS world.
    #[must_use]
    pub fn world(&self) -> &World {
        self.app.world()
    }

    /// The ECS world, mutably.
    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    /// # Errors
    /// Rejected outside `Loading`.
    pub fn finish_loading(&mut self) -> Result<(), TransitionError> {
        self.state.finish_loading()
    }

    /// # Errors
    /// Rejected outside `Menu`.
    pub fn begin_calibration(&mut self) -> Result<(), TransitionError> {
        self.state.begin_calibration()
    }

    /// Stores `neutral` as the rider's resting lean and returns to the menu.
    ///
    /// # Errors
    /// Rejected outside `Calibrating`; the previous calibration is kept.
    pub fn finish_calibration(&mut self, neutral: LeanInput) -> Result<(), TransitionError> {
        self.state.finish_calibration()?;
        self.calibration = Calibration::new(neutral);
        debug!("calibrated neutral lean {neutral:?}");
        Ok(())
    }

    /// # Errors
    /// Rejected outside `Menu`.
    pub fn start_countdown(&mut self) -> Result<(), TransitionError> {
        self.state.start_countdown(self.config.session.countdown_from)
    }

    /// # Errors
    /// Rejected outside `Playing`.
    pub fn pause(&mut self) -> Result<(), TransitionError> {
        self.state.pause()
    }

    /// # Errors
    /// Rejected outside `Paused`.
    pub fn resume(&mut self) -> Result<(), TransitionError> {
        self.state.resume()
    }

    /// Abandons the current run and counts down to a new one.
    ///
    /// # Errors
    /// Rejected when no run has been started.
    pub fn restart(&mut self) -> Result<(), TransitionError> {
        self.state.restart(self.config.session.countdown_from)?;
        self.teardown();
        Ok(())
    }

    /// # Errors
    /// Rejected while loading.
    pub fn return_to_menu(&mut self) -> Result<(), TransitionError> {
        self.state.return_to_menu()?;
        self.teardown();
        Ok(())
    }

    /// Advances the game by `dt` seconds with the uncalibrated lean `raw`.
    ///
    /// Non-finite or negative `dt` is treated as zero and long frames are
    /// capped, so a stalled host cannot push the simulation into a huge
    /// step.
    pub fn update(&mut self, dt: f32, raw: LeanInput) {
        let step = sanitize_dt(dt, MAX_TICK_DT);
        match self.state {
            GameState::Countdown { .. } => {
                if self.state.tick_countdown(step) {
                    self.begin_run();
                }
            }
            GameState::Playing(_) => self.tick_playing(step, raw),
            GameState::Falling { .. } => self.tick_falling(step),
            _ => {}
        }
    }

    fn tick_playing(&mut self, dt: f32, raw: LeanInput) {
        let input = self.calibration.apply(raw);
        let world = self.app.world_mut();
        world.insert_resource(input);
        world.insert_resource(FrameTime(dt));
        self.app.update();
        self.forward_events();

        if let Some(session) = self.app.world().get_resource::<GameSession>().copied() {
            self.state.refresh_session(session);
        }
        let cause = self
            .app
            .world_mut()
            .get_resource_mut::<FallRequest>()
            .and_then(|mut request| request.take());
        if let Some(cause) = cause {
            self.begin_fall(cause);
        }
    }

    fn tick_falling(&mut self, dt: f32) {
        self.app.world_mut().insert_resource(FrameTime(dt));
        self.app.update();
        self.forward_events();
        if let Some(session) = self.state.tick_fall(dt, self.config.session.fall_duration) {
            self.finish_run(session);
        }
    }

    fn forward_events(&mut self) {
        let Some(mut outbox) = self.app.world_mut().get_resource_mut::<GameEventOutbox>() else {
            return;
        };
        for event in outbox.drain() {
            dispatch(self.sink.as_mut(), event);
        }
    }

    fn rider_pose(&mut self) -> Option<FallPose> {
        let world = self.app.world_mut();
        let mut riders =
            world.query_filtered::<(&Transform, &Velocity, &EucState), With<Player>>();
        let (transform, velocity, euc) = riders.iter(world).next()?;
        Some(FallPose {
            position: transform.position,
            yaw: transform.yaw,
            velocity: velocity.linear,
            side_lean: euc.side_lean,
            forward_lean: euc.forward_lean,
        })
    }

    fn begin_fall(&mut self, cause: FallCause) {
        let pose = self.rider_pose();
        let world = self.app.world_mut();
        world.insert_resource(SimulationMode::Spectating);
        if let (Some(pose), Some(mut ragdoll)) = (pose, world.get_resource_mut::<RagdollSystem>())
        {
            if let Err(err) = ragdoll.start_fall(&pose) {
                error!("rider ragdoll failed to start: {err}");
            }
        }
        if self.state.fall(cause).is_ok() {
            info!("rider down: {cause:?}");
        }
    }

    fn finish_run(&mut self, session: GameSession) {
        if let Some(mut ragdoll) = self.app.world_mut().get_resource_mut::<RagdollSystem>() {
            ragdoll.freeze();
        }
        let summary = session.summary(&self.config.session);
        if self.state.end_run(summary).is_err() {
            return;
        }
        info!(
            "run over: {} points over {:.1} m",
            summary.score, summary.distance
        );
        self.store.record_session(summary);
        if let Err(err) = self.store.flush() {
            error!("failed to save scores: {err}");
        }
    }

    /// Spawns the rider into a clean world with fresh per-run resources.
    fn begin_run(&mut self) {
        self.teardown();
        let world = self.app.world_mut();
        world.insert_resource(GameSession::default());
        world.insert_resource(FallRequest::default());
        world.insert_resource(FlockAlarms::default());
        world.insert_resource(PendingKnockdowns::default());
        world.insert_resource(LeanInput::default());
        spawn_player(world, Vec3::ZERO, 0.0);
        if let Some(generate) = self.world_generator.as_mut() {
            generate(world);
        }
    }

    /// Drops every ragdoll, static collider and gameplay entity.
    fn teardown(&mut self) {
        let world = self.app.world_mut();
        if let Some(mut ragdoll) = world.get_resource_mut::<RagdollSystem>() {
            ragdoll.stop(true);
            ragdoll.clear_static_colliders();
        }
        let doomed: Vec<Entity> = world
            .query_filtered::<Entity, With<Gameplay>>()
            .iter(world)
            .collect();
        let count = doomed.len();
        for entity in doomed {
            if let Ok(entity_mut) = world.get_entity_mut(entity) {
                entity_mut.despawn();
            }
        }
        if let Some(mut outbox) = world.get_resource_mut::<GameEventOutbox>() {
            outbox.clear();
        }
        world.insert_resource(SimulationMode::Riding);
        debug!("cleared {count} gameplay entities");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullEventSink;
    use crate::session::MemoryScoreStore;
    use rstest::{fixture, rstest};

    #[fixture]
    fn game() -> Game {
        let mut game = Game::new(
            GameConfig::default(),
            7,
            Box::new(NullEventSink),
            Box::new(MemoryScoreStore::new(10)),
        )
        .expect("default config is valid");
        game.finish_loading().expect("loading finishes");
        game
    }

    fn run_until(game: &mut Game, input: LeanInput, done: impl Fn(&GameState) -> bool) {
        for _ in 0..200 {
            if done(game.state()) {
                return;
            }
            game.update(0.1, input);
        }
        panic!("state never reached: {:?}", game.state());
    }

    fn riders(game: &mut Game) -> usize {
        game.world_mut()
            .query_filtered::<Entity, With<Player>>()
            .iter(game.world())
            .count()
    }

    #[rstest]
    fn invalid_config_is_refused() {
        let mut config = GameConfig::default();
        config.vehicle.max_speed = config.vehicle.min_speed;
        assert!(Game::new(
            config,
            0,
            Box::new(NullEventSink),
            Box::new(MemoryScoreStore::new(1))
        )
        .is_err());
    }

    #[rstest]
    fn countdown_spawns_a_rider(mut game: Game) {
        game.start_countdown().expect("countdown starts");
        assert_eq!(riders(&mut game), 0);
        run_until(&mut game, LeanInput::default(), |state| {
            matches!(state, GameState::Playing(_))
        });
        assert_eq!(riders(&mut game), 1);
    }

    #[rstest]
    fn calibration_is_applied_to_input(mut game: Game) {
        let neutral = LeanInput::new(0.2, -0.1);
        game.begin_calibration().expect("calibration starts");
        game.finish_calibration(neutral).expect("calibration ends");
        assert_eq!(game.calibration().apply(neutral), LeanInput::default());
        game.start_countdown().expect("countdown starts");
        run_until(&mut game, neutral, |state| matches!(state, GameState::Playing(_)));
        for _ in 0..10 {
            game.update(0.1, neutral);
        }
        assert!(matches!(game.state(), GameState::Playing(_)));
    }

    #[rstest]
    fn critical_lean_ends_the_run_and_records_it(mut game: Game) {
        game.start_countdown().expect("countdown starts");
        run_until(&mut game, LeanInput::default(), |state| {
            matches!(state, GameState::Playing(_))
        });
        game.update(0.1, LeanInput::new(1.0, 0.0));
        assert!(matches!(
            game.state(),
            GameState::Falling {
                cause: FallCause::Lean,
                ..
            }
        ));
        assert!(game.ragdoll().is_some_and(RagdollSystem::is_active));

        run_until(&mut game, LeanInput::default(), |state| {
            matches!(state, GameState::GameOver(_))
        });
        assert!(game.ragdoll().is_some_and(RagdollSystem::is_frozen));
        assert!(game.store().best().is_some());
    }

    #[rstest]
    fn restart_clears_the_world(mut game: Game) {
        game.start_countdown().expect("countdown starts");
        run_until(&mut game, LeanInput::default(), |state| {
            matches!(state, GameState::Playing(_))
        });
        game.restart().expect("restart");
        assert_eq!(riders(&mut game), 0);
        assert!(matches!(game.state(), GameState::Countdown { .. }));
        game.return_to_menu().expect("menu");
        assert_eq!(*game.state(), GameState::Menu);
    }
}
