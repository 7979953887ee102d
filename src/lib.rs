#![cfg_attr(docsrs, feature(doc_cfg))]
//! Library crate providing the Monowheel simulation core.
//!
//! An electric unicycle rider weaves down a busy street. The crate holds the
//! position-based rigid body solver behind the rider and pedestrian
//! ragdolls, the vehicle model, the ECS systems that drive traffic,
//! pedestrians and pigeons, and the [`Game`] facade that ties a run
//! together. Rendering, audio and input devices stay outside: events leave
//! through [`GameEventSink`] and finished runs through [`ScoreStore`].
pub mod collision;
pub mod components;
pub mod config;
pub mod constants;
pub mod events;
pub mod game;
pub mod logging;
pub mod numeric;
pub mod physics;
pub mod ragdoll;
pub mod session;
pub mod spawn;
pub mod systems;
pub mod vector_math;
pub mod vehicle;

// Re-export commonly used items
pub use components::{
    Car, Collider, EucState, Gameplay, Obstacle, ObstacleKind, Pedestrian, Pigeon, Player,
    Transform, Velocity,
};
pub use config::{ConfigError, GameConfig};
pub use events::{GameEvent, GameEventOutbox, GameEventSink, LogEventSink, NullEventSink};
pub use game::Game;
pub use logging::init as init_logging;
pub use physics::{ColliderType, DynamicsWorld, PhysicsError};
pub use ragdoll::RagdollSystem;
pub use session::{
    GameSession, GameState, JsonScoreStore, MemoryScoreStore, PersistenceError, ScoreStore,
    SessionSummary, TransitionError,
};
pub use spawn::{build_demo_street, StreetLayout};
pub use systems::SimulationPlugin;
pub use vehicle::{Calibration, FallCause, LeanInput};

/// Common imports.
pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use monowheel::prelude::*;
    //! ```

    pub use crate::components::{ObstacleKind, Transform};
    pub use crate::events::{GameEvent, GameEventSink, NullEventSink};
    pub use crate::Game;
    pub use crate::GameConfig;
    pub use crate::GameState;
    pub use crate::LeanInput;
    pub use crate::MemoryScoreStore;
    pub use crate::ScoreStore;
}
