//! Thread-safe wrappers for the values rspec environments need to share.
//!
//! Neither a Bevy `App` nor a `Game` holding one is `Send`, but rspec wants
//! its environment `Clone + Send + Sync`. Values that are already `Send`
//! go straight into an `Arc<Mutex<_>>`.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bevy_app::App;
use monowheel::Game;

/// Wrapper that forwards `Send` and `Sync` because access is mutex-guarded.
#[derive(Debug)]
pub struct ThreadSafeApp(pub App);

impl Deref for ThreadSafeApp {
    type Target = App;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ThreadSafeApp {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

// SAFETY: rspec executes the suite serially and every access to the wrapped
// `App` goes through the mutex in `SharedApp`, so no two threads ever touch
// it at once.
unsafe impl Send for ThreadSafeApp {}
unsafe impl Sync for ThreadSafeApp {}

/// Same as [`ThreadSafeApp`] for a whole game.
pub struct ThreadSafeGame(pub Game);

impl Deref for ThreadSafeGame {
    type Target = Game;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ThreadSafeGame {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

// SAFETY: as for `ThreadSafeApp`; the game and its boxed ports are only
// reached through the mutex in `SharedGame`.
unsafe impl Send for ThreadSafeGame {}
unsafe impl Sync for ThreadSafeGame {}

/// Shared pointer type for the wrapped app.
pub type SharedApp = Arc<Mutex<ThreadSafeApp>>;

/// Shared pointer type for the wrapped game.
pub type SharedGame = Arc<Mutex<ThreadSafeGame>>;

#[must_use]
pub fn shared_app(app: App) -> SharedApp {
    Arc::new(Mutex::new(ThreadSafeApp(app)))
}

#[must_use]
pub fn shared_game(game: Game) -> SharedGame {
    Arc::new(Mutex::new(ThreadSafeGame(game)))
}

/// Locks a shared value, recovering from a poisoned mutex.
pub fn lock<T>(value: &Arc<Mutex<T>>) -> MutexGuard<'_, T> {
    value.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless_app;

    fn assert_shareable<T: Clone + Send + Sync>(_: &T) {}

    #[test]
    fn wrapped_app_can_live_in_an_rspec_environment() {
        let app = shared_app(headless_app());
        assert_shareable(&app);
        let copy = Arc::clone(&app);
        lock(&copy).update();
        assert!(lock(&app).world().contains_resource::<monowheel::RagdollSystem>());
    }

    #[test]
    fn poisoned_lock_still_yields_the_value() {
        let value = Arc::new(Mutex::new(3_u32));
        let poisoner = Arc::clone(&value);
        let outcome = std::thread::spawn(move || {
            let _guard = lock(&poisoner);
            panic!("poison the mutex");
        })
        .join();
        assert!(outcome.is_err());
        assert_eq!(*lock(&value), 3);
    }
}
