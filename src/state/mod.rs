/// Transitions accepted by the reducer.
pub mod actions;
/// Runtime game, player and enum types.
pub mod game;
/// Pure state transition function.
pub mod reducer;

use std::{sync::Arc, time::Instant};

use tokio::sync::{Mutex, MutexGuard, watch};
use tracing::debug;

use crate::{config::AppConfig, dao::score_store::ScoreStore, error::ServiceError};

pub use self::actions::GameAction;
pub use self::reducer::GameState;

/// Handle passed to every service call.
pub type SharedState = Arc<AppState>;

/// Owner of the in-memory session snapshot.
///
/// Every dispatch runs the pure reducer and publishes the resulting snapshot
/// to subscribers, so the presentation layer always sees a whole state.
pub struct SessionStore {
    current: watch::Sender<GameState>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a store holding the initial empty state.
    pub fn new() -> Self {
        let (current, _rx) = watch::channel(GameState::default());
        Self { current }
    }

    /// Clone of the current snapshot.
    pub fn snapshot(&self) -> GameState {
        self.current.borrow().clone()
    }

    /// Apply `action` and return the new snapshot.
    pub fn dispatch(&self, action: GameAction) -> GameState {
        let name = action.name();
        let mut applied = GameState::default();
        self.current.send_modify(|state| {
            *state = reducer::apply(state, action);
            applied = state.clone();
        });
        debug!(
            action = name,
            round = applied.current_round,
            leader = ?applied.leader,
            "session state updated"
        );
        applied
    }

    /// Subscribe to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<GameState> {
        self.current.subscribe()
    }
}

/// Central application state: storage handle, session store and guards.
pub struct AppState {
    store: Arc<dyn ScoreStore>,
    session: SessionStore,
    config: AppConfig,
    mutation_gate: Mutex<()>,
    last_submission: Mutex<Option<Instant>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(store: Arc<dyn ScoreStore>, config: AppConfig) -> SharedState {
        Arc::new(Self {
            store,
            session: SessionStore::new(),
            config,
            mutation_gate: Mutex::new(()),
            last_submission: Mutex::new(None),
        })
    }

    /// Persistence collaborator.
    pub fn store(&self) -> &Arc<dyn ScoreStore> {
        &self.store
    }

    /// In-memory session store.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Serialise orchestration steps so storage and memory advance in lockstep.
    pub async fn lock_mutations(&self) -> MutexGuard<'_, ()> {
        self.mutation_gate.lock().await
    }

    /// Reject a submission arriving within the debounce window of the previous one.
    pub async fn check_submission_debounce(&self) -> Result<(), ServiceError> {
        let mut last = self.last_submission.lock().await;
        let now = Instant::now();
        if let Some(previous) = *last {
            if now.duration_since(previous) < self.config.submission_debounce {
                return Err(ServiceError::Debounced);
            }
        }
        *last = Some(now);
        Ok(())
    }
}
