use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use crate::{config::AppConfig, dao::game_store::GameStore, error::ServiceError};

/// Shared handle to the application state, cloned into every handler.
pub type SharedState = Arc<AppState>;

/// Central application state holding the storage backend slot, the degraded
/// flag, and the immutable runtime configuration.
///
/// There is deliberately no other process-wide mutable game state: every
/// operation reads and writes through the installed [`GameStore`], so
/// multiple instances can serve the same database.
pub struct AppState {
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    degraded: AtomicBool,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be
    /// cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is
    /// installed.
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(Self {
            game_store: RwLock::new(None),
            degraded: AtomicBool::new(true),
            config,
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the game store or fail with the degraded-mode service error.
    pub async fn require_game_store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        self.game_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn set_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current backend and enter degraded mode.
    pub async fn clear_game_store(&self) {
        {
            let mut guard = self.game_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// Flip the degraded flag; called by the storage supervisor when the
    /// backend health changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.store(value, Ordering::Relaxed);
    }
}
