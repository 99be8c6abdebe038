//! Scorekeeper for a block-stacking throwing game.
//!
//! The rule engine in [`rules`] decides what a throw does, the services in
//! [`services`] persist it to the score ledger and then feed the matching
//! [`state::GameAction`] to the in-memory session store. Presentation layers
//! read [`state::GameState`] snapshots and the DTOs in [`dto`].

/// Runtime configuration.
pub mod config;
/// Persistence boundary.
pub mod dao;
/// Presentation-facing requests and views.
pub mod dto;
/// Service errors and display reports.
pub mod error;
/// Pure game rules.
pub mod rules;
/// Orchestration over the ledger and the session store.
pub mod services;
/// Session store and reducer.
pub mod state;
/// Tracing setup.
pub mod telemetry;

#[cfg(feature = "sqlite-store")]
pub use self::open::open;

#[cfg(feature = "sqlite-store")]
mod open {
    use std::sync::Arc;

    use tracing::info;

    use crate::{
        config::AppConfig,
        dao::{
            score_store::sqlite::{SqliteConfig, SqliteScoreStore},
            storage::StorageError,
        },
        state::{AppState, SharedState},
    };

    /// Open the SQLite ledger named in `config` and build the shared state.
    pub async fn open(config: AppConfig) -> Result<SharedState, StorageError> {
        let store = SqliteScoreStore::connect(SqliteConfig::from_url(&config.database_url)).await?;
        info!(database_url = %config.database_url, "score ledger ready");
        Ok(AppState::new(Arc::new(store), config))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::services::health_service::health_status;

        #[tokio::test]
        async fn opens_in_memory_ledger() {
            let state = open(AppConfig::in_memory()).await.unwrap();
            assert_eq!(health_status(&state).await.status, "ok");
        }

        #[tokio::test]
        async fn bad_url_is_unavailable() {
            let Err(err) = open(AppConfig {
                database_url: "sqlite:///missing-directory/tally.db".into(),
                ..AppConfig::in_memory()
            })
            .await
            else {
                panic!("opening a database in a missing directory succeeded");
            };
            assert!(matches!(err, StorageError::Unavailable { .. }));
        }
    }
}
