use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the ledger, logging connectivity issues instead of failing.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let game_loaded = state.session().snapshot().game.is_some();
    match state.store().health_check().await {
        Ok(()) => HealthResponse::ok(game_loaded),
        Err(err) => {
            warn!(error = %err, "score ledger health check failed");
            HealthResponse::degraded(game_loaded)
        }
    }
}

#[cfg(all(test, feature = "sqlite-store"))]
mod tests {
    use super::*;
    use crate::services::{game_service::start_game, test_support::test_state};

    #[tokio::test]
    async fn in_memory_ledger_is_healthy() {
        let state = test_state().await;
        assert_eq!(health_status(&state).await, HealthResponse::ok(false));

        start_game(&state).await.unwrap();
        assert!(health_status(&state).await.game_loaded);
    }
}
