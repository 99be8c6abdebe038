use serde::Serialize;

/// Result of probing the score ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether a game is loaded in the session store.
    pub game_loaded: bool,
}

impl HealthResponse {
    /// The ledger answered.
    pub fn ok(game_loaded: bool) -> Self {
        Self {
            status: "ok".to_string(),
            game_loaded,
        }
    }

    /// The ledger could not be reached; scores will not be saved.
    pub fn degraded(game_loaded: bool) -> Self {
        Self {
            status: "degraded".to_string(),
            game_loaded,
        }
    }
}
