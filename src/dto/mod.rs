use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Game, roster and history views.
pub mod game;
/// Ledger probe payload.
pub mod health;
/// Score submission requests and outcomes.
pub mod score;
/// Input parsing and validation helpers.
pub mod validation;

fn format_epoch_seconds(seconds: i64) -> String {
    OffsetDateTime::from_unix_timestamp(seconds)
        .ok()
        .and_then(|time| time.format(&Rfc3339).ok())
        .unwrap_or_else(|| "invalid-timestamp".into())
}
