use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::dao::models::{GameEntity, PlayerEntity};

/// Identifier of a persisted game.
pub type GameId = i64;
/// Identifier of a persisted player.
pub type PlayerId = i64;
/// Identifier of a persisted score entry.
pub type EntryId = i64;

/// Current wall clock as epoch seconds, the timestamp unit used across storage.
pub fn now_epoch_seconds() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Lifecycle status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Players are throwing.
    Active,
    /// The session was left; the game can be resumed.
    Paused,
    /// A player reached exactly 50.
    Completed,
    /// Abandoned: superseded by a new game while paused.
    NotCompleted,
}

impl GameStatus {
    /// Stored representation of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Active => "active",
            GameStatus::Paused => "paused",
            GameStatus::Completed => "completed",
            GameStatus::NotCompleted => "notcompleted",
        }
    }

    /// Whether the game can still receive throws once resumed.
    pub fn is_live(self) -> bool {
        matches!(self, GameStatus::Active | GameStatus::Paused)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value `{0}`")]
pub struct UnknownVariant(pub String);

impl FromStr for GameStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(GameStatus::Active),
            "paused" => Ok(GameStatus::Paused),
            "completed" => Ok(GameStatus::Completed),
            "notcompleted" => Ok(GameStatus::NotCompleted),
            other => Err(UnknownVariant(other.to_owned())),
        }
    }
}

/// How a throw was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// One block fell; its number is the score.
    SingleBlock,
    /// Several blocks fell; the count is the score.
    MultipleBlocks,
}

impl EntryType {
    /// Stored representation of the entry type.
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::SingleBlock => "single_block",
            EntryType::MultipleBlocks => "multiple_blocks",
        }
    }
}

impl FromStr for EntryType {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "single_block" => Ok(EntryType::SingleBlock),
            "multiple_blocks" => Ok(EntryType::MultipleBlocks),
            other => Err(UnknownVariant(other.to_owned())),
        }
    }
}

/// Game record held by the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Game {
    /// Primary key of the game.
    pub id: GameId,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Creation timestamp (epoch seconds).
    pub created_at: i64,
    /// Last update timestamp (epoch seconds).
    pub updated_at: i64,
}

/// Player info tracked during a game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    /// Primary key of the player.
    pub id: PlayerId,
    /// Game the player belongs to.
    pub game_id: GameId,
    /// Display name.
    pub name: String,
    /// Score in `[0, 50]`.
    pub current_score: i32,
    /// Misses in a row; any scoring throw resets it.
    pub consecutive_misses: u32,
    /// Out for the current round only.
    pub is_eliminated: bool,
    /// Creation timestamp (epoch seconds).
    pub created_at: i64,
}

impl From<GameEntity> for Game {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id,
            status: value.status,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<PlayerEntity> for Player {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            game_id: value.game_id,
            name: value.name,
            current_score: value.current_score,
            consecutive_misses: value.consecutive_misses,
            is_eliminated: value.is_eliminated,
            created_at: value.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_text() {
        for status in [
            GameStatus::Active,
            GameStatus::Paused,
            GameStatus::Completed,
            GameStatus::NotCompleted,
        ] {
            assert_eq!(status.as_str().parse::<GameStatus>().unwrap(), status);
        }
        assert!("finished".parse::<GameStatus>().is_err());
    }

    #[test]
    fn only_active_and_paused_are_live() {
        assert!(GameStatus::Active.is_live());
        assert!(GameStatus::Paused.is_live());
        assert!(!GameStatus::Completed.is_live());
        assert!(!GameStatus::NotCompleted.is_live());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&GameStatus::NotCompleted).unwrap();
        assert_eq!(json, "\"notcompleted\"");
        let json = serde_json::to_string(&EntryType::MultipleBlocks).unwrap();
        assert_eq!(json, "\"multiple_blocks\"");
    }
}
