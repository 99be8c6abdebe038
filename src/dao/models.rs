use serde::{Deserialize, Serialize};

use crate::state::game::{EntryId, EntryType, GameId, GameStatus, PlayerId};

/// Game row as persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: GameId,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Creation timestamp (epoch seconds).
    pub created_at: i64,
    /// Last update timestamp (epoch seconds).
    pub updated_at: i64,
}

/// Player row as persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Primary key of the player.
    pub id: PlayerId,
    /// Owning game.
    pub game_id: GameId,
    /// Display name.
    pub name: String,
    /// Durable score.
    pub current_score: i32,
    /// Durable miss streak.
    pub consecutive_misses: u32,
    /// Stored elimination flag. Elimination is round-scoped, so the scoring
    /// flow never sets it; it only ever gets cleared.
    pub is_eliminated: bool,
    /// Creation timestamp (epoch seconds).
    pub created_at: i64,
}

/// Append-only ledger entry for a single throw.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntryEntity {
    /// Primary key; ascending ids give insertion order.
    pub id: EntryId,
    /// Player who threw.
    pub player_id: PlayerId,
    /// Game the throw belongs to.
    pub game_id: GameId,
    /// Raw points of the throw; `0` is a miss.
    pub score_value: i32,
    /// How the throw was recorded.
    pub entry_type: EntryType,
    /// Round the throw happened in.
    pub round_number: u32,
    /// Creation timestamp (epoch seconds).
    pub created_at: i64,
}

/// Ledger entry about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScoreEntry {
    /// Player who threw.
    pub player_id: PlayerId,
    /// Game the throw belongs to.
    pub game_id: GameId,
    /// Raw points of the throw.
    pub score_value: i32,
    /// How the throw was recorded.
    pub entry_type: EntryType,
    /// Round the throw happened in.
    pub round_number: u32,
}

/// Partial update of a player row; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerUpdate {
    /// New score.
    pub current_score: Option<i32>,
    /// New miss streak.
    pub consecutive_misses: Option<u32>,
    /// New elimination flag.
    pub is_eliminated: Option<bool>,
}

impl PlayerUpdate {
    /// Whether the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.current_score.is_none()
            && self.consecutive_misses.is_none()
            && self.is_eliminated.is_none()
    }
}

/// Partial update of a game row; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameUpdate {
    /// New lifecycle status.
    pub status: Option<GameStatus>,
}

impl GameUpdate {
    /// Update only the status.
    pub fn status(status: GameStatus) -> Self {
        Self {
            status: Some(status),
        }
    }
}
