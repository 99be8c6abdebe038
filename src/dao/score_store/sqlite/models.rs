use sqlx::FromRow;

use super::error::{SqliteDaoError, SqliteResult};
use crate::dao::models::{GameEntity, PlayerEntity, ScoreEntryEntity};

#[derive(Debug, FromRow)]
pub(super) struct GameRow {
    id: i64,
    status: String,
    created_at: i64,
    updated_at: i64,
}

#[derive(Debug, FromRow)]
pub(super) struct PlayerRow {
    id: i64,
    game_id: i64,
    name: String,
    current_score: i64,
    consecutive_misses: i64,
    is_eliminated: bool,
    created_at: i64,
}

#[derive(Debug, FromRow)]
pub(super) struct ScoreEntryRow {
    id: i64,
    player_id: i64,
    game_id: i64,
    score_value: i64,
    entry_type: String,
    round_number: i64,
    created_at: i64,
}

fn narrow<T: TryFrom<i64>>(column: &'static str, value: i64) -> SqliteResult<T> {
    T::try_from(value).map_err(|_| SqliteDaoError::InvalidColumn {
        column,
        value: value.to_string(),
    })
}

impl TryFrom<GameRow> for GameEntity {
    type Error = SqliteDaoError;

    fn try_from(row: GameRow) -> SqliteResult<Self> {
        let status = row
            .status
            .parse()
            .map_err(|_| SqliteDaoError::InvalidColumn {
                column: "games.status",
                value: row.status.clone(),
            })?;
        Ok(Self {
            id: row.id,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<PlayerRow> for PlayerEntity {
    type Error = SqliteDaoError;

    fn try_from(row: PlayerRow) -> SqliteResult<Self> {
        Ok(Self {
            id: row.id,
            game_id: row.game_id,
            name: row.name,
            current_score: narrow("players.current_score", row.current_score)?,
            consecutive_misses: narrow("players.consecutive_misses", row.consecutive_misses)?,
            is_eliminated: row.is_eliminated,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<ScoreEntryRow> for ScoreEntryEntity {
    type Error = SqliteDaoError;

    fn try_from(row: ScoreEntryRow) -> SqliteResult<Self> {
        let entry_type = row
            .entry_type
            .parse()
            .map_err(|_| SqliteDaoError::InvalidColumn {
                column: "score_entries.entry_type",
                value: row.entry_type.clone(),
            })?;
        Ok(Self {
            id: row.id,
            player_id: row.player_id,
            game_id: row.game_id,
            score_value: narrow("score_entries.score_value", row.score_value)?,
            entry_type,
            round_number: narrow("score_entries.round_number", row.round_number)?,
            created_at: row.created_at,
        })
    }
}
