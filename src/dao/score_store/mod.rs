#[cfg(feature = "sqlite-store")]
/// SQLite backend built on sqlx.
pub mod sqlite;

use crate::dao::models::{
    GameEntity, GameUpdate, NewScoreEntry, PlayerEntity, PlayerUpdate, ScoreEntryEntity,
};
use crate::dao::storage::StorageResult;
use crate::state::game::{EntryId, GameId, PlayerId};
use futures::future::BoxFuture;

/// Abstraction over the persistence layer for games, players and the score ledger.
pub trait ScoreStore: Send + Sync {
    /// Insert a new game in `active` status.
    fn create_game(&self) -> BoxFuture<'static, StorageResult<GameEntity>>;
    /// Game by id, or `None` when it was never created.
    fn get_game(&self, id: GameId) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Apply a partial update, failing with `Missing` when the row does not exist.
    fn update_game(
        &self,
        id: GameId,
        update: GameUpdate,
    ) -> BoxFuture<'static, StorageResult<GameEntity>>;
    /// Most recently created game still `active` or `paused`.
    fn find_resumable_game(&self) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Every game, newest first.
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;

    /// Insert a player with a zero score into `game_id`.
    fn add_player(
        &self,
        game_id: GameId,
        name: String,
    ) -> BoxFuture<'static, StorageResult<PlayerEntity>>;
    /// Roster of a game in insertion order.
    fn get_players_for_game(
        &self,
        game_id: GameId,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    /// Apply a partial update, failing with `Missing` when the row does not exist.
    fn update_player(
        &self,
        id: PlayerId,
        update: PlayerUpdate,
    ) -> BoxFuture<'static, StorageResult<PlayerEntity>>;

    /// Append a throw to the ledger and return its id.
    fn insert_score_entry(&self, entry: NewScoreEntry) -> BoxFuture<'static, StorageResult<EntryId>>;
    /// Latest entry of a round by insertion order.
    fn get_last_score_entry_for_round(
        &self,
        game_id: GameId,
        round: u32,
    ) -> BoxFuture<'static, StorageResult<Option<ScoreEntryEntity>>>;
    /// Remove a ledger row; deleting an unknown id is an error, not a no-op.
    fn delete_score_entry(&self, id: EntryId) -> BoxFuture<'static, StorageResult<()>>;
    /// Entries of a round in insertion order.
    fn get_score_entries_by_round(
        &self,
        game_id: GameId,
        round: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntryEntity>>>;

    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
