use std::{str::FromStr, sync::Arc};

use futures::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{
    config::SqliteConfig,
    error::{SqliteDaoError, SqliteResult},
    models::{GameRow, PlayerRow, ScoreEntryRow},
};
use crate::{
    dao::{
        models::{
            GameEntity, GameUpdate, NewScoreEntry, PlayerEntity, PlayerUpdate, ScoreEntryEntity,
        },
        score_store::ScoreStore,
        storage::StorageResult,
    },
    state::game::{EntryId, GameId, GameStatus, PlayerId, now_epoch_seconds},
};

const GAME_COLUMNS: &str = "id, status, created_at, updated_at";
const PLAYER_COLUMNS: &str =
    "id, game_id, name, current_score, consecutive_misses, is_eliminated, created_at";
const ENTRY_COLUMNS: &str =
    "id, player_id, game_id, score_value, entry_type, round_number, created_at";

const SCHEMA: [(&str, &str); 4] = [
    (
        "games",
        r#"
        CREATE TABLE IF NOT EXISTS games (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            status TEXT NOT NULL
                CHECK (status IN ('active', 'paused', 'completed', 'notcompleted')),
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    ),
    (
        "players",
        r#"
        CREATE TABLE IF NOT EXISTS players (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            game_id INTEGER NOT NULL REFERENCES games(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            current_score INTEGER NOT NULL DEFAULT 0,
            consecutive_misses INTEGER NOT NULL DEFAULT 0,
            is_eliminated INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        )
        "#,
    ),
    (
        "score_entries",
        r#"
        CREATE TABLE IF NOT EXISTS score_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id INTEGER NOT NULL REFERENCES players(id) ON DELETE CASCADE,
            game_id INTEGER NOT NULL REFERENCES games(id) ON DELETE CASCADE,
            score_value INTEGER NOT NULL CHECK (score_value >= 0),
            entry_type TEXT NOT NULL
                CHECK (entry_type IN ('single_block', 'multiple_blocks')),
            round_number INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    ),
    (
        "idx_score_entries_round",
        r#"
        CREATE INDEX IF NOT EXISTS idx_score_entries_round
            ON score_entries(game_id, round_number, id)
        "#,
    ),
];

/// SQLite-backed [`ScoreStore`].
#[derive(Clone)]
pub struct SqliteScoreStore {
    inner: Arc<SqliteInner>,
}

struct SqliteInner {
    pool: SqlitePool,
    schema: OnceCell<()>,
}

impl SqliteScoreStore {
    /// Open the database described by `config` and make sure the schema exists.
    pub async fn connect(config: SqliteConfig) -> SqliteResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|source| SqliteDaoError::InvalidUrl {
                url: config.url.clone(),
                source,
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
        if config.in_memory() {
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|source| SqliteDaoError::Connect {
                url: config.url.clone(),
                source,
            })?;

        let store = Self {
            inner: Arc::new(SqliteInner {
                pool,
                schema: OnceCell::new(),
            }),
        };
        store.ensure_schema().await?;
        info!(url = %config.url, "opened SQLite score store");
        Ok(store)
    }

    /// Ephemeral store, mostly useful for tests.
    pub async fn in_memory() -> SqliteResult<Self> {
        Self::connect(SqliteConfig::from_url("sqlite::memory:")).await
    }

    /// Create the tables once per store; later calls return immediately.
    pub async fn ensure_schema(&self) -> SqliteResult<()> {
        self.inner
            .schema
            .get_or_try_init(|| async {
                for (object, statement) in SCHEMA {
                    sqlx::query(statement)
                        .execute(&self.inner.pool)
                        .await
                        .map_err(|source| SqliteDaoError::EnsureSchema { object, source })?;
                }
                debug!("SQLite schema ensured");
                Ok::<(), SqliteDaoError>(())
            })
            .await
            .map(|_| ())
    }

    async fn create_game(&self) -> SqliteResult<GameEntity> {
        let now = now_epoch_seconds();
        let row: GameRow = sqlx::query_as(&format!(
            "INSERT INTO games (status, created_at, updated_at) VALUES (?1, ?2, ?2) RETURNING {GAME_COLUMNS}"
        ))
        .bind(GameStatus::Active.as_str())
        .bind(now)
        .fetch_one(&self.inner.pool)
        .await
        .map_err(|source| SqliteDaoError::Query {
            operation: "create_game",
            source,
        })?;
        row.try_into()
    }

    async fn get_game(&self, id: GameId) -> SqliteResult<Option<GameEntity>> {
        let row: Option<GameRow> =
            sqlx::query_as(&format!("SELECT {GAME_COLUMNS} FROM games WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.inner.pool)
                .await
                .map_err(|source| SqliteDaoError::Query {
                    operation: "get_game",
                    source,
                })?;
        row.map(TryInto::try_into).transpose()
    }

    async fn update_game(&self, id: GameId, update: GameUpdate) -> SqliteResult<GameEntity> {
        let row: Option<GameRow> = sqlx::query_as(&format!(
            "UPDATE games SET status = COALESCE(?1, status), updated_at = ?2 \
             WHERE id = ?3 RETURNING {GAME_COLUMNS}"
        ))
        .bind(update.status.map(GameStatus::as_str))
        .bind(now_epoch_seconds())
        .bind(id)
        .fetch_optional(&self.inner.pool)
        .await
        .map_err(|source| SqliteDaoError::Query {
            operation: "update_game",
            source,
        })?;

        row.ok_or(SqliteDaoError::Missing { entity: "game", id })?
            .try_into()
    }

    async fn find_resumable_game(&self) -> SqliteResult<Option<GameEntity>> {
        let row: Option<GameRow> = sqlx::query_as(&format!(
            "SELECT {GAME_COLUMNS} FROM games WHERE status IN ('active', 'paused') \
             ORDER BY created_at DESC, id DESC LIMIT 1"
        ))
        .fetch_optional(&self.inner.pool)
        .await
        .map_err(|source| SqliteDaoError::Query {
            operation: "find_resumable_game",
            source,
        })?;
        row.map(TryInto::try_into).transpose()
    }

    async fn list_games(&self) -> SqliteResult<Vec<GameEntity>> {
        let rows: Vec<GameRow> = sqlx::query_as(&format!(
            "SELECT {GAME_COLUMNS} FROM games ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.inner.pool)
        .await
        .map_err(|source| SqliteDaoError::Query {
            operation: "list_games",
            source,
        })?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn add_player(&self, game_id: GameId, name: String) -> SqliteResult<PlayerEntity> {
        let row: PlayerRow = sqlx::query_as(&format!(
            "INSERT INTO players (game_id, name, created_at) VALUES (?1, ?2, ?3) \
             RETURNING {PLAYER_COLUMNS}"
        ))
        .bind(game_id)
        .bind(name)
        .bind(now_epoch_seconds())
        .fetch_one(&self.inner.pool)
        .await
        .map_err(|source| SqliteDaoError::Query {
            operation: "add_player",
            source,
        })?;
        row.try_into()
    }

    async fn get_players_for_game(&self, game_id: GameId) -> SqliteResult<Vec<PlayerEntity>> {
        let rows: Vec<PlayerRow> = sqlx::query_as(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE game_id = ?1 ORDER BY id ASC"
        ))
        .bind(game_id)
        .fetch_all(&self.inner.pool)
        .await
        .map_err(|source| SqliteDaoError::Query {
            operation: "get_players_for_game",
            source,
        })?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_player(&self, id: PlayerId, update: PlayerUpdate) -> SqliteResult<PlayerEntity> {
        let row: Option<PlayerRow> = sqlx::query_as(&format!(
            "UPDATE players SET \
                current_score = COALESCE(?1, current_score), \
                consecutive_misses = COALESCE(?2, consecutive_misses), \
                is_eliminated = COALESCE(?3, is_eliminated) \
             WHERE id = ?4 RETURNING {PLAYER_COLUMNS}"
        ))
        .bind(update.current_score)
        .bind(update.consecutive_misses.map(i64::from))
        .bind(update.is_eliminated)
        .bind(id)
        .fetch_optional(&self.inner.pool)
        .await
        .map_err(|source| SqliteDaoError::Query {
            operation: "update_player",
            source,
        })?;

        row.ok_or(SqliteDaoError::Missing {
            entity: "player",
            id,
        })?
        .try_into()
    }

    async fn insert_score_entry(&self, entry: NewScoreEntry) -> SqliteResult<EntryId> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO score_entries \
                (player_id, game_id, score_value, entry_type, round_number, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id",
        )
        .bind(entry.player_id)
        .bind(entry.game_id)
        .bind(entry.score_value)
        .bind(entry.entry_type.as_str())
        .bind(i64::from(entry.round_number))
        .bind(now_epoch_seconds())
        .fetch_one(&self.inner.pool)
        .await
        .map_err(|source| SqliteDaoError::Query {
            operation: "insert_score_entry",
            source,
        })?;
        Ok(id)
    }

    async fn get_last_score_entry_for_round(
        &self,
        game_id: GameId,
        round: u32,
    ) -> SqliteResult<Option<ScoreEntryEntity>> {
        let row: Option<ScoreEntryRow> = sqlx::query_as(&format!(
            "SELECT {ENTRY_COLUMNS} FROM score_entries \
             WHERE game_id = ?1 AND round_number = ?2 ORDER BY id DESC LIMIT 1"
        ))
        .bind(game_id)
        .bind(i64::from(round))
        .fetch_optional(&self.inner.pool)
        .await
        .map_err(|source| SqliteDaoError::Query {
            operation: "get_last_score_entry_for_round",
            source,
        })?;
        row.map(TryInto::try_into).transpose()
    }

    async fn delete_score_entry(&self, id: EntryId) -> SqliteResult<()> {
        let result = sqlx::query("DELETE FROM score_entries WHERE id = ?1")
            .bind(id)
            .execute(&self.inner.pool)
            .await
            .map_err(|source| SqliteDaoError::Query {
                operation: "delete_score_entry",
                source,
            })?;

        if result.rows_affected() == 0 {
            return Err(SqliteDaoError::Missing {
                entity: "score entry",
                id,
            });
        }
        Ok(())
    }

    async fn get_score_entries_by_round(
        &self,
        game_id: GameId,
        round: u32,
    ) -> SqliteResult<Vec<ScoreEntryEntity>> {
        let rows: Vec<ScoreEntryRow> = sqlx::query_as(&format!(
            "SELECT {ENTRY_COLUMNS} FROM score_entries \
             WHERE game_id = ?1 AND round_number = ?2 ORDER BY id ASC"
        ))
        .bind(game_id)
        .bind(i64::from(round))
        .fetch_all(&self.inner.pool)
        .await
        .map_err(|source| SqliteDaoError::Query {
            operation: "get_score_entries_by_round",
            source,
        })?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn ping(&self) -> SqliteResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.inner.pool)
            .await
            .map_err(|source| SqliteDaoError::Query {
                operation: "ping",
                source,
            })?;
        Ok(())
    }
}

impl ScoreStore for SqliteScoreStore {
    fn create_game(&self) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move { store.create_game().await.map_err(Into::into) })
    }

    fn get_game(&self, id: GameId) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.get_game(id).await.map_err(Into::into) })
    }

    fn update_game(
        &self,
        id: GameId,
        update: GameUpdate,
    ) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move { store.update_game(id, update).await.map_err(Into::into) })
    }

    fn find_resumable_game(&self) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_resumable_game().await.map_err(Into::into) })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_games().await.map_err(Into::into) })
    }

    fn add_player(
        &self,
        game_id: GameId,
        name: String,
    ) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
        let store = self.clone();
        Box::pin(async move { store.add_player(game_id, name).await.map_err(Into::into) })
    }

    fn get_players_for_game(
        &self,
        game_id: GameId,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.get_players_for_game(game_id).await.map_err(Into::into) })
    }

    fn update_player(
        &self,
        id: PlayerId,
        update: PlayerUpdate,
    ) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
        let store = self.clone();
        Box::pin(async move { store.update_player(id, update).await.map_err(Into::into) })
    }

    fn insert_score_entry(&self, entry: NewScoreEntry) -> BoxFuture<'static, StorageResult<EntryId>> {
        let store = self.clone();
        Box::pin(async move { store.insert_score_entry(entry).await.map_err(Into::into) })
    }

    fn get_last_score_entry_for_round(
        &self,
        game_id: GameId,
        round: u32,
    ) -> BoxFuture<'static, StorageResult<Option<ScoreEntryEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .get_last_score_entry_for_round(game_id, round)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_score_entry(&self, id: EntryId) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.delete_score_entry(id).await.map_err(Into::into) })
    }

    fn get_score_entries_by_round(
        &self,
        game_id: GameId,
        round: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntryEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .get_score_entries_by_round(game_id, round)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dao::storage::StorageError, state::game::EntryType};

    async fn store_with_player() -> (SqliteScoreStore, GameEntity, PlayerEntity) {
        let store = SqliteScoreStore::in_memory().await.unwrap();
        let game = ScoreStore::create_game(&store).await.unwrap();
        let player = ScoreStore::add_player(&store, game.id, "Aino".into())
            .await
            .unwrap();
        (store, game, player)
    }

    fn entry(game: &GameEntity, player: &PlayerEntity, value: i32, round: u32) -> NewScoreEntry {
        NewScoreEntry {
            player_id: player.id,
            game_id: game.id,
            score_value: value,
            entry_type: EntryType::SingleBlock,
            round_number: round,
        }
    }

    #[tokio::test]
    async fn schema_initialisation_is_idempotent() {
        let store = SqliteScoreStore::in_memory().await.unwrap();
        store.ensure_schema().await.unwrap();
        store.ensure_schema().await.unwrap();
        ScoreStore::health_check(&store).await.unwrap();
    }

    #[tokio::test]
    async fn new_games_start_active_with_empty_players() {
        let (store, game, player) = store_with_player().await;
        assert_eq!(game.status, GameStatus::Active);
        assert_eq!(player.current_score, 0);
        assert_eq!(player.consecutive_misses, 0);
        assert!(!player.is_eliminated);

        let fetched = ScoreStore::get_game(&store, game.id).await.unwrap();
        assert_eq!(fetched, Some(game));
        assert_eq!(ScoreStore::get_game(&store, 999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn last_entry_follows_insertion_order_within_round() {
        let (store, game, player) = store_with_player().await;
        let first = ScoreStore::insert_score_entry(&store, entry(&game, &player, 3, 1))
            .await
            .unwrap();
        let second = ScoreStore::insert_score_entry(&store, entry(&game, &player, 0, 1))
            .await
            .unwrap();
        ScoreStore::insert_score_entry(&store, entry(&game, &player, 9, 2))
            .await
            .unwrap();

        let last = ScoreStore::get_last_score_entry_for_round(&store, game.id, 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(last.id, second);
        assert_eq!(last.score_value, 0);

        let round = ScoreStore::get_score_entries_by_round(&store, game.id, 1)
            .await
            .unwrap();
        assert_eq!(
            round.iter().map(|entry| entry.id).collect::<Vec<_>>(),
            vec![first, second]
        );
        assert!(
            ScoreStore::get_last_score_entry_for_round(&store, game.id, 3)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn deleting_unknown_entry_is_an_error() {
        let (store, game, player) = store_with_player().await;
        let id = ScoreStore::insert_score_entry(&store, entry(&game, &player, 5, 1))
            .await
            .unwrap();

        ScoreStore::delete_score_entry(&store, id).await.unwrap();
        let err = ScoreStore::delete_score_entry(&store, id).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Missing {
                entity: "score entry",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn partial_updates_only_touch_given_fields() {
        let (store, game, player) = store_with_player().await;

        let updated = ScoreStore::update_player(
            &store,
            player.id,
            PlayerUpdate {
                current_score: Some(17),
                ..PlayerUpdate::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.current_score, 17);
        assert_eq!(updated.consecutive_misses, 0);

        let updated = ScoreStore::update_player(
            &store,
            player.id,
            PlayerUpdate {
                consecutive_misses: Some(2),
                ..PlayerUpdate::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.current_score, 17);
        assert_eq!(updated.consecutive_misses, 2);

        let err = ScoreStore::update_player(&store, 404, PlayerUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Missing { entity: "player", .. }));

        let paused = ScoreStore::update_game(&store, game.id, GameUpdate::status(GameStatus::Paused))
            .await
            .unwrap();
        assert_eq!(paused.status, GameStatus::Paused);
    }

    #[tokio::test]
    async fn resumable_game_is_latest_live_one() {
        let store = SqliteScoreStore::in_memory().await.unwrap();
        let older = ScoreStore::create_game(&store).await.unwrap();
        let newer = ScoreStore::create_game(&store).await.unwrap();
        ScoreStore::update_game(&store, newer.id, GameUpdate::status(GameStatus::Completed))
            .await
            .unwrap();

        let resumable = ScoreStore::find_resumable_game(&store).await.unwrap().unwrap();
        assert_eq!(resumable.id, older.id);

        let games = ScoreStore::list_games(&store).await.unwrap();
        assert_eq!(
            games.iter().map(|game| game.id).collect::<Vec<_>>(),
            vec![newer.id, older.id]
        );
    }
}
