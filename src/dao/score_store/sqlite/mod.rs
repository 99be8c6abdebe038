mod config;
mod error;
mod models;
/// Pooled SQLite implementation of the ledger.
pub mod store;

pub use config::SqliteConfig;
pub use error::SqliteDaoError;
pub use store::SqliteScoreStore;

use crate::dao::storage::StorageError;

impl From<SqliteDaoError> for StorageError {
    fn from(err: SqliteDaoError) -> Self {
        match err {
            SqliteDaoError::Missing { entity, id } => StorageError::Missing { entity, id },
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
