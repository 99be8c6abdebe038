//! Error types shared by the SQLite storage implementation.

use thiserror::Error;

/// Convenient result alias returning [`SqliteDaoError`] failures.
pub type SqliteResult<T> = Result<T, SqliteDaoError>;

/// Failures that can occur while interacting with SQLite.
#[derive(Debug, Error)]
pub enum SqliteDaoError {
    /// The connection URL could not be parsed.
    #[error("invalid SQLite connection URL `{url}`")]
    InvalidUrl {
        /// URL as configured.
        url: String,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// Opening the connection pool failed.
    #[error("failed to open SQLite database `{url}`")]
    Connect {
        /// URL as configured.
        url: String,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// Creating a table or index failed.
    #[error("failed to ensure schema object `{object}`")]
    EnsureSchema {
        /// Table or index being created.
        object: &'static str,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// A statement failed to execute.
    #[error("SQLite query `{operation}` failed")]
    Query {
        /// Store operation that issued the statement.
        operation: &'static str,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },
    /// A stored column held a value the domain cannot represent.
    #[error("invalid value `{value}` in column `{column}`")]
    InvalidColumn {
        /// Qualified column name.
        column: &'static str,
        /// Offending value, rendered as text.
        value: String,
    },
    /// A write matched no row.
    #[error("{entity} `{id}` not found")]
    Missing {
        /// Table the write targeted.
        entity: &'static str,
        /// Identifier that matched no row.
        id: i64,
    },
}
