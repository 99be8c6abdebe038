const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Connection settings for [`super::SqliteScoreStore`].
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// sqlx connection URL, e.g. `sqlite://block_tally.db?mode=rwc`.
    pub url: String,
    /// Upper bound of the connection pool.
    pub max_connections: u32,
}

impl SqliteConfig {
    /// Build a configuration for `url`.
    ///
    /// In-memory databases live and die with their connection, so they are
    /// pinned to a single pooled connection.
    pub fn from_url(url: &str) -> Self {
        let max_connections = if is_in_memory(url) {
            1
        } else {
            DEFAULT_MAX_CONNECTIONS
        };
        Self {
            url: url.to_owned(),
            max_connections,
        }
    }

    /// Whether the configured database only exists in memory.
    pub fn in_memory(&self) -> bool {
        is_in_memory(&self.url)
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_databases_use_one_connection() {
        let config = SqliteConfig::from_url("sqlite::memory:");
        assert!(config.in_memory());
        assert_eq!(config.max_connections, 1);

        let config = SqliteConfig::from_url("sqlite://tally.db?mode=rwc");
        assert!(!config.in_memory());
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
    }
}
