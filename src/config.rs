//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the app looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BLOCK_TALLY_CONFIG_PATH";
const DEFAULT_DATABASE_URL: &str = "sqlite://block_tally.db?mode=rwc";
const DEFAULT_SUBMISSION_DEBOUNCE_MS: u64 = 500;
/// Blocks are numbered 1 to 12.
const DEFAULT_MAX_BLOCK_NUMBER: u32 = 12;
const DEFAULT_MAX_BLOCKS_PER_THROW: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Where the score ledger lives.
    pub database_url: String,
    /// Minimum spacing between two score submissions.
    pub submission_debounce: Duration,
    /// Highest block number accepted as input.
    pub max_block_number: u32,
    /// Most blocks a single throw may report.
    pub max_blocks_per_throw: usize,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to the built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document; missing keys take their default value.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Configuration backed by a throwaway in-memory database.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            ..Self::default()
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.into(),
            submission_debounce: Duration::from_millis(DEFAULT_SUBMISSION_DEBOUNCE_MS),
            max_block_number: DEFAULT_MAX_BLOCK_NUMBER,
            max_blocks_per_throw: DEFAULT_MAX_BLOCKS_PER_THROW,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    database_url: Option<String>,
    #[serde(default)]
    submission_debounce_ms: Option<u64>,
    #[serde(default)]
    max_block_number: Option<u32>,
    #[serde(default)]
    max_blocks_per_throw: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            database_url: value.database_url.unwrap_or(defaults.database_url),
            submission_debounce: value
                .submission_debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.submission_debounce),
            max_block_number: value.max_block_number.unwrap_or(defaults.max_block_number),
            max_blocks_per_throw: value
                .max_blocks_per_throw
                .unwrap_or(defaults.max_blocks_per_throw),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
