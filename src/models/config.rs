//! Configuration model.

use crate::core::loader::LoadStrategy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default destination table.
pub const DEFAULT_TABLE: &str = "superstore_orders_table";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source file configuration.
    pub source: SourceConfig,
    /// Store configuration.
    pub store: StoreConfig,
    /// Load configuration.
    pub load: LoadConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Source file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Path to the delimited file.
    pub path: PathBuf,
    /// Encoding label understood by `encoding_rs` (e.g., "latin1", "utf-8").
    pub encoding: String,
    /// Field delimiter, a single ASCII character.
    pub delimiter: char,
}

/// SQLite store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file.
    pub path: PathBuf,
    /// Destination table name.
    pub table: String,
    /// Create the database file if it does not exist.
    pub create_if_missing: bool,
    /// Create the destination table if it does not exist.
    pub create_table: bool,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
}

/// Load configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// How duplicates are detected.
    pub strategy: LoadStrategy,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Optional log file, appended to on every run.
    pub file: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data").join("SampleSuperstore.csv"),
            encoding: "latin1".to_string(),
            delimiter: ',',
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("etl_superstore.db"),
            table: DEFAULT_TABLE.to_string(),
            create_if_missing: true,
            create_table: true,
            busy_timeout_ms: 5000,
        }
    }
}

/// Get the configuration directory path.
fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("superstore_etl")
}

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs_config_path().join("config.toml")
}

/// Parse configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
}

/// Load configuration from file.
///
/// An explicitly requested file must exist and parse. Without one, the
/// default location is tried and defaults are used if it is absent.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
            parse_config(&content)
        }
        None => {
            let config_path = default_config_path();
            if config_path.exists() {
                let content = std::fs::read_to_string(&config_path)?;
                return parse_config(&content);
            }
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store.table, "superstore_orders_table");
        assert_eq!(config.source.encoding, "latin1");
        assert_eq!(config.source.delimiter, ',');
        assert_eq!(config.load.strategy, LoadStrategy::CheckThenInsert);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config(
            r#"
            [store]
            path = "/tmp/orders.db"

            [load]
            strategy = "insert-or-ignore"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.path, PathBuf::from("/tmp/orders.db"));
        assert_eq!(config.store.table, DEFAULT_TABLE);
        assert!(config.store.create_table);
        assert_eq!(config.load.strategy, LoadStrategy::InsertOrIgnore);
    }

    #[test]
    fn test_invalid_config() {
        let result = parse_config("[load]\nstrategy = \"upsert\"\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_explicit_config() {
        let result = load_config(Some(Path::new("/nonexistent/config.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
