//! CLI configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use vend_db::DbConfig;

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// SQLite database file
    pub db_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Connection acquire timeout
    pub connect_timeout: Duration,
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                       | Default         |
    /// |--------------------------------|-----------------|
    /// | `VEND_DB_PATH`                 | `./vending.db`  |
    /// | `VEND_DB_MAX_CONNECTIONS`      | `5`             |
    /// | `VEND_DB_CONNECT_TIMEOUT_SECS` | `30`            |
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = CliConfig {
            db_path: lookup("VEND_DB_PATH")
                .unwrap_or_else(|| "./vending.db".to_string())
                .into(),

            max_connections: lookup("VEND_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("VEND_DB_MAX_CONNECTIONS".to_string()))?,

            connect_timeout: Duration::from_secs(
                lookup("VEND_DB_CONNECT_TIMEOUT_SECS")
                    .unwrap_or_else(|| "30".to_string())
                    .parse()
                    .map_err(|_| {
                        ConfigError::InvalidValue("VEND_DB_CONNECT_TIMEOUT_SECS".to_string())
                    })?,
            ),
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "VEND_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }

    /// `--db` wins over `VEND_DB_PATH`.
    pub fn with_db_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.db_path = path;
        }
        self
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.db_path)
            .max_connections(self.max_connections)
            .connect_timeout(self.connect_timeout)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
