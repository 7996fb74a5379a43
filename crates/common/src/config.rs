//! Application configuration.

use serde::Deserialize;
use std::path::Path;

use crate::error::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Pagination defaults for list reads.
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a new connection or a pool slot.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Seconds an idle pooled connection is kept.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Log every SQL statement at debug level.
    #[serde(default = "default_true")]
    pub sql_logging: bool,
}

/// Page size limits for message and report listings.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct PaginationConfig {
    /// Page size used when the caller does not pass one.
    #[serde(default = "default_page_limit")]
    pub default_limit: u64,
    /// Largest page size a caller may request.
    #[serde(default = "default_max_page_limit")]
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
            max_limit: default_max_page_limit(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

const fn default_idle_timeout_secs() -> u64 {
    600
}

const fn default_true() -> bool {
    true
}

const fn default_page_limit() -> u64 {
    20
}

const fn default_max_page_limit() -> u64 {
    100
}

fn default_log_filter() -> String {
    "community=info,sea_orm=warn".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `COMMUNITY_ENV`)
    /// 3. Environment variables with `COMMUNITY_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("COMMUNITY_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("COMMUNITY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("COMMUNITY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reject settings that cannot work together.
    pub fn validate(&self) -> AppResult<()> {
        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::Config(format!(
                "database.min_connections ({}) exceeds database.max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }

        let pagination = &self.pagination;
        if pagination.max_limit == 0 {
            return Err(AppError::Config(
                "pagination.max_limit must be at least 1".to_string(),
            ));
        }
        if pagination.default_limit == 0 || pagination.default_limit > pagination.max_limit {
            return Err(AppError::Config(format!(
                "pagination.default_limit must be between 1 and {}",
                pagination.max_limit
            )));
        }

        Ok(())
    }
}
