//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::error::{AppError, AppResult};

/// Build the filter, preferring `RUST_LOG` over the configured directives.
pub fn env_filter(config: &LoggingConfig) -> AppResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| AppError::Config(format!("invalid logging.filter: {e}"))),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &LoggingConfig) -> AppResult<()> {
    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter(config)?)
        .try_init()
        .map_err(|e| AppError::Internal(e.to_string()))
}
