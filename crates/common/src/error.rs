//! Error types for the community message store.

use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Caller Errors ===
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Reference violation: {0}")]
    ReferenceViolation(String),

    // === Store Errors ===
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    // === Everything Else ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the error code a caller can map to its own responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ReferenceViolation(_) => "REFERENCE_VIOLATION",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether the caller sent something this layer refuses.
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_) | Self::NotFound(_) | Self::ReferenceViolation(_)
        )
    }

    /// Logs the error at a level matching who is at fault.
    pub fn log(&self) {
        let code = self.error_code();
        if self.is_caller_error() {
            tracing::debug!(error = %self, code = code, "Caller error occurred");
        } else {
            tracing::error!(error = %self, code = code, "Store error occurred");
        }
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
