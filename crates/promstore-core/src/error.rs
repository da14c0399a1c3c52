//! Shared error type across promstore crates.

use thiserror::Error;

/// Stable error codes (used in HTTP responses and logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed update payload, key, or persisted document.
    InvalidMetricData,
    /// State file could not be read or written.
    Persistence,
    /// Invalid exporter configuration.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidMetricData => "INVALID_METRIC_DATA",
            ErrorCode::Persistence => "PERSISTENCE",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid metric data: {0}")]
    InvalidMetricData(String),
    #[error("persistence: {0}")]
    Persistence(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl StoreError {
    /// Map an error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            StoreError::InvalidMetricData(_) => ErrorCode::InvalidMetricData,
            StoreError::Persistence(_) => ErrorCode::Persistence,
            StoreError::BadConfig(_) => ErrorCode::BadConfig,
            StoreError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            StoreError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        StoreError::InvalidMetricData(msg.into())
    }
}
