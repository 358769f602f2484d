//! Error types for fxbot-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid channel id: {0}")]
    InvalidChannelId(String),

    #[error("Invalid price level: {0}")]
    InvalidLevel(String),

    #[error("Inconsistent levels: {0}")]
    InconsistentLevels(String),

    #[error("Invalid pair: {0}")]
    InvalidPair(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
