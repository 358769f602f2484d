//! Transport error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Transport not connected")]
    NotConnected,

    #[error("Subscribe failed for {channel}: {reason}")]
    SubscribeFailed { channel: String, reason: String },

    #[error("Bot API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("Receive failed: {0}")]
    Receive(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;
