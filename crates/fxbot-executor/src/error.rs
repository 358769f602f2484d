//! Executor error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Trade rejected: {0}")]
    Rejected(String),

    #[error("Execution venue unavailable: {0}")]
    Unavailable(String),

    #[error("Journal write failed: {0}")]
    Journal(#[from] fxbot_persistence::PersistenceError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Executor panicked: {0}")]
    Panicked(String),
}

impl ExecutionError {
    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "rejected",
            Self::Unavailable(_) => "unavailable",
            Self::Journal(_) => "journal",
            Self::Http(_) => "http",
            Self::Panicked(_) => "panicked",
        }
    }
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;
