//! Listener and service error types.

use fxbot_core::ChannelId;
use fxbot_executor::ExecutionError;
use fxbot_persistence::PersistenceError;
use fxbot_transport::TransportError;
use thiserror::Error;

/// Benign registry conflicts. Returned to the caller, never logged as errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryConflict {
    #[error("Listener already running for {0}")]
    AlreadyRunning(ChannelId),

    #[error("No listener running for {0}")]
    NotRunning(ChannelId),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Channel not found: {0}")]
    ChannelNotFound(u64),

    #[error("Channel already registered: {0}")]
    DuplicateChannel(String),

    #[error(transparent)]
    Conflict(#[from] RegistryConflict),

    #[error("Execution failed: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Persistence error: {0}")]
    Persistence(PersistenceError),
}

impl From<PersistenceError> for ServiceError {
    fn from(e: PersistenceError) -> Self {
        match e {
            PersistenceError::DuplicateChannel(id) => Self::DuplicateChannel(id),
            PersistenceError::NotFound(id) => Self::ChannelNotFound(id),
            other => Self::Persistence(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
