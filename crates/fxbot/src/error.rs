//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] fxbot_transport::TransportError),

    #[error("Executor error: {0}")]
    Executor(#[from] fxbot_executor::ExecutionError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] fxbot_telemetry::TelemetryError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] fxbot_persistence::PersistenceError),

    #[error("Service error: {0}")]
    Service(#[from] fxbot_listener::ServiceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
