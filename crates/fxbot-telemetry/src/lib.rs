//! Observability for the signal relay.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus metrics for messages, signals, executions and listeners
//! - The audit log: a durable JSON Lines record plus a drainable queue

pub mod audit;
pub mod error;
pub mod logging;
pub mod metrics;

pub use audit::AuditLog;
pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
