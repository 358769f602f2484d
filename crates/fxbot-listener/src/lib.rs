//! Channel listeners and the signal dispatch pipeline.
//!
//! # Key Components
//!
//! - [`ListenerRegistry`]: at most one listener task per channel id, with
//!   cooperative cancellation and a bounded grace period
//! - [`Dispatcher`]: parser output to trade executor, with auditing and
//!   per-message failure isolation
//! - [`BotService`]: the operations exposed to the API (start/stop, manual
//!   trades, logs, channel CRUD)
//!
//! # Listener lifecycle
//!
//! `Starting -> Running` once the transport subscription is open,
//! `-> Cancelling` on a stop request, `-> Stopped` when the task has ended.
//! A listener that fails on its own removes itself from the registry.

pub mod config;
pub mod dispatch;
pub mod error;
mod listener;
pub mod registry;
pub mod service;

pub use config::ListenerConfig;
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use error::{RegistryConflict, ServiceError, ServiceResult};
pub use registry::{ListenerInfo, ListenerRegistry, ListenerState};
pub use service::BotService;
