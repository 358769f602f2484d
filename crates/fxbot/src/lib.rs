//! Telegram trading-signal relay.
//!
//! Wires the collaborators together and runs them:
//! - Telegram Bot API transport feeding one listener per channel
//! - Signal parsing and dispatch to the configured executor
//! - JSON channel store and trade journal
//! - REST API and Prometheus metrics

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
