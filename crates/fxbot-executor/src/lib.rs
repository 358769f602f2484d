//! Trade execution for validated signals.
//!
//! The dispatch pipeline hands every validated [`TradingSignal`] to a
//! [`TradeExecutor`]. Implementations:
//!
//! - [`PaperExecutor`]: journals the trade locally (`trades_YYYY-MM-DD.jsonl`)
//! - [`WebhookExecutor`]: forwards the signal as JSON to an HTTP endpoint,
//!   journaling accepted trades when a journal is attached
//! - [`MockExecutor`]: records calls, with scripted failures and panics
//!
//! [`TradingSignal`]: fxbot_core::TradingSignal

pub mod error;
pub mod executor;
pub mod mock;
pub mod paper;
pub mod webhook;

pub use error::{ExecutionError, ExecutionResult};
pub use executor::{BoxFuture, DynTradeExecutor, ExecutionReport, TradeExecutor};
pub use mock::{MockBehavior, MockExecutor};
pub use paper::PaperExecutor;
pub use webhook::{WebhookConfig, WebhookExecutor};
