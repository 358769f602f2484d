//! Trade executor trait.
//!
//! The dispatch pipeline and manual trades reach the execution venue only
//! through this trait, which allows:
//! - dependency injection of mocks in tests
//! - swapping the paper journal for a live endpoint by configuration

use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fxbot_core::{TradeRecord, TradeSource, TradingSignal};
use serde::{Deserialize, Serialize};

use crate::error::ExecutionResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Outcome of a successful execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// The trade as recorded.
    pub trade: TradeRecord,
    /// Name of the executor that handled it.
    pub venue: String,
    /// Venue-specific reference or response summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub executed_at: DateTime<Utc>,
}

impl ExecutionReport {
    pub fn new(trade: TradeRecord, venue: &str) -> Self {
        Self {
            trade,
            venue: venue.to_string(),
            reference: None,
            executed_at: Utc::now(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Execution collaborator for validated signals.
pub trait TradeExecutor: Send + Sync {
    /// Execute one signal.
    fn execute<'a>(
        &'a self,
        signal: &'a TradingSignal,
        source: TradeSource,
    ) -> BoxFuture<'a, ExecutionResult<ExecutionReport>>;

    /// Short name for logs and reports.
    fn name(&self) -> &'static str;
}

/// Arc wrapper for TradeExecutor trait objects.
pub type DynTradeExecutor = Arc<dyn TradeExecutor>;
