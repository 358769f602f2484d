//! Mock executor for testing.

use std::collections::VecDeque;

use fxbot_core::{TradeRecord, TradeSource, TradingSignal};
use parking_lot::Mutex;

use crate::error::{ExecutionError, ExecutionResult};
use crate::executor::{BoxFuture, ExecutionReport, TradeExecutor};

/// Scripted behaviour for one `execute` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    Succeed,
    Fail(String),
    Panic(String),
}

/// Records executed signals; behaviour is scripted per call and defaults to
/// success once the script is exhausted.
#[derive(Debug, Default)]
pub struct MockExecutor {
    executions: Mutex<Vec<(TradingSignal, TradeSource)>>,
    script: Mutex<VecDeque<MockBehavior>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the behaviour of upcoming calls.
    pub fn push_behavior(&self, behavior: MockBehavior) {
        self.script.lock().push_back(behavior);
    }

    /// Get recorded executions (failed calls included, panics excluded).
    pub fn executions(&self) -> Vec<(TradingSignal, TradeSource)> {
        self.executions.lock().clone()
    }

    pub fn execution_count(&self) -> usize {
        self.executions.lock().len()
    }
}

impl TradeExecutor for MockExecutor {
    fn execute<'a>(
        &'a self,
        signal: &'a TradingSignal,
        source: TradeSource,
    ) -> BoxFuture<'a, ExecutionResult<ExecutionReport>> {
        Box::pin(async move {
            let behavior = self
                .script
                .lock()
                .pop_front()
                .unwrap_or(MockBehavior::Succeed);
            if let MockBehavior::Panic(msg) = &behavior {
                panic!("{msg}");
            }
            self.executions.lock().push((signal.clone(), source.clone()));
            match behavior {
                MockBehavior::Fail(msg) => Err(ExecutionError::Rejected(msg)),
                _ => Ok(ExecutionReport::new(
                    TradeRecord::from_signal(signal, source),
                    self.name(),
                )),
            }
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxbot_core::TradeAction;
    use rust_decimal_macros::dec;

    fn signal() -> TradingSignal {
        TradingSignal::new(TradeAction::Buy, "EURUSD", dec!(1.05), dec!(1.045), dec!(1.06)).unwrap()
    }

    #[tokio::test]
    async fn test_script_then_default_success() {
        let mock = MockExecutor::new();
        mock.push_behavior(MockBehavior::Fail("broker down".to_string()));

        let err = mock.execute(&signal(), TradeSource::Manual).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Rejected(ref m) if m == "broker down"));
        assert!(mock.execute(&signal(), TradeSource::Manual).await.is_ok());
        assert_eq!(mock.execution_count(), 2);
    }

    #[tokio::test]
    #[should_panic(expected = "boom")]
    async fn test_scripted_panic() {
        let mock = MockExecutor::new();
        mock.push_behavior(MockBehavior::Panic("boom".to_string()));
        let _ = mock.execute(&signal(), TradeSource::Manual).await;
    }
}
