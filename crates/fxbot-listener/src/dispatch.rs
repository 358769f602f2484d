//! Dispatch pipeline.
//!
//! `on_message` runs one message through:
//! 1. receipt audit (text truncated to `message_log_limit`)
//! 2. the signal parser
//! 3. on success: signal audit, execution, execution audit
//! 4. on failure: a `ParseFailure` audit entry for malformed attempts,
//!    debug tracing only for ordinary chatter
//!
//! Executor errors and panics are contained here and never reach the
//! listener.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use fxbot_core::{AuditEvent, AuditKind, RawMessage, TradeSource, TradingSignal};
use fxbot_executor::{DynTradeExecutor, ExecutionError, ExecutionReport, ExecutionResult};
use fxbot_parser::{ParseFailure, SignalParser};
use fxbot_telemetry::{AuditLog, Metrics};
use tracing::{debug, info, warn};

/// Result of dispatching one message.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Ordinary text, not a signal.
    NotASignal,
    /// Looked like a signal but could not be parsed.
    Malformed(ParseFailure),
    Executed(ExecutionReport),
    /// Parsed, but the executor failed or panicked.
    ExecutionFailed(String),
}

pub struct Dispatcher {
    parser: SignalParser,
    executor: DynTradeExecutor,
    audit: Arc<AuditLog>,
    message_log_limit: usize,
}

impl Dispatcher {
    pub fn new(executor: DynTradeExecutor, audit: Arc<AuditLog>, message_log_limit: usize) -> Self {
        Self {
            parser: SignalParser::new(),
            executor,
            audit,
            message_log_limit,
        }
    }

    /// Use a custom parser (e.g. with extra instrument codes).
    pub fn with_parser(mut self, parser: SignalParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    pub async fn on_message(&self, raw: &RawMessage) -> DispatchOutcome {
        let channel = &raw.channel_id;
        Metrics::message_received(channel.as_str());
        self.audit.channel(
            channel,
            AuditKind::Received,
            format!("Received: {}", raw.truncated_text(self.message_log_limit)),
        );

        let signal = match self.parser.parse(&raw.text) {
            Ok(signal) => signal,
            Err(failure) => {
                Metrics::parse_failure(failure.reason());
                if failure.is_attempt() {
                    self.audit.channel(
                        channel,
                        AuditKind::ParseFailure,
                        format!("Malformed signal: {failure}"),
                    );
                    return DispatchOutcome::Malformed(failure);
                }
                debug!(channel = %channel, reason = failure.reason(), "Message is not a signal");
                return DispatchOutcome::NotASignal;
            }
        };

        Metrics::signal_parsed(signal.action().as_str(), signal.pair());
        self.audit
            .channel(channel, AuditKind::Signal, format!("Signal: {signal}"));

        match self
            .execute(&signal, TradeSource::Channel(channel.clone()))
            .await
        {
            Ok(report) => DispatchOutcome::Executed(report),
            Err(e) => DispatchOutcome::ExecutionFailed(e.to_string()),
        }
    }

    /// Execute a signal, auditing the outcome. Panics in the executor are
    /// caught and reported as [`ExecutionError::Panicked`].
    pub async fn execute(
        &self,
        signal: &TradingSignal,
        source: TradeSource,
    ) -> ExecutionResult<ExecutionReport> {
        let source_label = match &source {
            TradeSource::Channel(_) => "channel",
            TradeSource::Manual => "manual",
        };
        let channel = match &source {
            TradeSource::Channel(id) => Some(id.clone()),
            TradeSource::Manual => None,
        };

        let started = Instant::now();
        let result = AssertUnwindSafe(self.executor.execute(signal, source.clone()))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(ExecutionError::Panicked(panic_message(payload.as_ref()))));
        Metrics::execution_latency(self.executor.name(), started.elapsed().as_secs_f64() * 1000.0);

        let (outcome, message) = match &result {
            Ok(report) => {
                info!(
                    source = %source,
                    trade_id = %report.trade.id,
                    venue = %report.venue,
                    signal = %signal,
                    "Trade executed"
                );
                ("executed", format!("Executed {signal} (trade {})", report.trade.id))
            }
            Err(e) => {
                warn!(source = %source, signal = %signal, error = %e, "Trade execution failed");
                (e.kind(), format!("Execution failed for {signal}: {e}"))
            }
        };
        Metrics::execution(outcome, source_label);

        let event = match channel {
            Some(id) => AuditEvent::for_channel(&id, AuditKind::Execution, message),
            None => AuditEvent::new(AuditKind::Execution, message),
        };
        self.audit.record(event);

        result
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxbot_core::ChannelId;
    use fxbot_executor::{MockBehavior, MockExecutor};
    use rust_decimal_macros::dec;

    fn setup(limit: usize) -> (Dispatcher, Arc<MockExecutor>, Arc<AuditLog>) {
        let executor = Arc::new(MockExecutor::new());
        let audit = Arc::new(AuditLog::in_memory(100));
        let dispatcher = Dispatcher::new(executor.clone(), audit.clone(), limit);
        (dispatcher, executor, audit)
    }

    fn msg(text: &str) -> RawMessage {
        RawMessage::new(ChannelId::from_chat_id(-100), text)
    }

    #[tokio::test]
    async fn test_signal_is_executed_once() {
        let (dispatcher, executor, audit) = setup(0);
        let outcome = dispatcher
            .on_message(&msg("BUY EURUSD @ 1.0500 SL 1.0450 TP 1.0600"))
            .await;
        assert!(matches!(outcome, DispatchOutcome::Executed(_)));

        let executions = executor.executions();
        assert_eq!(executions.len(), 1);
        let (signal, source) = &executions[0];
        assert_eq!(signal.price(), dec!(1.05));
        assert_eq!(signal.stop_loss(), dec!(1.045));
        assert_eq!(signal.take_profit(), dec!(1.06));
        assert_eq!(source, &TradeSource::Channel(ChannelId::from_chat_id(-100)));

        let kinds: Vec<_> = audit.drain().into_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![AuditKind::Received, AuditKind::Signal, AuditKind::Execution]
        );
    }

    #[tokio::test]
    async fn test_chatter_only_audits_receipt() {
        let (dispatcher, executor, audit) = setup(0);
        let outcome = dispatcher.on_message(&msg("Good morning traders!")).await;
        assert!(matches!(outcome, DispatchOutcome::NotASignal));
        assert_eq!(executor.execution_count(), 0);

        let events = audit.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AuditKind::Received);
        assert!(events[0].message.contains("Good morning traders!"));
    }

    #[tokio::test]
    async fn test_malformed_attempt_is_audited() {
        let (dispatcher, executor, audit) = setup(0);
        let outcome = dispatcher
            .on_message(&msg("BUY EURUSD @ 1.0500 SL 1.0600 TP 1.0450"))
            .await;
        assert!(matches!(
            outcome,
            DispatchOutcome::Malformed(ParseFailure::InconsistentLevels(_))
        ));
        assert_eq!(executor.execution_count(), 0);
        let events = audit.drain();
        assert_eq!(events.last().unwrap().kind, AuditKind::ParseFailure);
    }

    #[tokio::test]
    async fn test_receipt_truncated() {
        let (dispatcher, _executor, audit) = setup(5);
        dispatcher.on_message(&msg("Good morning traders!")).await;
        let events = audit.drain();
        assert_eq!(events[0].message, "Received: Good ");
    }

    #[tokio::test]
    async fn test_executor_failure_contained() {
        let (dispatcher, executor, audit) = setup(0);
        executor.push_behavior(MockBehavior::Fail("broker offline".to_string()));
        let outcome = dispatcher
            .on_message(&msg("SELL GBPUSD @ 1.25 SL 1.26 TP 1.24"))
            .await;
        match outcome {
            DispatchOutcome::ExecutionFailed(msg) => assert!(msg.contains("broker offline")),
            other => panic!("unexpected outcome {other:?}"),
        }
        let last = audit.drain().pop().unwrap();
        assert_eq!(last.kind, AuditKind::Execution);
        assert!(last.message.contains("Execution failed"));
    }

    #[tokio::test]
    async fn test_executor_panic_contained() {
        let (dispatcher, executor, _audit) = setup(0);
        executor.push_behavior(MockBehavior::Panic("executor bug".to_string()));
        let outcome = dispatcher
            .on_message(&msg("SELL GBPUSD @ 1.25 SL 1.26 TP 1.24"))
            .await;
        match outcome {
            DispatchOutcome::ExecutionFailed(msg) => assert!(msg.contains("executor bug"), "{msg}"),
            other => panic!("unexpected outcome {other:?}"),
        }

        // next message still processed
        let outcome = dispatcher
            .on_message(&msg("SELL GBPUSD @ 1.25 SL 1.26 TP 1.24"))
            .await;
        assert!(matches!(outcome, DispatchOutcome::Executed(_)));
    }

    #[tokio::test]
    async fn test_manual_execution_has_no_channel() {
        let (dispatcher, _executor, audit) = setup(0);
        let signal =
            TradingSignal::new(fxbot_core::TradeAction::Buy, "EURUSD", dec!(1.05), dec!(1.04), dec!(1.06))
                .unwrap();
        let report = dispatcher.execute(&signal, TradeSource::Manual).await.unwrap();
        assert_eq!(report.trade.source, TradeSource::Manual);
        let events = audit.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].channel_id, None);
    }
}
