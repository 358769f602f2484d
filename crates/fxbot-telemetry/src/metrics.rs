//! Prometheus metrics for the signal relay.
//!
//! Covers:
//! - Inbound messages per channel
//! - Parsed signals and parse failures by reason
//! - Execution outcomes
//! - Listener lifecycle
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge, CounterVec, Encoder,
    HistogramVec, IntGauge, TextEncoder,
};

/// Total inbound messages.
pub static MESSAGES_RECEIVED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "fxbot_messages_received_total",
        "Total inbound channel messages",
        &["channel"]
    )
    .unwrap()
});

/// Total successfully parsed signals.
pub static SIGNALS_PARSED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "fxbot_signals_parsed_total",
        "Total messages parsed into trading signals",
        &["action", "pair"]
    )
    .unwrap()
});

/// Total parse failures.
/// Labels: reason (no_action/no_pair/missing_field/invalid_value/inconsistent_levels)
pub static PARSE_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "fxbot_parse_failures_total",
        "Total messages that did not yield a signal",
        &["reason"]
    )
    .unwrap()
});

/// Total executions.
/// Labels: outcome (executed/rejected/unavailable/journal/http/panicked), source (channel/manual)
pub static EXECUTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "fxbot_executions_total",
        "Total trade executions by outcome",
        &["outcome", "source"]
    )
    .unwrap()
});

/// Execution latency in milliseconds.
pub static EXECUTION_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "fxbot_execution_latency_ms",
        "Trade execution latency in milliseconds",
        &["venue"],
        vec![1.0, 5.0, 10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap()
});

/// Currently running listeners.
pub static ACTIVE_LISTENERS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("fxbot_active_listeners", "Currently running channel listeners").unwrap()
});

/// Listener terminations.
/// Labels: cause (stopped/aborted/subscribe_failed/stream_ended/transport_errors)
pub static LISTENER_TERMINATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "fxbot_listener_terminations_total",
        "Total listener terminations by cause",
        &["cause"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    pub fn message_received(channel: &str) {
        MESSAGES_RECEIVED_TOTAL.with_label_values(&[channel]).inc();
    }

    pub fn signal_parsed(action: &str, pair: &str) {
        SIGNALS_PARSED_TOTAL.with_label_values(&[action, pair]).inc();
    }

    pub fn parse_failure(reason: &str) {
        PARSE_FAILURES_TOTAL.with_label_values(&[reason]).inc();
    }

    pub fn execution(outcome: &str, source: &str) {
        EXECUTIONS_TOTAL.with_label_values(&[outcome, source]).inc();
    }

    pub fn execution_latency(venue: &str, latency_ms: f64) {
        EXECUTION_LATENCY_MS
            .with_label_values(&[venue])
            .observe(latency_ms);
    }

    pub fn active_listeners_set(count: usize) {
        ACTIVE_LISTENERS.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    pub fn listener_terminated(cause: &str) {
        LISTENER_TERMINATIONS_TOTAL.with_label_values(&[cause]).inc();
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn gather_text() -> TelemetryResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_show_up_in_text_output() {
        Metrics::message_received("-100");
        Metrics::parse_failure("no_action");
        Metrics::active_listeners_set(2);

        let text = Metrics::gather_text().unwrap();
        assert!(text.contains("fxbot_messages_received_total"));
        assert!(text.contains("reason=\"no_action\""));
        assert!(text.contains("fxbot_active_listeners"));
    }
}
