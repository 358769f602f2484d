//! Listener configuration.

use fxbot_parser::SignalParser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Listener and dispatch settings (`[listener]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// How long a stop waits for a listener before aborting it.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    /// Consecutive transport errors that terminate a listener (0 = never).
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,

    /// Maximum characters of message text kept in receipt audit entries
    /// (0 = full text).
    #[serde(default = "default_message_log_limit")]
    pub message_log_limit: usize,

    /// Start listeners for all persisted channels at startup.
    #[serde(default = "default_autostart")]
    pub autostart: bool,

    /// 3-letter codes recognised as pair halves on top of the defaults.
    #[serde(default)]
    pub extra_instruments: Vec<String>,
}

fn default_grace_period_ms() -> u64 {
    5000
}

fn default_max_consecutive_errors() -> u32 {
    5
}

fn default_message_log_limit() -> usize {
    200
}

fn default_autostart() -> bool {
    true
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: default_grace_period_ms(),
            max_consecutive_errors: default_max_consecutive_errors(),
            message_log_limit: default_message_log_limit(),
            autostart: default_autostart(),
            extra_instruments: Vec::new(),
        }
    }
}

impl ListenerConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// Default parser extended with `extra_instruments`.
    pub fn parser(&self) -> SignalParser {
        let mut parser = SignalParser::new();
        for code in &self.extra_instruments {
            parser.add_instrument(code);
        }
        parser
    }
}
