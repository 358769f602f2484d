//! Audit events.

use crate::channel::ChannelId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    /// Bot or listener started/stopped.
    Lifecycle,
    /// Message receipt.
    Received,
    /// Parsed signal.
    Signal,
    /// Malformed signal attempt.
    ParseFailure,
    /// Execution result (success or failure).
    Execution,
    /// Transport or listener failure.
    Operational,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lifecycle => "lifecycle",
            Self::Received => "received",
            Self::Signal => "signal",
            Self::ParseFailure => "parse_failure",
            Self::Execution => "execution",
            Self::Operational => "operational",
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<ChannelId>,
    pub kind: AuditKind,
    pub message: String,
}

impl AuditEvent {
    pub fn new(kind: AuditKind, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            channel_id: None,
            kind,
            message: message.into(),
        }
    }

    /// Event scoped to a channel.
    pub fn for_channel(channel_id: &ChannelId, kind: AuditKind, message: impl Into<String>) -> Self {
        Self {
            channel_id: Some(channel_id.clone()),
            ..Self::new(kind, message)
        }
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = self.timestamp.format("%Y-%m-%d %H:%M:%S");
        match &self.channel_id {
            Some(ch) => write!(f, "{ts} [{}] [{ch}] {}", self.kind, self.message),
            None => write!(f, "{ts} [{}] {}", self.kind, self.message),
        }
    }
}
