//! Inbound message as delivered by a transport.

use crate::channel::ChannelId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One inbound text message from a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub channel_id: ChannelId,
    pub text: String,
    pub received_at: DateTime<Utc>,
    /// Transport message id, if the transport provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
}

impl RawMessage {
    /// Create a message stamped with the current time.
    pub fn new(channel_id: ChannelId, text: impl Into<String>) -> Self {
        Self {
            channel_id,
            text: text.into(),
            received_at: Utc::now(),
            message_id: None,
        }
    }

    pub fn with_message_id(mut self, message_id: i64) -> Self {
        self.message_id = Some(message_id);
        self
    }

    /// Text truncated to at most `limit` characters. `0` means no limit.
    pub fn truncated_text(&self, limit: usize) -> &str {
        if limit == 0 {
            return &self.text;
        }
        match self.text.char_indices().nth(limit) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }
}
