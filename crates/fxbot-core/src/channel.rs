//! Channel identification and persisted channel rows.

use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// External identifier of a message source.
///
/// Telegram channels are addressed either by numeric chat id
/// (e.g. "-1001234567890") or by public username (e.g. "@fx_signals").
/// The registry keys listeners by this value, never by the persisted row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    /// Create a channel id, trimming surrounding whitespace and quotes.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let trimmed = raw
            .as_ref()
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
            .trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidChannelId(raw.as_ref().to_string()));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidChannelId(raw.as_ref().to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Create from a numeric Telegram chat id.
    pub fn from_chat_id(chat_id: i64) -> Self {
        Self(chat_id.to_string())
    }

    /// Returns the numeric chat id if this id is numeric.
    pub fn as_chat_id(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    /// Returns true for "@username" style ids.
    pub fn is_username(&self) -> bool {
        self.0.starts_with('@')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ChannelId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ChannelId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ChannelId> for String {
    fn from(id: ChannelId) -> Self {
        id.0
    }
}

/// Request to register a new channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChannel {
    pub channel_id: ChannelId,
    pub name: String,
}

/// A persisted channel row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Surrogate key assigned by the store.
    pub id: u64,
    /// External source identifier (unique across rows).
    pub channel_id: ChannelId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
