//! Telegram Bot API wire types.
//!
//! Only the fields the transport reads are modelled; unknown fields are
//! ignored by serde.

use chrono::{DateTime, Utc};
use fxbot_core::{ChannelId, RawMessage};
use serde::{Deserialize, Serialize};

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

/// `getUpdates` request body.
#[derive(Debug, Clone, Serialize)]
pub struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: Vec<&'static str>,
}

impl GetUpdatesRequest {
    pub fn new(offset: Option<i64>, timeout: u64) -> Self {
        Self {
            offset,
            timeout,
            allowed_updates: vec!["message", "channel_post"],
        }
    }
}

/// One update from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub channel_post: Option<Message>,
}

impl Update {
    /// The carried message, preferring channel posts.
    pub fn message(&self) -> Option<&Message> {
        self.channel_post.as_ref().or(self.message.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    /// Unix seconds.
    pub date: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

impl Message {
    /// Text body, falling back to a media caption.
    pub fn body(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }

    /// Channel ids this message can be addressed by.
    pub fn channel_keys(&self) -> Vec<ChannelId> {
        let mut keys = vec![ChannelId::from_chat_id(self.chat.id)];
        if let Some(username) = &self.chat.username {
            if let Ok(id) = ChannelId::new(format!("@{username}")) {
                keys.push(id);
            }
        }
        keys
    }

    /// Convert to a [`RawMessage`] addressed to `channel_id`.
    pub fn to_raw(&self, channel_id: ChannelId) -> Option<RawMessage> {
        let text = self.body()?;
        let received_at = DateTime::<Utc>::from_timestamp(self.date, 0).unwrap_or_else(Utc::now);
        Some(RawMessage {
            channel_id,
            text: text.to_string(),
            received_at,
            message_id: Some(self.message_id),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// `getMe` result.
#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel_post_update() {
        let json = r#"{
            "ok": true,
            "result": [{
                "update_id": 10,
                "channel_post": {
                    "message_id": 5,
                    "date": 1700000000,
                    "chat": {"id": -1001234567890, "type": "channel", "username": "fx_signals", "title": "FX"},
                    "text": "BUY EURUSD @ 1.05 SL 1.04 TP 1.06"
                }
            }]
        }"#;
        let resp: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        assert!(resp.ok);
        let updates = resp.result.unwrap();
        let msg = updates[0].message().unwrap();
        assert_eq!(msg.body(), Some("BUY EURUSD @ 1.05 SL 1.04 TP 1.06"));

        let keys = msg.channel_keys();
        assert_eq!(keys[0].as_str(), "-1001234567890");
        assert_eq!(keys[1].as_str(), "@fx_signals");

        let raw = msg.to_raw(keys[1].clone()).unwrap();
        assert_eq!(raw.channel_id.as_str(), "@fx_signals");
        assert_eq!(raw.message_id, Some(5));
        assert_eq!(raw.received_at.timestamp(), 1700000000);
    }

    #[test]
    fn test_caption_fallback_and_media_without_text() {
        let json = r#"{"update_id": 1, "message": {"message_id": 1, "date": 0,
            "chat": {"id": 42}, "caption": "SELL GBPUSD"}}"#;
        let update: Update = serde_json::from_str(json).unwrap();
        assert_eq!(update.message().unwrap().body(), Some("SELL GBPUSD"));

        let json = r#"{"update_id": 2, "message": {"message_id": 2, "date": 0, "chat": {"id": 42}}}"#;
        let update: Update = serde_json::from_str(json).unwrap();
        let msg = update.message().unwrap();
        assert!(msg.to_raw(ChannelId::from_chat_id(42)).is_none());
    }

    #[test]
    fn test_error_response() {
        let json = r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#;
        let resp: ApiResponse<BotUser> = serde_json::from_str(json).unwrap();
        assert!(!resp.ok);
        assert!(resp.result.is_none());
        assert_eq!(resp.error_code, Some(401));
    }
}
