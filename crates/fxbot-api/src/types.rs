//! Request and response bodies.

use fxbot_core::{ChannelId, CoreError, NewChannel};
use fxbot_executor::ExecutionReport;
use fxbot_listener::ListenerInfo;
use serde::{Deserialize, Serialize};

/// Plain acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `POST /channels/` body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelCreate {
    pub channel_id: String,
    pub name: String,
}

impl TryFrom<ChannelCreate> for NewChannel {
    type Error = CoreError;

    fn try_from(body: ChannelCreate) -> Result<Self, Self::Error> {
        Ok(NewChannel {
            channel_id: ChannelId::new(&body.channel_id)?,
            name: body.name.trim().to_string(),
        })
    }
}

/// `GET /channels/` query.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ManualTradeResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: ExecutionReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogsResponse {
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListenersResponse {
    pub running: usize,
    pub listeners: Vec<ListenerInfo>,
}
