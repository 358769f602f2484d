//! Application configuration.

use crate::error::{AppError, AppResult};
use fxbot_api::ApiConfig;
use fxbot_core::{ChannelId, NewChannel};
use fxbot_executor::WebhookConfig;
use fxbot_listener::ListenerConfig;
use fxbot_telemetry::audit::DEFAULT_QUEUE_CAPACITY;
use fxbot_transport::TelegramConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Telegram Bot API configuration subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramSettings {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Usually supplied through `TELEGRAM_BOT_TOKEN` instead.
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    /// Maximum consecutive poll failures (0 = infinite).
    #[serde(default)]
    pub max_retry_attempts: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            bot_token: String::new(),
            poll_timeout_secs: default_poll_timeout_secs(),
            max_retry_attempts: 0,
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

impl From<TelegramSettings> for TelegramConfig {
    fn from(cfg: TelegramSettings) -> Self {
        Self {
            api_base: cfg.api_base,
            bot_token: cfg.bot_token,
            poll_timeout_secs: cfg.poll_timeout_secs,
            max_retry_attempts: cfg.max_retry_attempts,
            retry_base_delay_ms: cfg.retry_base_delay_ms,
            ..Default::default()
        }
    }
}

/// Audit log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Directory for `audit_YYYY-MM-DD.jsonl` files.
    #[serde(default = "default_audit_dir")]
    pub dir: PathBuf,
    /// Events kept for `GET /logs` before the oldest are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_audit_dir() -> PathBuf {
    PathBuf::from("./data/audit")
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            dir: default_audit_dir(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Channel table file.
    #[serde(default = "default_channels_path")]
    pub channels_path: PathBuf,
    /// Directory for `trades_YYYY-MM-DD.jsonl` files.
    #[serde(default = "default_trades_dir")]
    pub trades_dir: PathBuf,
}

fn default_channels_path() -> PathBuf {
    PathBuf::from("./data/channels.json")
}

fn default_trades_dir() -> PathBuf {
    PathBuf::from("./data/trades")
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            channels_path: default_channels_path(),
            trades_dir: default_trades_dir(),
        }
    }
}

/// Which executor receives validated signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// Journal trades locally only.
    #[default]
    Paper,
    /// Forward to `executor.webhook_url`, journaling accepted trades.
    Webhook,
}

/// Executor configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default)]
    pub kind: ExecutorKind,
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default)]
    pub webhook_timeout_ms: Option<u64>,
    #[serde(default)]
    pub webhook_authorization: Option<String>,
}

impl ExecutorConfig {
    pub fn webhook(&self) -> WebhookConfig {
        let defaults = WebhookConfig::default();
        WebhookConfig {
            url: self.webhook_url.clone(),
            timeout_ms: self.webhook_timeout_ms.unwrap_or(defaults.timeout_ms),
            authorization: self.webhook_authorization.clone(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter; `RUST_LOG` takes precedence.
    #[serde(default)]
    pub log_level: Option<String>,
}

/// Channel inserted at startup when missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedChannel {
    pub channel_id: ChannelId,
    #[serde(default)]
    pub name: String,
}

impl From<&SeedChannel> for NewChannel {
    fn from(seed: &SeedChannel) -> Self {
        let name = if seed.name.is_empty() {
            seed.channel_id.to_string()
        } else {
            seed.name.clone()
        };
        NewChannel {
            channel_id: seed.channel_id.clone(),
            name,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub telegram: TelegramSettings,
    #[serde(default)]
    pub listener: ListenerConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Seed channels.
    #[serde(default)]
    pub channels: Vec<SeedChannel>,
}

impl AppConfig {
    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Apply `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHANNEL_ID` from the environment.
    pub fn apply_env(&mut self) -> AppResult<()> {
        let token = std::env::var("TELEGRAM_BOT_TOKEN").ok();
        let channels = std::env::var("TELEGRAM_CHANNEL_ID").ok();
        self.apply_overrides(token.as_deref(), channels.as_deref())
    }

    /// Override the bot token and add comma separated seed channel ids.
    /// Ids already in the seed list are skipped.
    pub fn apply_overrides(
        &mut self,
        bot_token: Option<&str>,
        channel_ids: Option<&str>,
    ) -> AppResult<()> {
        if let Some(token) = bot_token.map(str::trim).filter(|t| !t.is_empty()) {
            self.telegram.bot_token = token.to_string();
        }

        for raw in channel_ids.into_iter().flat_map(|s| s.split(',')) {
            if raw.trim().is_empty() {
                continue;
            }
            let channel_id = ChannelId::new(raw)
                .map_err(|e| AppError::Config(format!("TELEGRAM_CHANNEL_ID: {e}")))?;
            if self.channels.iter().any(|c| c.channel_id == channel_id) {
                continue;
            }
            self.channels.push(SeedChannel {
                channel_id,
                name: String::new(),
            });
        }
        Ok(())
    }
}
