//! Telegram Bot API transport.
//!
//! Runs one `getUpdates` long-poll loop per connection and fans received
//! channel posts out to the per-channel streams handed out by `subscribe`.
//! HTTP failures are retried with exponential backoff; when the retry limit
//! is reached every open stream receives the final error and then ends.

use crate::error::{TransportError, TransportResult};
use crate::message::{ApiResponse, BotUser, GetUpdatesRequest, Update};
use crate::transport::{BoxFuture, ChannelTransport, MessageStream};
use fxbot_core::{ChannelId, RawMessage};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Telegram transport configuration.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot API base URL.
    pub api_base: String,
    /// Bot token from BotFather.
    pub bot_token: String,
    /// Long-poll timeout passed to `getUpdates`.
    pub poll_timeout_secs: u64,
    /// Maximum consecutive poll failures (0 = infinite).
    pub max_retry_attempts: u32,
    /// Base delay for exponential backoff.
    pub retry_base_delay_ms: u64,
    /// Maximum delay for exponential backoff.
    pub retry_max_delay_ms: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            bot_token: String::new(),
            poll_timeout_secs: 30,
            max_retry_attempts: 0, // Infinite
            retry_base_delay_ms: 1000,
            retry_max_delay_ms: 60000,
        }
    }
}

/// Subscriber queues are unbounded: a listener that falls behind delays its
/// messages but never loses them.
type Subscribers = HashMap<ChannelId, Vec<mpsc::UnboundedSender<TransportResult<RawMessage>>>>;

/// State shared with the poll task.
struct Shared {
    config: TelegramConfig,
    client: reqwest::Client,
    subscribers: Mutex<Subscribers>,
}

/// Telegram Bot API transport.
pub struct TelegramTransport {
    shared: Arc<Shared>,
    /// Cancellation token and poll task of the current connection.
    session: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl TelegramTransport {
    pub fn new(config: TelegramConfig) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 10))
            .build()?;
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                client,
                subscribers: Mutex::new(HashMap::new()),
            }),
            session: Mutex::new(None),
        })
    }

    /// Number of open streams for a channel.
    pub fn subscriber_count(&self, channel_id: &ChannelId) -> usize {
        self.shared
            .subscribers
            .lock()
            .get(channel_id)
            .map_or(0, |subs| subs.iter().filter(|tx| !tx.is_closed()).count())
    }

    async fn connect_inner(&self) -> TransportResult<()> {
        if self.is_connected() {
            return Ok(());
        }
        if self.shared.config.bot_token.is_empty() {
            return Err(TransportError::ConnectionFailed(
                "bot token is not configured".to_string(),
            ));
        }

        let me: BotUser = self
            .shared
            .call("getMe", &serde_json::json!({}))
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        info!(bot_id = me.id, username = ?me.username, "Telegram bot authenticated");

        let mut session = self.session.lock();
        // a finished session (retries exhausted) is replaced
        if session
            .as_ref()
            .is_some_and(|(token, handle)| !token.is_cancelled() && !handle.is_finished())
        {
            return Ok(());
        }
        let token = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(self.shared.clone(), token.clone()));
        *session = Some((token, handle));
        Ok(())
    }

    async fn disconnect_inner(&self) {
        let session = self.session.lock().take();
        if let Some((token, handle)) = session {
            info!("Telegram transport disconnect requested");
            token.cancel();
            if let Err(e) = handle.await {
                warn!(?e, "Telegram poll task ended abnormally");
            }
        }
        self.shared.close_all();
    }
}

impl ChannelTransport for TelegramTransport {
    fn connect(&self) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(self.connect_inner())
    }

    fn disconnect(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.disconnect_inner())
    }

    fn is_connected(&self) -> bool {
        self.session
            .lock()
            .as_ref()
            .is_some_and(|(token, handle)| !token.is_cancelled() && !handle.is_finished())
    }

    fn subscribe<'a>(
        &'a self,
        channel_id: &'a ChannelId,
    ) -> BoxFuture<'a, TransportResult<MessageStream>> {
        Box::pin(async move {
            if !self.is_connected() {
                return Err(TransportError::NotConnected);
            }
            let (tx, rx) = mpsc::unbounded_channel();
            self.shared
                .subscribers
                .lock()
                .entry(channel_id.clone())
                .or_default()
                .push(tx);
            debug!(channel = %channel_id, "Subscribed to Telegram channel");
            Ok(receiver_stream(rx))
        })
    }
}

/// Adapt an mpsc receiver to a [`MessageStream`].
pub(crate) fn receiver_stream(
    rx: mpsc::UnboundedReceiver<TransportResult<RawMessage>>,
) -> MessageStream {
    Box::pin(futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    }))
}

impl Shared {
    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> TransportResult<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await?;
        let parsed: ApiResponse<T> = response.json().await?;
        match (parsed.ok, parsed.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(TransportError::Api {
                code: parsed.error_code.unwrap_or(0),
                description: parsed
                    .description
                    .unwrap_or_else(|| "missing result".to_string()),
            }),
        }
    }

    async fn get_updates(&self, offset: Option<i64>) -> TransportResult<Vec<Update>> {
        let request = GetUpdatesRequest::new(offset, self.config.poll_timeout_secs);
        self.call("getUpdates", &request).await
    }

    /// Deliver one update to every subscriber of its chat id or username.
    fn route(&self, update: &Update) {
        let Some(message) = update.message() else {
            return;
        };
        let mut subscribers = self.subscribers.lock();
        for key in message.channel_keys() {
            let Some(senders) = subscribers.get_mut(&key) else {
                continue;
            };
            let Some(raw) = message.to_raw(key.clone()) else {
                debug!(channel = %key, update_id = update.update_id, "Update without text");
                continue;
            };
            // a send only fails once the stream is gone
            senders.retain(|tx| tx.send(Ok(raw.clone())).is_ok());
        }
        subscribers.retain(|_, senders| !senders.is_empty());
    }

    /// Send a terminal error to every subscriber and end their streams.
    fn fail_all(&self, reason: &str) {
        let drained: Vec<_> = self.subscribers.lock().drain().collect();
        for (_, senders) in drained {
            for tx in senders {
                let _ = tx.send(Err(TransportError::Receive(reason.to_string())));
            }
        }
    }

    fn close_all(&self) {
        self.subscribers.lock().clear();
    }

    fn calculate_backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.config.retry_base_delay_ms;
        let max = self.config.retry_max_delay_ms;

        // base * 2^(attempt-1), capped
        let exponent = attempt.saturating_sub(1).min(10);
        let delay = base.saturating_mul(1u64 << exponent).min(max);

        Duration::from_millis(delay + rand_jitter(base))
    }
}

async fn poll_loop(shared: Arc<Shared>, token: CancellationToken) {
    let mut offset: Option<i64> = None;
    let mut attempt = 0u32;
    info!("Telegram poll loop started");

    loop {
        let result = tokio::select! {
            () = token.cancelled() => {
                info!("Shutdown requested, exiting poll loop");
                break;
            }
            result = shared.get_updates(offset) => result,
        };

        match result {
            Ok(updates) => {
                if attempt > 0 {
                    info!(attempt, "Telegram polling recovered");
                }
                attempt = 0;
                for update in &updates {
                    offset = Some(update.update_id + 1);
                    shared.route(update);
                }
            }
            Err(e) => {
                attempt += 1;
                if shared.config.max_retry_attempts > 0
                    && attempt >= shared.config.max_retry_attempts
                {
                    error!(attempt, error = %e, "Max poll retry attempts reached");
                    shared.fail_all(&e.to_string());
                    break;
                }

                let delay = shared.calculate_backoff_delay(attempt);
                warn!(attempt, error = %e, delay_ms = delay.as_millis(), "Poll failed, retrying");

                tokio::select! {
                    () = tokio::time::sleep(delay) => {}
                    () = token.cancelled() => {
                        info!("Shutdown requested during backoff, exiting");
                        break;
                    }
                }
            }
        }
    }

    shared.close_all();
}

/// Random jitter in `0..bound` ms (at most 1000ms).
fn rand_jitter(bound: u64) -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let bound = bound.clamp(1, 1000);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    u64::from(nanos) % bound
}
