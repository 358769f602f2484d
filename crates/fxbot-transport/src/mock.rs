//! In-process transport for tests and dry runs.

use crate::error::{TransportError, TransportResult};
use crate::telegram::receiver_stream;
use crate::transport::{BoxFuture, ChannelTransport, MessageStream};
use fxbot_core::{ChannelId, RawMessage};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// Mock transport driven by the test.
///
/// Messages pushed with [`MockTransport::push`] are delivered to every open
/// stream of that channel.
#[derive(Debug)]
pub struct MockTransport {
    connected: AtomicBool,
    subscribers: Mutex<HashMap<ChannelId, Vec<mpsc::UnboundedSender<TransportResult<RawMessage>>>>>,
    failing: Mutex<HashSet<ChannelId>>,
    /// Recorded subscribe calls for verification.
    subscribe_calls: Mutex<Vec<ChannelId>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a new, connected mock transport.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            subscribers: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            subscribe_calls: Mutex::new(Vec::new()),
        }
    }

    /// Make subscribe calls for `channel_id` fail.
    pub fn fail_subscribe(&self, channel_id: &ChannelId) {
        self.failing.lock().insert(channel_id.clone());
    }

    /// Deliver a text message. Returns the number of streams reached.
    pub fn push(&self, channel_id: &ChannelId, text: &str) -> usize {
        let msg = RawMessage::new(channel_id.clone(), text);
        self.send(channel_id, || Ok(msg.clone()))
    }

    /// Deliver a transport error.
    pub fn push_error(&self, channel_id: &ChannelId, reason: &str) -> usize {
        self.send(channel_id, || Err(TransportError::Receive(reason.to_string())))
    }

    /// End every stream of a channel.
    pub fn close_channel(&self, channel_id: &ChannelId) {
        self.subscribers.lock().remove(channel_id);
    }

    /// Number of open streams for a channel.
    pub fn subscriber_count(&self, channel_id: &ChannelId) -> usize {
        self.subscribers
            .lock()
            .get(channel_id)
            .map_or(0, |subs| subs.iter().filter(|tx| !tx.is_closed()).count())
    }

    /// Wait until a channel has at least one open stream.
    pub async fn wait_for_subscriber(&self, channel_id: &ChannelId, timeout: Duration) -> bool {
        let wait = async {
            while self.subscriber_count(channel_id) == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }

    /// Get recorded subscribe calls.
    pub fn subscribe_calls(&self) -> Vec<ChannelId> {
        self.subscribe_calls.lock().clone()
    }

    fn send(
        &self,
        channel_id: &ChannelId,
        item: impl Fn() -> TransportResult<RawMessage>,
    ) -> usize {
        let mut subscribers = self.subscribers.lock();
        let Some(senders) = subscribers.get_mut(channel_id) else {
            return 0;
        };
        senders.retain(|tx| !tx.is_closed());
        senders
            .iter()
            .filter(|tx| tx.send(item()).is_ok())
            .count()
    }
}

impl ChannelTransport for MockTransport {
    fn connect(&self) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn disconnect(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.connected.store(false, Ordering::SeqCst);
            self.subscribers.lock().clear();
        })
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn subscribe<'a>(
        &'a self,
        channel_id: &'a ChannelId,
    ) -> BoxFuture<'a, TransportResult<MessageStream>> {
        Box::pin(async move {
            self.subscribe_calls.lock().push(channel_id.clone());
            if !self.is_connected() {
                return Err(TransportError::NotConnected);
            }
            if self.failing.lock().contains(channel_id) {
                return Err(TransportError::SubscribeFailed {
                    channel: channel_id.to_string(),
                    reason: "mock failure".to_string(),
                });
            }
            let (tx, rx) = mpsc::unbounded_channel();
            self.subscribers
                .lock()
                .entry(channel_id.clone())
                .or_default()
                .push(tx);
            Ok(receiver_stream(rx))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_push_reaches_subscriber() {
        let transport = MockTransport::new();
        let id = ChannelId::from_chat_id(-100);
        let mut stream = transport.subscribe(&id).await.unwrap();

        assert_eq!(transport.push(&id, "hello"), 1);
        let msg = stream.next().await.unwrap().unwrap();
        assert_eq!(msg.text, "hello");
        assert_eq!(msg.channel_id, id);

        assert_eq!(transport.push(&ChannelId::from_chat_id(-200), "nobody"), 0);
    }

    #[tokio::test]
    async fn test_close_ends_stream() {
        let transport = MockTransport::new();
        let id = ChannelId::from_chat_id(-100);
        let mut stream = transport.subscribe(&id).await.unwrap();
        transport.close_channel(&id);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_disconnect_ends_streams_and_blocks_subscribe() {
        let transport = MockTransport::new();
        let id = ChannelId::from_chat_id(-100);
        let mut stream = transport.subscribe(&id).await.unwrap();
        transport.disconnect().await;
        assert!(stream.next().await.is_none());
        assert!(matches!(
            transport.subscribe(&id).await,
            Err(TransportError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_fail_subscribe() {
        let transport = MockTransport::new();
        let id = ChannelId::from_chat_id(-100);
        transport.fail_subscribe(&id);
        assert!(transport.subscribe(&id).await.is_err());
        assert_eq!(transport.subscribe_calls(), vec![id]);
    }
}
