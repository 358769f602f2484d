//! Per-channel listener task.

use std::sync::Arc;

use futures_util::StreamExt;
use fxbot_core::ChannelId;
use fxbot_transport::DynChannelTransport;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;

/// Why a listener task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Termination {
    /// Cancellation token fired.
    Cancelled,
    SubscribeFailed(String),
    StreamEnded,
    TransportErrors(String),
}

impl Termination {
    pub(crate) fn cause(&self) -> &'static str {
        match self {
            Self::Cancelled => "stopped",
            Self::SubscribeFailed(_) => "subscribe_failed",
            Self::StreamEnded => "stream_ended",
            Self::TransportErrors(_) => "transport_errors",
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Cancelled => "listener stopped".to_string(),
            Self::SubscribeFailed(e) => format!("subscribe failed: {e}"),
            Self::StreamEnded => "message stream ended".to_string(),
            Self::TransportErrors(e) => format!("too many consecutive transport errors: {e}"),
        }
    }
}

pub(crate) struct Listener {
    pub channel_id: ChannelId,
    pub transport: DynChannelTransport,
    pub dispatcher: Arc<Dispatcher>,
    pub token: CancellationToken,
    pub max_consecutive_errors: u32,
}

impl Listener {
    /// Subscribe and dispatch messages until cancelled or the source fails.
    ///
    /// `on_subscribed` runs once the subscription is open. Dispatch of a
    /// received message runs outside the `select!`, so cancellation only
    /// takes effect between messages.
    pub(crate) async fn run(self, on_subscribed: impl FnOnce()) -> Termination {
        let channel = &self.channel_id;

        let subscribed = tokio::select! {
            biased;
            () = self.token.cancelled() => return Termination::Cancelled,
            result = self.transport.subscribe(channel) => result,
        };
        let mut stream = match subscribed {
            Ok(stream) => stream,
            Err(e) => return Termination::SubscribeFailed(e.to_string()),
        };
        on_subscribed();
        info!(channel = %channel, "Listener running");

        let mut consecutive_errors = 0u32;
        loop {
            let item = tokio::select! {
                biased;
                () = self.token.cancelled() => {
                    debug!(channel = %channel, "Listener cancelled");
                    return Termination::Cancelled;
                }
                item = stream.next() => item,
            };

            match item {
                Some(Ok(raw)) => {
                    consecutive_errors = 0;
                    let outcome = self.dispatcher.on_message(&raw).await;
                    debug!(channel = %channel, ?outcome, "Message dispatched");
                }
                Some(Err(e)) => {
                    consecutive_errors += 1;
                    warn!(channel = %channel, consecutive_errors, error = %e, "Transport error");
                    if self.max_consecutive_errors > 0
                        && consecutive_errors >= self.max_consecutive_errors
                    {
                        return Termination::TransportErrors(e.to_string());
                    }
                }
                None => return Termination::StreamEnded,
            }
        }
    }
}
