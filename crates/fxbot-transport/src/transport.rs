//! Transport trait.

use crate::error::TransportResult;
use fxbot_core::{ChannelId, RawMessage};
use futures_util::Stream;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Messages of one channel. Disconnection surfaces as the end of the stream.
pub type MessageStream = Pin<Box<dyn Stream<Item = TransportResult<RawMessage>> + Send>>;

/// Source of channel messages.
pub trait ChannelTransport: Send + Sync {
    /// Establish the session. Calling it while connected is a no-op.
    fn connect(&self) -> BoxFuture<'_, TransportResult<()>>;

    /// Tear down the session; every open stream ends.
    fn disconnect(&self) -> BoxFuture<'_, ()>;

    fn is_connected(&self) -> bool;

    /// Open a message stream for one channel.
    fn subscribe<'a>(&'a self, channel_id: &'a ChannelId)
        -> BoxFuture<'a, TransportResult<MessageStream>>;
}

/// Arc wrapper for ChannelTransport trait objects.
pub type DynChannelTransport = Arc<dyn ChannelTransport>;
