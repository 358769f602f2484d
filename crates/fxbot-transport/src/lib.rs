//! Channel message transports.
//!
//! A transport delivers inbound channel messages as per-channel streams:
//! - [`ChannelTransport`]: object-safe transport trait consumed by listeners
//! - [`TelegramTransport`]: Telegram Bot API `getUpdates` long polling with
//!   exponential backoff and fan-out by chat id or `@username`
//! - [`MockTransport`]: in-process transport for tests and dry runs

pub mod error;
pub mod message;
pub mod mock;
pub mod telegram;
pub mod transport;

pub use error::{TransportError, TransportResult};
pub use mock::MockTransport;
pub use telegram::{TelegramConfig, TelegramTransport};
pub use transport::{BoxFuture, ChannelTransport, DynChannelTransport, MessageStream};
