//! Core domain types for the Telegram signal relay.
//!
//! This crate provides the types shared by every other crate:
//! - `ChannelId`, `Channel`: external source identifiers and their persisted rows
//! - `RawMessage`: an inbound channel message
//! - `TradingSignal`, `TradeAction`: validated trading instructions
//! - `AuditEvent`: entries of the append-only audit log
//! - `TradeRecord`: journal entry for an executed trade
//! - `instruments`: default currency, metal and crypto codes

pub mod audit;
pub mod channel;
pub mod error;
pub mod instruments;
pub mod message;
pub mod signal;
pub mod trade;

pub use audit::{AuditEvent, AuditKind};
pub use channel::{Channel, ChannelId, NewChannel};
pub use error::{CoreError, Result};
pub use message::RawMessage;
pub use signal::{TradeAction, TradingSignal};
pub use trade::{TradeRecord, TradeSource};
