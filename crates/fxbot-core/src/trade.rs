//! Executed trade records.

use crate::channel::ChannelId;
use crate::signal::{TradeAction, TradingSignal};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Where a trade instruction came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "channel_id", rename_all = "snake_case")]
pub enum TradeSource {
    Channel(ChannelId),
    Manual,
}

impl fmt::Display for TradeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(id) => write!(f, "channel:{id}"),
            Self::Manual => f.write_str("manual"),
        }
    }
}

/// A trade as persisted in the trade journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,
    pub source: TradeSource,
    pub action: TradeAction,
    pub pair: String,
    pub price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub created_at: DateTime<Utc>,
}

impl TradeRecord {
    /// New record with a fresh id, stamped now.
    pub fn from_signal(signal: &TradingSignal, source: TradeSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            action: signal.action(),
            pair: signal.pair().to_string(),
            price: signal.price(),
            stop_loss: signal.stop_loss(),
            take_profit: signal.take_profit(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_record_from_signal() {
        let signal =
            TradingSignal::new(TradeAction::Buy, "EURUSD", dec!(1.05), dec!(1.045), dec!(1.06))
                .unwrap();
        let source = TradeSource::Channel(ChannelId::from_chat_id(-100));
        let rec = TradeRecord::from_signal(&signal, source.clone());
        assert_eq!(rec.source, source);
        assert_eq!(rec.pair, "EURUSD");
        assert_eq!(rec.take_profit, dec!(1.06));
    }

    #[test]
    fn test_source_serde() {
        let json = serde_json::to_value(TradeSource::Manual).unwrap();
        assert_eq!(json["type"], "manual");
        let json = serde_json::to_value(TradeSource::Channel(ChannelId::from_chat_id(-5))).unwrap();
        assert_eq!(json["type"], "channel");
        assert_eq!(json["channel_id"], "-5");
    }
}
