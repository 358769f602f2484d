//! Validated trading signal.
//!
//! A [`TradingSignal`] can only be obtained through [`TradingSignal::new`],
//! which enforces positive levels and the stop/target ordering for the
//! action. Deserialization goes through the same check.

use crate::error::{CoreError, Result};
use crate::instruments;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trade direction or instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Close,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Close => "CLOSE",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" | "LONG" => Ok(Self::Buy),
            "SELL" | "SHORT" => Ok(Self::Sell),
            "CLOSE" | "EXIT" => Ok(Self::Close),
            _ => Err(CoreError::UnknownAction(s.to_string())),
        }
    }
}

/// Unvalidated signal fields, used as the serde intermediate.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SignalFields {
    action: TradeAction,
    pair: String,
    price: Decimal,
    stop_loss: Decimal,
    take_profit: Decimal,
}

/// A validated trading instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SignalFields")]
pub struct TradingSignal {
    action: TradeAction,
    pair: String,
    price: Decimal,
    stop_loss: Decimal,
    take_profit: Decimal,
}

impl TradingSignal {
    /// Build a signal, checking pair format, level positivity and ordering.
    ///
    /// BUY requires `stop_loss < price < take_profit`, SELL requires
    /// `take_profit < price < stop_loss`. CLOSE only requires positive levels.
    pub fn new(
        action: TradeAction,
        pair: impl AsRef<str>,
        price: Decimal,
        stop_loss: Decimal,
        take_profit: Decimal,
    ) -> Result<Self> {
        let pair = normalize_pair(pair.as_ref())?;

        for (name, value) in [
            ("price", price),
            ("stop_loss", stop_loss),
            ("take_profit", take_profit),
        ] {
            if value <= Decimal::ZERO {
                return Err(CoreError::InvalidLevel(format!("{name} must be positive, got {value}")));
            }
        }

        let ordered = match action {
            TradeAction::Buy => stop_loss < price && price < take_profit,
            TradeAction::Sell => take_profit < price && price < stop_loss,
            TradeAction::Close => true,
        };
        if !ordered {
            return Err(CoreError::InconsistentLevels(format!(
                "{action} {pair}: price {price}, stop loss {stop_loss}, take profit {take_profit}"
            )));
        }

        Ok(Self {
            action,
            pair,
            price: price.normalize(),
            stop_loss: stop_loss.normalize(),
            take_profit: take_profit.normalize(),
        })
    }

    pub fn action(&self) -> TradeAction {
        self.action
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn stop_loss(&self) -> Decimal {
        self.stop_loss
    }

    pub fn take_profit(&self) -> Decimal {
        self.take_profit
    }
}

impl TryFrom<SignalFields> for TradingSignal {
    type Error = CoreError;

    fn try_from(f: SignalFields) -> Result<Self> {
        Self::new(f.action, f.pair, f.price, f.stop_loss, f.take_profit)
    }
}

/// Canonical form, which parses back to an equal signal.
///
/// A 6-letter pair made of default codes is written joined (`EURUSD`); any
/// other 3+3 letter pair keeps the slash (`ABC/DEF`) so the pair is still
/// recognised without an instrument table.
impl fmt::Display for TradingSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.action)?;
        match split_pair(&self.pair) {
            Some((base, quote))
                if !(instruments::is_default_code(base) && instruments::is_default_code(quote)) =>
            {
                write!(f, "{base}/{quote}")?
            }
            _ => f.write_str(&self.pair)?,
        }
        write!(
            f,
            " @ {} SL {} TP {}",
            self.price, self.stop_loss, self.take_profit
        )
    }
}

/// Base and quote halves of an alphabetic 6-character pair.
fn split_pair(pair: &str) -> Option<(&str, &str)> {
    (pair.len() == 6 && pair.chars().all(|c| c.is_ascii_alphabetic())).then(|| pair.split_at(3))
}

/// Upper-case a pair and drop a single `/` separator ("eur/usd" -> "EURUSD").
fn normalize_pair(raw: &str) -> Result<String> {
    let pair: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '/')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if pair.len() < 6 || pair.len() > 12 || !pair.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CoreError::InvalidPair(raw.to_string()));
    }
    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_buy_ordering() {
        let s = TradingSignal::new(TradeAction::Buy, "EURUSD", dec!(1.05), dec!(1.045), dec!(1.06));
        assert!(s.is_ok());

        let err = TradingSignal::new(TradeAction::Buy, "EURUSD", dec!(1.05), dec!(1.06), dec!(1.045))
            .unwrap_err();
        assert!(matches!(err, CoreError::InconsistentLevels(_)));
    }

    #[test]
    fn test_sell_ordering() {
        let s = TradingSignal::new(TradeAction::Sell, "GBPUSD", dec!(1.25), dec!(1.26), dec!(1.24));
        assert!(s.is_ok());

        let err = TradingSignal::new(TradeAction::Sell, "GBPUSD", dec!(1.25), dec!(1.24), dec!(1.26))
            .unwrap_err();
        assert!(matches!(err, CoreError::InconsistentLevels(_)));
    }

    #[test]
    fn test_non_positive_levels_rejected() {
        let err = TradingSignal::new(TradeAction::Close, "EURUSD", dec!(0), dec!(1), dec!(1))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidLevel(_)));
        let err = TradingSignal::new(TradeAction::Buy, "EURUSD", dec!(1.05), dec!(-1), dec!(1.06))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidLevel(_)));
    }

    #[test]
    fn test_pair_normalized() {
        let s = TradingSignal::new(TradeAction::Buy, "eur/usd", dec!(1.05), dec!(1.04), dec!(1.06))
            .unwrap();
        assert_eq!(s.pair(), "EURUSD");
        assert!(TradingSignal::new(TradeAction::Buy, "EU", dec!(1), dec!(0.5), dec!(2)).is_err());
    }

    #[test]
    fn test_display_is_canonical() {
        let s = TradingSignal::new(
            TradeAction::Buy,
            "EURUSD",
            dec!(1.0500),
            dec!(1.0450),
            dec!(1.0600),
        )
        .unwrap();
        assert_eq!(s.to_string(), "BUY EURUSD @ 1.05 SL 1.045 TP 1.06");
    }

    #[test]
    fn test_display_keeps_slash_for_unknown_codes() {
        let s = TradingSignal::new(TradeAction::Buy, "abc/def", dec!(1), dec!(0.5), dec!(2)).unwrap();
        assert_eq!(s.pair(), "ABCDEF");
        assert_eq!(s.to_string(), "BUY ABC/DEF @ 1 SL 0.5 TP 2");

        let s = TradingSignal::new(TradeAction::Sell, "EUR/XYZ", dec!(2), dec!(3), dec!(1)).unwrap();
        assert_eq!(s.to_string(), "SELL EUR/XYZ @ 2 SL 3 TP 1");

        // longer pairs are written as stored
        let s = TradingSignal::new(TradeAction::Close, "BTCUSDT", dec!(1), dec!(1), dec!(1)).unwrap();
        assert_eq!(s.to_string(), "CLOSE BTCUSDT @ 1 SL 1 TP 1");
    }

    #[test]
    fn test_deserialize_validates() {
        let ok = r#"{"action":"SELL","pair":"XAUUSD","price":"2300","stop_loss":"2310","take_profit":"2280"}"#;
        let s: TradingSignal = serde_json::from_str(ok).unwrap();
        assert_eq!(s.action(), TradeAction::Sell);
        assert_eq!(s.price(), dec!(2300));

        let bad = r#"{"action":"SELL","pair":"XAUUSD","price":"2300","stop_loss":"2280","take_profit":"2310"}"#;
        assert!(serde_json::from_str::<TradingSignal>(bad).is_err());
    }

    #[test]
    fn test_action_from_str() {
        assert_eq!("long".parse::<TradeAction>().unwrap(), TradeAction::Buy);
        assert_eq!("Exit".parse::<TradeAction>().unwrap(), TradeAction::Close);
        assert!("hold".parse::<TradeAction>().is_err());
    }
}
