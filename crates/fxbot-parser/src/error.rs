//! Parse failure reasons.

use fxbot_core::TradeAction;
use std::fmt;
use thiserror::Error;

/// Numeric field of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    Price,
    StopLoss,
    TakeProfit,
}

impl NumericField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::StopLoss => "stop_loss",
            Self::TakeProfit => "take_profit",
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a text did not yield a signal.
///
/// Variants are checked in declaration order; the first one that applies
/// is reported. Not finding a signal is an ordinary outcome, not an
/// operational error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("no action word found")]
    NoActionFound,

    #[error("no instrument pair found for {action}")]
    NoPairFound { action: TradeAction },

    #[error("{action} {pair}: missing {field}")]
    MissingNumericField {
        action: TradeAction,
        pair: String,
        field: NumericField,
    },

    #[error("{action} {pair}: invalid {field} value '{value}'")]
    InvalidNumericValue {
        action: TradeAction,
        pair: String,
        field: NumericField,
        value: String,
    },

    #[error("inconsistent levels: {0}")]
    InconsistentLevels(String),
}

impl ParseFailure {
    /// True when the text clearly tried to be a signal (action and pair
    /// recognised) but was malformed.
    pub fn is_attempt(&self) -> bool {
        !matches!(self, Self::NoActionFound | Self::NoPairFound { .. })
    }

    /// Stable label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NoActionFound => "no_action",
            Self::NoPairFound { .. } => "no_pair",
            Self::MissingNumericField { .. } => "missing_field",
            Self::InvalidNumericValue { .. } => "invalid_value",
            Self::InconsistentLevels(_) => "inconsistent_levels",
        }
    }
}

pub type ParseResult<T> = Result<T, ParseFailure>;
