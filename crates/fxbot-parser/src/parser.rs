//! Signal extraction from free text.
//!
//! The matcher runs over the token stream in fixed steps:
//! 1. first action word (`BUY`/`LONG`, `SELL`/`SHORT`, `CLOSE`/`EXIT`)
//! 2. first instrument pair (`EURUSD` or `EUR/USD`)
//! 3. labelled levels (entry, stop loss, take profit); label and value may be
//!    separated by `:`, `=`, `-` or `@`
//! 4. an unlabelled entry falls back to the first number no label consumed
//!
//! The resulting fields are validated by `TradingSignal::new`.

use crate::error::{NumericField, ParseFailure, ParseResult};
use crate::tokenizer::{tokenize, Token};
use fxbot_core::{instruments, CoreError, TradeAction, TradingSignal};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;
use tracing::trace;

static DEFAULT_PARSER: Lazy<SignalParser> = Lazy::new(SignalParser::new);

/// Parse `text` with the default instrument set.
pub fn parse(text: &str) -> ParseResult<TradingSignal> {
    DEFAULT_PARSER.parse(text)
}

/// Signal parser with a configurable set of instrument codes.
#[derive(Debug, Clone)]
pub struct SignalParser {
    instruments: HashSet<String>,
}

impl Default for SignalParser {
    fn default() -> Self {
        Self::new()
    }
}

/// A field value as found in the text, before decimal conversion.
#[derive(Debug, Clone)]
enum RawValue {
    Number(String),
    NonFinite(String),
}

#[derive(Debug, Default)]
struct Levels {
    price: Option<RawValue>,
    stop_loss: Option<RawValue>,
    take_profit: Option<RawValue>,
}

impl Levels {
    fn slot(&mut self, field: NumericField) -> &mut Option<RawValue> {
        match field {
            NumericField::Price => &mut self.price,
            NumericField::StopLoss => &mut self.stop_loss,
            NumericField::TakeProfit => &mut self.take_profit,
        }
    }
}

impl SignalParser {
    /// Parser recognising the default currency, metal and crypto codes.
    pub fn new() -> Self {
        Self::with_instruments(instruments::default_codes())
    }

    /// Parser recognising exactly `codes` as pair halves.
    pub fn with_instruments<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            instruments: codes
                .into_iter()
                .map(|c| c.as_ref().trim().to_uppercase())
                .collect(),
        }
    }

    /// Add a 3-letter instrument code.
    pub fn add_instrument(&mut self, code: &str) {
        self.instruments.insert(code.trim().to_uppercase());
    }

    /// Parse one message text.
    pub fn parse(&self, text: &str) -> ParseResult<TradingSignal> {
        let tokens = tokenize(text);
        let mut consumed = vec![false; tokens.len()];

        let action = find_action(&tokens).ok_or(ParseFailure::NoActionFound)?;

        let pair = self
            .find_pair(&tokens, &mut consumed)
            .ok_or(ParseFailure::NoPairFound { action })?;

        let mut levels = Levels::default();
        let mut i = 0;
        while i < tokens.len() {
            let Some((field, label_len)) = match_label(&tokens, i) else {
                i += 1;
                continue;
            };
            let mut j = i + label_len;
            while j < tokens.len() && is_separator(&tokens[j]) {
                j += 1;
            }
            let value = match tokens.get(j) {
                Some(Token::Number(n)) if !consumed[j] => Some(RawValue::Number(n.clone())),
                Some(Token::Word(w)) if is_non_finite(w) => Some(RawValue::NonFinite(w.clone())),
                _ => None,
            };
            if let Some(value) = value {
                consumed[j] = true;
                let slot = levels.slot(field);
                if slot.is_none() {
                    *slot = Some(value);
                }
                i = j + 1;
            } else {
                i += label_len;
            }
        }

        if levels.price.is_none() {
            if let Some(idx) = tokens
                .iter()
                .enumerate()
                .position(|(idx, t)| matches!(t, Token::Number(_)) && !consumed[idx])
            {
                if let Token::Number(n) = &tokens[idx] {
                    levels.price = Some(RawValue::Number(n.clone()));
                }
            }
        }

        trace!(?action, %pair, ?levels, "Signal candidate");

        let fields = [
            (NumericField::Price, levels.price),
            (NumericField::StopLoss, levels.stop_loss),
            (NumericField::TakeProfit, levels.take_profit),
        ];

        for (field, value) in &fields {
            if value.is_none() {
                return Err(ParseFailure::MissingNumericField {
                    action,
                    pair,
                    field: *field,
                });
            }
        }

        let mut values = [Decimal::ZERO; 3];
        for (slot, (field, value)) in values.iter_mut().zip(fields) {
            let invalid = |value: String| ParseFailure::InvalidNumericValue {
                action,
                pair: pair.clone(),
                field,
                value,
            };
            *slot = match value {
                Some(RawValue::Number(raw)) => match parse_decimal(&raw) {
                    Some(d) if d > Decimal::ZERO => d,
                    _ => return Err(invalid(raw)),
                },
                Some(RawValue::NonFinite(raw)) => return Err(invalid(raw)),
                None => {
                    return Err(ParseFailure::MissingNumericField {
                        action,
                        pair: pair.clone(),
                        field,
                    })
                }
            };
        }
        let [price, stop_loss, take_profit] = values;

        TradingSignal::new(action, &pair, price, stop_loss, take_profit).map_err(|e| match e {
            CoreError::InconsistentLevels(msg) => ParseFailure::InconsistentLevels(msg),
            CoreError::InvalidPair(_) => ParseFailure::NoPairFound { action },
            other => ParseFailure::InvalidNumericValue {
                action,
                pair: pair.clone(),
                field: NumericField::Price,
                value: other.to_string(),
            },
        })
    }

    fn is_instrument(&self, code: &str) -> bool {
        code.len() == 3 && self.instruments.contains(code)
    }

    /// First pair in the text: a 6-letter word of two known codes, or
    /// `AAA/BBB`.
    fn find_pair(&self, tokens: &[Token], consumed: &mut [bool]) -> Option<String> {
        for (i, token) in tokens.iter().enumerate() {
            let Some(word) = token.as_word() else {
                continue;
            };
            if word.len() == 6
                && word.is_ascii()
                && self.is_instrument(&word[..3])
                && self.is_instrument(&word[3..])
            {
                consumed[i] = true;
                return Some(word.to_string());
            }
            if is_code_word(word) {
                if let (Some(slash), Some(Token::Word(quote))) = (tokens.get(i + 1), tokens.get(i + 2))
                {
                    if slash.is_symbol('/') && is_code_word(quote) {
                        consumed[i..=i + 2].iter_mut().for_each(|c| *c = true);
                        return Some(format!("{word}{quote}"));
                    }
                }
            }
        }
        None
    }
}

fn is_code_word(word: &str) -> bool {
    word.len() == 3 && word.chars().all(|c| c.is_ascii_uppercase())
}

fn find_action(tokens: &[Token]) -> Option<TradeAction> {
    tokens.iter().find_map(|t| match t.as_word()? {
        "BUY" | "LONG" => Some(TradeAction::Buy),
        "SELL" | "SHORT" => Some(TradeAction::Sell),
        "CLOSE" | "EXIT" => Some(TradeAction::Close),
        _ => None,
    })
}

/// Label starting at `i`, with the number of tokens it spans.
fn match_label(tokens: &[Token], i: usize) -> Option<(NumericField, usize)> {
    let token = &tokens[i];
    if token.is_symbol('@') {
        return Some((NumericField::Price, 1));
    }
    let word = token.as_word()?;
    let next_word = tokens.get(i + 1).and_then(Token::as_word);
    let slashed = |second: &str| {
        tokens.get(i + 1).is_some_and(|t| t.is_symbol('/'))
            && tokens.get(i + 2).is_some_and(|t| t.is_word(second))
    };

    match word {
        "ENTRY" | "PRICE" | "AT" | "EP" | "OPEN" => Some((NumericField::Price, 1)),
        "STOP" if next_word == Some("LOSS") => Some((NumericField::StopLoss, 2)),
        "SL" | "STOP" | "STOPLOSS" => Some((NumericField::StopLoss, 1)),
        "S" if slashed("L") => Some((NumericField::StopLoss, 3)),
        "TAKE" if next_word == Some("PROFIT") => Some((NumericField::TakeProfit, 2)),
        "TP" | "TARGET" | "TAKEPROFIT" => Some((NumericField::TakeProfit, 1)),
        "T" if slashed("P") => Some((NumericField::TakeProfit, 3)),
        w if is_numbered_tp(w) => Some((NumericField::TakeProfit, 1)),
        _ => None,
    }
}

fn is_numbered_tp(word: &str) -> bool {
    let bytes = word.as_bytes();
    bytes.len() == 3 && word.starts_with("TP") && (b'1'..=b'9').contains(&bytes[2])
}

fn is_separator(token: &Token) -> bool {
    matches!(token, Token::Symbol(':' | '=' | '-' | '@'))
}

fn is_non_finite(word: &str) -> bool {
    matches!(word, "NAN" | "INF" | "INFINITY")
}

/// Convert a number token to a decimal.
///
/// With both `,` and `.` present the commas are thousands separators; a lone
/// comma is a decimal separator; several commas without a dot are thousands
/// separators.
fn parse_decimal(raw: &str) -> Option<Decimal> {
    let commas = raw.matches(',').count();
    let normalized = if raw.contains('.') || commas > 1 {
        raw.replace(',', "")
    } else {
        raw.replace(',', ".")
    };
    Decimal::from_str(&normalized).ok()
}
