//! Trading signal parser.
//!
//! Turns free-form channel text such as
//! `"🚀 BUY EURUSD @ 1.0500 SL 1.0450 TP 1.0600"` into a validated
//! [`TradingSignal`](fxbot_core::TradingSignal), or reports why it could not.
//!
//! - `tokenizer`: splits text into words, numbers and symbols
//! - `parser`: label-driven rule matcher over the token stream

pub mod error;
pub mod parser;
pub mod tokenizer;

pub use fxbot_core::instruments;

pub use error::{NumericField, ParseFailure, ParseResult};
pub use parser::{parse, SignalParser};
pub use tokenizer::{tokenize, Token};
