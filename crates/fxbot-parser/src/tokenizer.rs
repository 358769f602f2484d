//! Text tokenizer.
//!
//! Produces three token kinds:
//! - `Word`: an alphanumeric run starting with a letter, upper-cased
//! - `Number`: digits with inner `.`/`,` separators and an optional leading `-`
//!   attached directly to the first digit
//! - `Symbol`: any other non-whitespace character (punctuation, emoji)

use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    Number(String),
    Symbol(char),
}

impl Token {
    pub fn is_word(&self, w: &str) -> bool {
        matches!(self, Token::Word(s) if s == w)
    }

    pub fn is_symbol(&self, c: char) -> bool {
        matches!(self, Token::Symbol(s) if *s == c)
    }

    pub fn as_word(&self) -> Option<&str> {
        match self {
            Token::Word(s) => Some(s),
            _ => None,
        }
    }
}

/// Split `text` into tokens. Whitespace is dropped.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    // '-' binds to a number only after whitespace, start of text, or a symbol
    let mut prev_is_boundary = true;

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            prev_is_boundary = true;
            continue;
        }

        if c.is_ascii_digit() {
            tokens.push(Token::Number(read_number(text, start, &mut chars)));
            prev_is_boundary = false;
            continue;
        }

        if c == '-' && prev_is_boundary && next_is_digit(text, start + c.len_utf8()) {
            chars.next();
            let digits_start = start + 1;
            let number = read_number(text, digits_start, &mut chars);
            tokens.push(Token::Number(format!("-{number}")));
            prev_is_boundary = false;
            continue;
        }

        if c.is_alphabetic() {
            let mut end = start;
            while let Some(&(i, ch)) = chars.peek() {
                if !ch.is_alphanumeric() {
                    break;
                }
                end = i + ch.len_utf8();
                chars.next();
            }
            tokens.push(Token::Word(text[start..end].to_uppercase()));
            prev_is_boundary = false;
            continue;
        }

        chars.next();
        tokens.push(Token::Symbol(c));
        prev_is_boundary = true;
    }

    tokens
}

fn next_is_digit(text: &str, idx: usize) -> bool {
    text[idx..].chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Consume a digit run starting at `start`. A `.` or `,` is kept only when
/// directly followed by another digit, so trailing sentence punctuation is
/// left as a symbol.
fn read_number(text: &str, start: usize, chars: &mut Peekable<CharIndices<'_>>) -> String {
    let mut end = start;
    while let Some(&(i, ch)) = chars.peek() {
        if ch.is_ascii_digit() {
            end = i + 1;
            chars.next();
        } else if (ch == '.' || ch == ',') && next_is_digit(text, i + 1) {
            end = i + 1;
            chars.next();
        } else {
            break;
        }
    }
    text[start..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(s: &str) -> Token {
        Token::Word(s.to_string())
    }

    fn n(s: &str) -> Token {
        Token::Number(s.to_string())
    }

    #[test]
    fn test_basic_signal() {
        let tokens = tokenize("🚀 Buy eurusd @ 1.0500 SL: 1.0450");
        assert_eq!(
            tokens,
            vec![
                Token::Symbol('🚀'),
                w("BUY"),
                w("EURUSD"),
                Token::Symbol('@'),
                n("1.0500"),
                w("SL"),
                Token::Symbol(':'),
                n("1.0450"),
            ]
        );
    }

    #[test]
    fn test_trailing_period_is_symbol() {
        assert_eq!(tokenize("TP 1.06."), vec![w("TP"), n("1.06"), Token::Symbol('.')]);
    }

    #[test]
    fn test_comma_separator() {
        assert_eq!(tokenize("1,0500 2,350.50"), vec![n("1,0500"), n("2,350.50")]);
    }

    #[test]
    fn test_minus_binding() {
        assert_eq!(tokenize("SL -1.04"), vec![w("SL"), n("-1.04")]);
        assert_eq!(
            tokenize("SL-1.04"),
            vec![w("SL"), Token::Symbol('-'), n("1.04")]
        );
        assert_eq!(
            tokenize("SL: -5"),
            vec![w("SL"), Token::Symbol(':'), n("-5")]
        );
    }

    #[test]
    fn test_label_words_with_digits() {
        assert_eq!(tokenize("TP1=1.07"), vec![w("TP1"), Token::Symbol('='), n("1.07")]);
        assert_eq!(
            tokenize("s/l"),
            vec![w("S"), Token::Symbol('/'), w("L")]
        );
    }

    #[test]
    fn test_empty() {
        assert!(tokenize("   \n\t").is_empty());
    }
}
