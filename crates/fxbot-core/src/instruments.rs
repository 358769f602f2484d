//! Instrument codes recognised as pair halves by default.

/// Fiat currencies.
pub const CURRENCIES: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "CHF", "AUD", "NZD", "CAD", "SEK", "NOK", "DKK", "SGD", "HKD",
    "MXN", "ZAR", "TRY", "PLN", "HUF", "CZK", "CNH", "CNY", "RUB", "INR",
];

/// Precious metals.
pub const METALS: &[&str] = &["XAU", "XAG", "XPT", "XPD"];

/// Crypto assets quoted as 3-letter codes.
pub const CRYPTO: &[&str] = &["BTC", "ETH", "LTC", "XRP", "SOL", "BNB", "ADA", "DOT"];

/// All default codes.
pub fn default_codes() -> impl Iterator<Item = &'static str> {
    CURRENCIES
        .iter()
        .chain(METALS.iter())
        .chain(CRYPTO.iter())
        .copied()
}

/// Whether `code` is one of the default 3-letter codes.
pub fn is_default_code(code: &str) -> bool {
    default_codes().any(|c| c == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_default_code() {
        assert!(is_default_code("EUR"));
        assert!(is_default_code("XAU"));
        assert!(is_default_code("BTC"));
        assert!(!is_default_code("ABC"));
        assert!(!is_default_code("eur"));
    }
}
