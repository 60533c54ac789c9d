//! Domain types for tickerlab

pub mod price;

pub use price::{PricePoint, PriceSeries, SeriesError};

/// Ticker symbol alias
pub type Ticker = String;

/// Longest accepted ticker symbol.
pub const MAX_TICKER_LEN: usize = 16;

/// Upper-case and trim a user-supplied ticker.
pub fn normalize_ticker(raw: &str) -> Ticker {
    raw.trim().to_ascii_uppercase()
}

/// True for a normalized ticker that is safe to embed in file paths and
/// URLs: `[A-Z0-9.-]`, starting with a letter or digit.
pub fn is_valid_ticker(ticker: &str) -> bool {
    let mut chars = ticker.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    ticker.len() <= MAX_TICKER_LEN
        && (first.is_ascii_uppercase() || first.is_ascii_digit())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.' || c == '-')
}
