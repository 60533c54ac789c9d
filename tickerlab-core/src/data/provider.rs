//! Price data source trait and structured error types.
//!
//! The `PriceDataSource` trait abstracts over where daily prices come from
//! (Polygon.io, local CSV files, test doubles). Sources own any request
//! pacing; the analysis pipeline never sleeps.

use crate::domain::{PriceSeries, SeriesError};
use chrono::{Duration, NaiveDate};
use thiserror::Error;

/// Structured error types for data operations.
///
/// Any of these is fatal for the ticker being fetched; no partial series is
/// ever returned.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("provider returned an invalid series for {symbol}: {source}")]
    InvalidSeries {
        symbol: String,
        #[source]
        source: SeriesError,
    },

    #[error("lookback of {days} day(s) reaches before the earliest representable date")]
    LookbackOutOfRange { days: u32 },

    #[error("local data file {path}: {reason}")]
    LocalFile { path: String, reason: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for daily price sources.
pub trait PriceDataSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Daily points for `ticker` covering the last `lookback_days` calendar
    /// days, oldest first.
    fn fetch(&self, ticker: &str, lookback_days: u32) -> Result<PriceSeries, DataError>;
}

/// First calendar day of a lookback window ending on `end` (inclusive).
pub fn lookback_start(end: NaiveDate, lookback_days: u32) -> Result<NaiveDate, DataError> {
    end.checked_sub_signed(Duration::days(i64::from(lookback_days)))
        .ok_or(DataError::LookbackOutOfRange {
            days: lookback_days,
        })
}
