//! Indicator calculator.
//!
//! Derives a fixed set of indicators from a price series: latest close,
//! day-over-day percent change, 10- and 30-point simple moving averages of
//! close, and the 10-point average volume. All values are kept unrounded;
//! rounding happens only when a value is rendered.

pub mod sma;

pub use sma::{trailing_mean, Sma};

use crate::domain::PriceSeries;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Window of the short moving average and the average volume.
pub const SHORT_WINDOW: usize = 10;

/// Window of the long moving average.
pub const LONG_WINDOW: usize = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndicatorError {
    #[error("insufficient data: need at least {required} point(s), have {available}")]
    InsufficientData { required: usize, available: usize },
}

/// Indicators derived from one price series.
///
/// Optional fields are `None` when the series is too short for them (or, for
/// the percent change, when the previous close is zero). A computed zero is
/// always `Some(0.0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    pub latest_close: f64,
    pub daily_change_pct: Option<f64>,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub avg_volume_short: Option<f64>,
    /// Number of points the indicators were derived from.
    pub sample_count: usize,
}

impl Indicators {
    /// True when every present value is finite.
    pub fn is_well_formed(&self) -> bool {
        let optional = [
            self.daily_change_pct,
            self.sma_short,
            self.sma_long,
            self.avg_volume_short,
        ];
        self.latest_close.is_finite()
            && self.sample_count >= 1
            && optional.iter().flatten().all(|v| v.is_finite())
    }
}

/// Compute indicators for a series ordered oldest to newest.
pub fn compute(series: &PriceSeries) -> Result<Indicators, IndicatorError> {
    let latest = series.latest().ok_or(IndicatorError::InsufficientData {
        required: 1,
        available: 0,
    })?;

    let closes = series.closes();
    let volumes = series.volumes();

    let daily_change_pct = daily_change_pct(&closes);
    if closes.len() >= 2 && daily_change_pct.is_none() {
        warn!(
            ticker = series.ticker(),
            "previous close is zero; daily change left undefined"
        );
    }

    Ok(Indicators {
        latest_close: latest.close,
        daily_change_pct,
        sma_short: Sma::new(SHORT_WINDOW).latest(&closes),
        sma_long: Sma::new(LONG_WINDOW).latest(&closes),
        avg_volume_short: trailing_mean(&volumes, SHORT_WINDOW),
        sample_count: series.len(),
    })
}

/// Percent change between the last two closes.
///
/// `None` with fewer than two values or when the previous close is zero.
pub fn daily_change_pct(closes: &[f64]) -> Option<f64> {
    let n = closes.len();
    if n < 2 {
        return None;
    }
    let prev = closes[n - 2];
    if prev == 0.0 {
        return None;
    }
    Some((closes[n - 1] - prev) / prev * 100.0)
}

/// Build a series from close prices for testing.
///
/// Dates are consecutive calendar days starting 2024-01-02; volume is
/// 1000 * (index + 1).
#[cfg(test)]
pub fn make_series(closes: &[f64]) -> PriceSeries {
    use crate::domain::PricePoint;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let points = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            PricePoint::new(
                base_date + chrono::Duration::days(i as i64),
                close,
                1000 * (i as u64 + 1),
            )
        })
        .collect();
    PriceSeries::new("TEST", points).unwrap()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
