//! Simple Moving Average (SMA) over a trailing window.
//!
//! Only the most recent `period` values contribute. When fewer values are
//! available the average is absent, never zero.

#[derive(Debug, Clone, Copy)]
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self { period }
    }

    /// Mean of the trailing window ending at the last value.
    pub fn latest(&self, values: &[f64]) -> Option<f64> {
        trailing_mean(values, self.period)
    }
}

/// Arithmetic mean of the last `period` values, or `None` if there are fewer.
///
/// Deviations are summed relative to the newest value, so any window whose
/// values are all identical averages to exactly that value. Two windows over
/// a flat series therefore compare equal regardless of their length.
pub fn trailing_mean(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let anchor = values[values.len() - 1];
    let window = &values[values.len() - period..];
    let offset: f64 = window.iter().map(|v| v - anchor).sum();
    Some(anchor + offset / period as f64)
}
