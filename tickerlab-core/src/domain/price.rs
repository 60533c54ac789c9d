//! Price points and the ordered daily series the analysis runs on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One trading day for a single ticker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: u64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64, volume: u64) -> Self {
        Self {
            date,
            close,
            volume,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("dates must be strictly increasing: {previous} is followed by {next}")]
    OutOfOrder { previous: NaiveDate, next: NaiveDate },

    #[error("close on {date} is not a valid price: {close}")]
    InvalidClose { date: NaiveDate, close: f64 },
}

/// Daily points for one ticker, oldest first.
///
/// Construction enforces strictly increasing dates (which also rules out
/// duplicates) and finite, non-negative closes. An empty series is
/// representable; the indicator calculator rejects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    ticker: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        for point in &points {
            if !point.close.is_finite() || point.close < 0.0 {
                return Err(SeriesError::InvalidClose {
                    date: point.date,
                    close: point.close,
                });
            }
        }
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::OutOfOrder {
                    previous: pair[0].date,
                    next: pair[1].date,
                });
            }
        }
        Ok(Self {
            ticker: ticker.into(),
            points,
        })
    }

    /// Sort by date first, then validate. Duplicate dates still fail.
    pub fn from_unsorted(
        ticker: impl Into<String>,
        mut points: Vec<PricePoint>,
    ) -> Result<Self, SeriesError> {
        points.sort_by_key(|p| p.date);
        Self::new(ticker, points)
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.volume as f64).collect()
    }

    /// BLAKE3 digest over the ticker and every point, hex encoded.
    ///
    /// Stored on result records so an analysis can be traced back to the
    /// exact input it was derived from.
    pub fn dataset_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.ticker.as_bytes());
        for p in &self.points {
            hasher.update(p.date.to_string().as_bytes());
            hasher.update(&p.close.to_le_bytes());
            hasher.update(&p.volume.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn accepts_increasing_dates() {
        let series = PriceSeries::new(
            "AAPL",
            vec![
                PricePoint::new(day(1), 170.0, 1_000),
                PricePoint::new(day(4), 171.5, 2_000),
            ],
        )
        .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.latest().unwrap().close, 171.5);
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = PriceSeries::new(
            "AAPL",
            vec![
                PricePoint::new(day(1), 170.0, 1_000),
                PricePoint::new(day(1), 171.0, 1_000),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, SeriesError::OutOfOrder { .. }));
    }

    #[test]
    fn rejects_descending_dates() {
        let result = PriceSeries::new(
            "AAPL",
            vec![
                PricePoint::new(day(5), 170.0, 1_000),
                PricePoint::new(day(2), 171.0, 1_000),
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn from_unsorted_orders_points() {
        let series = PriceSeries::from_unsorted(
            "MSFT",
            vec![
                PricePoint::new(day(3), 3.0, 0),
                PricePoint::new(day(1), 1.0, 0),
                PricePoint::new(day(2), 2.0, 0),
            ],
        )
        .unwrap();
        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn rejects_nan_close() {
        let err =
            PriceSeries::new("X", vec![PricePoint::new(day(1), f64::NAN, 0)]).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidClose { .. }));
    }

    #[test]
    fn empty_series_is_representable() {
        let series = PriceSeries::new("X", vec![]).unwrap();
        assert!(series.is_empty());
        assert!(series.latest().is_none());
    }

    #[test]
    fn dataset_hash_tracks_content() {
        let a = PriceSeries::new("X", vec![PricePoint::new(day(1), 10.0, 5)]).unwrap();
        let b = PriceSeries::new("X", vec![PricePoint::new(day(1), 10.0, 5)]).unwrap();
        let c = PriceSeries::new("X", vec![PricePoint::new(day(1), 10.5, 5)]).unwrap();
        assert_eq!(a.dataset_hash(), b.dataset_hash());
        assert_ne!(a.dataset_hash(), c.dataset_hash());
    }

    #[test]
    fn point_serialization_roundtrip() {
        let point = PricePoint::new(day(1), 500.25, 42);
        let json = serde_json::to_string(&point).unwrap();
        let back: PricePoint = serde_json::from_str(&json).unwrap();
        assert_eq!(point, back);
    }
}
