//! Offline data source reading `{dir}/{TICKER}.csv`.
//!
//! Files need a header row with `date,close,volume` (extra columns are
//! ignored). Only rows inside the lookback window, measured back from the
//! newest row, are kept.

use super::provider::{lookback_start, DataError, PriceDataSource};
use crate::domain::{PricePoint, PriceSeries};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    close: f64,
    #[serde(default)]
    volume: u64,
}

pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{ticker}.csv"))
    }

    fn read_points(path: &Path) -> Result<Vec<PricePoint>, DataError> {
        let local_err = |reason: String| DataError::LocalFile {
            path: path.display().to_string(),
            reason,
        };

        let mut reader = csv::Reader::from_path(path).map_err(|e| local_err(e.to_string()))?;
        let mut points = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            let row = row.map_err(|e| local_err(e.to_string()))?;
            points.push(PricePoint::new(row.date, row.close, row.volume));
        }
        Ok(points)
    }
}

impl PriceDataSource for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, ticker: &str, lookback_days: u32) -> Result<PriceSeries, DataError> {
        let path = self.path_for(ticker);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }

        let mut points = Self::read_points(&path)?;
        let Some(newest) = points.iter().map(|p| p.date).max() else {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        };
        let start = lookback_start(newest, lookback_days)?;
        points.retain(|p| p.date >= start);

        PriceSeries::from_unsorted(ticker, points).map_err(|source| DataError::InvalidSeries {
            symbol: ticker.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, ticker: &str, body: &str) {
        fs::write(dir.join(format!("{ticker}.csv")), body).unwrap();
    }

    #[test]
    fn reads_and_sorts_rows() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "SPY",
            "date,close,volume\n2024-01-03,471.0,200\n2024-01-02,470.0,100\n",
        );
        let series = CsvSource::new(tmp.path()).fetch("SPY", 30).unwrap();
        assert_eq!(series.closes(), vec![470.0, 471.0]);
        assert_eq!(series.points()[1].volume, 200);
    }

    #[test]
    fn trims_to_lookback_window() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "QQQ",
            "date,close,volume\n2024-01-01,1.0,1\n2024-02-01,2.0,1\n2024-02-10,3.0,1\n",
        );
        let series = CsvSource::new(tmp.path()).fetch("QQQ", 10).unwrap();
        assert_eq!(series.closes(), vec![2.0, 3.0]);
    }

    #[test]
    fn huge_lookback_is_an_error_not_a_panic() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "X", "date,close,volume\n2024-01-02,1.0,1\n");
        let err = CsvSource::new(tmp.path()).fetch("X", u32::MAX).unwrap_err();
        assert!(matches!(err, DataError::LookbackOutOfRange { .. }));
    }

    #[test]
    fn missing_file_is_symbol_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = CsvSource::new(tmp.path()).fetch("NOPE", 30).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn header_only_is_symbol_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "EMPTY", "date,close,volume\n");
        let err = CsvSource::new(tmp.path()).fetch("EMPTY", 30).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn bad_row_is_local_file_error() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "BAD", "date,close,volume\nnot-a-date,1.0,1\n");
        let err = CsvSource::new(tmp.path()).fetch("BAD", 30).unwrap_err();
        assert!(matches!(err, DataError::LocalFile { .. }));
    }

    #[test]
    fn duplicate_dates_are_invalid() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "DUP",
            "date,close,volume\n2024-01-02,1.0,1\n2024-01-02,2.0,1\n",
        );
        let err = CsvSource::new(tmp.path()).fetch("DUP", 30).unwrap_err();
        assert!(matches!(err, DataError::InvalidSeries { .. }));
    }
}
