//! Result persistence.
//!
//! Records are written as pretty JSON under their storage key
//! (`analyses/{TICKER}/{timestamp}.json`) relative to a root directory.
//! Writes go to a temporary file first and are renamed into place, so a
//! reader never observes a half-written record.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tickerlab_core::record::{RecordError, ResultRecord};
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Somewhere a finished record can be kept.
pub trait ResultStore: Send + Sync {
    fn name(&self) -> &str;

    /// Persist one record and return the key it was stored under.
    fn put(&self, record: &ResultRecord) -> Result<String, StoreError>;
}

/// Stores records as JSON files beneath a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Load a previously stored record by key.
    pub fn load(&self, key: &str) -> Result<ResultRecord, StoreError> {
        let path = self.path_for(key);
        let json = fs::read_to_string(&path).map_err(|source| io_err(&path, source))?;
        Ok(ResultRecord::from_json(&json)?)
    }
}

impl ResultStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    fn put(&self, record: &ResultRecord) -> Result<String, StoreError> {
        let key = record.storage_key();
        let path = self.path_for(&key);
        let json = record.to_json()?;
        write_atomic(&path, json.as_bytes())?;
        debug!(key = %key, path = %path.display(), "stored record");
        Ok(key)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| io_err(parent, source))?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|source| io_err(&tmp, source))?;
    fs::rename(&tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        io_err(path, source)
    })
}

fn io_err(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tickerlab_core::indicators::Indicators;
    use tickerlab_core::insight::{Insight, InsightSource};
    use tickerlab_core::trend::TrendState;

    fn record(ticker: &str) -> ResultRecord {
        let ind = Indicators {
            latest_close: 39.0,
            daily_change_pct: Some(2.63),
            sma_short: Some(34.5),
            sma_long: Some(24.5),
            avg_volume_short: Some(1_000.0),
            sample_count: 40,
        };
        let insight = Insight {
            text: format!("{ticker} is in UPTREND"),
            source: InsightSource::Fallback,
        };
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        ResultRecord::build_at(ticker, ind, TrendState::Uptrend, insight, ts).unwrap()
    }

    #[test]
    fn put_writes_under_storage_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let rec = record("AAPL");

        let key = store.put(&rec).unwrap();
        assert_eq!(key, rec.storage_key());
        assert!(key.starts_with("analyses/AAPL/"));
        assert!(store.path_for(&key).is_file());
        assert!(!store.path_for(&key).with_extension("json.tmp").exists());
    }

    #[test]
    fn load_returns_stored_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let rec = record("MSFT");

        let key = store.put(&rec).unwrap();
        let back = store.load(&key).unwrap();
        assert_eq!(back.ticker(), "MSFT");
        assert_eq!(back.trend(), TrendState::Uptrend);
        assert_eq!(back.timestamp(), rec.timestamp());
        assert_eq!(back.insight(), rec.insight());
    }

    #[test]
    fn put_overwrites_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let rec = record("TSLA");
        let first = store.put(&rec).unwrap();
        let second = store.put(&rec).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn load_missing_key_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let err = store.load("analyses/NOPE/x.json").unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
