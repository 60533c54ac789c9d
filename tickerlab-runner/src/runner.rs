//! Analysis runner: wires data source, indicators, classifier, synthesizer,
//! and the result record together.
//!
//! Three entry points:
//! - `analyze_series()`: runs the pipeline over an already-loaded series.
//! - `analyze_ticker()`: fetches the series from a source, then analyzes it.
//! - `run_batch()`: analyzes several tickers in order, optionally storing each
//!   record. One ticker failing never stops the rest.

use std::collections::HashSet;
use std::time::Instant;

use thiserror::Error;
use tickerlab_core::data::{DataError, PriceDataSource};
use tickerlab_core::domain::{is_valid_ticker, normalize_ticker, PriceSeries};
use tickerlab_core::indicators::{self, IndicatorError};
use tickerlab_core::insight::{self, InsightOptions, SharedGenerator};
use tickerlab_core::record::{RecordError, ResultRecord};
use tickerlab_core::trend;
use tracing::{debug, info, warn};

use crate::store::{ResultStore, StoreError};

/// Errors from analyzing a single ticker.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid ticker '{0}'")]
    InvalidTicker(String),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("indicator error: {0}")]
    Indicators(#[from] IndicatorError),
    #[error("record error: {0}")]
    Record(#[from] RecordError),
}

/// Per-run settings shared by every ticker in a batch.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub lookback_days: u32,
    pub insight: InsightOptions,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            lookback_days: 60,
            insight: InsightOptions::default(),
        }
    }
}

/// Run indicators, classification, and synthesis over a loaded series.
pub fn analyze_series(
    series: &PriceSeries,
    generator: Option<&SharedGenerator>,
    options: &InsightOptions,
) -> Result<ResultRecord, RunError> {
    let ticker = series.ticker();
    let ind = indicators::compute(series)?;
    let signal = trend::classify(&ind);
    debug!(ticker, trend = %signal.state, note = signal.note, "classified");

    let insight = insight::synthesize(ticker, &ind, &signal, generator, options);
    let record = ResultRecord::build(ticker, ind, signal.state, insight)?
        .with_dataset_hash(series.dataset_hash());
    Ok(record)
}

/// Fetch one ticker's history and analyze it.
pub fn analyze_ticker(
    source: &dyn PriceDataSource,
    ticker: &str,
    generator: Option<&SharedGenerator>,
    options: &RunOptions,
) -> Result<ResultRecord, RunError> {
    let ticker = normalize_ticker(ticker);
    if !is_valid_ticker(&ticker) {
        return Err(RunError::InvalidTicker(ticker));
    }
    let series = source.fetch(&ticker, options.lookback_days)?;
    info!(
        ticker = %ticker,
        source = source.name(),
        points = series.len(),
        "fetched price history"
    );
    analyze_series(&series, generator, &options.insight)
}

/// Something that happened while a batch was running.
#[derive(Debug)]
pub enum BatchEvent<'a> {
    Started {
        ticker: &'a str,
        index: usize,
        total: usize,
    },
    Analyzed(&'a ResultRecord),
    Saved {
        ticker: &'a str,
        key: &'a str,
    },
    Failed {
        ticker: &'a str,
        error: &'a RunError,
    },
    StoreFailed {
        ticker: &'a str,
        error: &'a StoreError,
    },
}

/// A ticker that could not be analyzed.
#[derive(Debug)]
pub struct TickerFailure {
    pub ticker: String,
    pub error: RunError,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Distinct tickers attempted.
    pub total: usize,
    pub records: Vec<ResultRecord>,
    pub failures: Vec<TickerFailure>,
    /// Storage keys of saved records.
    pub saved: Vec<String>,
    pub store_failures: usize,
    pub elapsed_secs: f64,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.records.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// True when at least one ticker was attempted and none produced a record.
    pub fn all_failed(&self) -> bool {
        self.total > 0 && self.records.is_empty()
    }
}

/// Trim, upper-case, and de-duplicate tickers, keeping first-seen order.
/// Blank entries are dropped.
pub fn normalize_tickers<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .map(|t| normalize_ticker(t.as_ref()))
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Analyze every ticker in order.
///
/// Failures are collected rather than returned; a store failure is logged and
/// counted but keeps the analyzed record in the summary.
pub fn run_batch<S: AsRef<str>>(
    source: &dyn PriceDataSource,
    tickers: &[S],
    generator: Option<&SharedGenerator>,
    options: &RunOptions,
    store: Option<&dyn ResultStore>,
    progress_cb: Option<&dyn Fn(&BatchEvent)>,
) -> BatchSummary {
    let start = Instant::now();
    let tickers = normalize_tickers(tickers);

    let mut summary = BatchSummary {
        total: tickers.len(),
        ..Default::default()
    };

    for (index, ticker) in tickers.iter().enumerate() {
        emit(progress_cb, BatchEvent::Started {
            ticker,
            index,
            total: tickers.len(),
        });

        let record = match analyze_ticker(source, ticker, generator, options) {
            Ok(record) => record,
            Err(error) => {
                warn!(ticker = %ticker, error = %error, "analysis failed");
                emit(progress_cb, BatchEvent::Failed {
                    ticker,
                    error: &error,
                });
                summary.failures.push(TickerFailure {
                    ticker: ticker.clone(),
                    error,
                });
                continue;
            }
        };
        emit(progress_cb, BatchEvent::Analyzed(&record));

        if let Some(store) = store {
            match store.put(&record) {
                Ok(key) => {
                    info!(ticker = %ticker, store = store.name(), key = %key, "saved record");
                    emit(progress_cb, BatchEvent::Saved { ticker, key: &key });
                    summary.saved.push(key);
                }
                Err(error) => {
                    warn!(ticker = %ticker, error = %error, "failed to save record");
                    emit(progress_cb, BatchEvent::StoreFailed {
                        ticker,
                        error: &error,
                    });
                    summary.store_failures += 1;
                }
            }
        }
        summary.records.push(record);
    }

    summary.elapsed_secs = start.elapsed().as_secs_f64();
    info!(
        total = summary.total,
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        saved = summary.saved.len(),
        elapsed_secs = summary.elapsed_secs,
        "batch complete"
    );
    summary
}

fn emit(progress_cb: Option<&dyn Fn(&BatchEvent)>, event: BatchEvent) {
    if let Some(cb) = progress_cb {
        cb(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_tickers_dedups_in_order() {
        let out = normalize_tickers(&[" aapl", "MSFT", "AAPL", "", "  ", "msft ", "tsla"]);
        assert_eq!(out, vec!["AAPL", "MSFT", "TSLA"]);
    }

    #[test]
    fn all_failed_needs_attempts() {
        let empty = BatchSummary::default();
        assert!(!empty.all_failed());

        let failed = BatchSummary {
            total: 1,
            failures: vec![TickerFailure {
                ticker: "X".into(),
                error: RunError::InvalidTicker(String::new()),
            }],
            ..Default::default()
        };
        assert!(failed.all_failed());
        assert_eq!(failed.failed(), 1);
        assert_eq!(failed.succeeded(), 0);
    }
}
