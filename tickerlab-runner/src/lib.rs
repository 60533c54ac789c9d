//! tickerlab runner: configuration, batch orchestration, persistence, and
//! reporting.
//!
//! This crate builds on `tickerlab-core` to provide:
//! - Analyzer config (TOML) and environment credentials
//! - Single-ticker and batch analysis with per-ticker failure isolation
//! - File-backed result store with atomic writes
//! - Console report rendering and CSV summary export

pub mod config;
pub mod export;
pub mod report;
pub mod runner;
pub mod store;

pub use config::{AnalyzerConfig, ConfigError, Credentials, SourceKind};
pub use export::{export_summary_csv, write_summary_csv};
pub use report::{print_event, render_report, render_summary};
pub use runner::{
    analyze_series, analyze_ticker, normalize_tickers, run_batch, BatchEvent, BatchSummary,
    RunError, RunOptions, TickerFailure,
};
pub use store::{FileStore, ResultStore, StoreError};
