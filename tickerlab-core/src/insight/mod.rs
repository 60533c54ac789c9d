//! Insight synthesizer.
//!
//! Produces the short recommendation text for one analysis. A configured
//! [`TextGenerator`] is tried first under a bounded timeout; anything other
//! than a non-empty answer in time falls back to a deterministic template
//! built from the trend classification. Generator failures never reach the
//! caller.

pub mod huggingface;

pub use huggingface::HuggingFaceGenerator;

use crate::indicators::Indicators;
use crate::trend::{TrendSignal, TrendState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Default bound on a single generator call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a generator produced no usable text.
///
/// Only ever observed inside [`synthesize`], which turns every variant into
/// the fallback path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("text generation is disabled")]
    Disabled,

    #[error("text generation timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("generation API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid generation response: {0}")]
    InvalidResponse(String),

    #[error("generator panicked")]
    Panicked,

    #[error("failed to start generator worker: {0}")]
    Worker(String),
}

/// A capability that turns a prompt into text.
///
/// Implementations should give up once `timeout` has elapsed. The
/// synthesizer runs each call on a worker thread and stops waiting at the
/// timeout regardless.
pub trait TextGenerator: Send + Sync {
    /// Human-readable name of this generator.
    fn name(&self) -> &str;

    fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, GenerationError>;
}

/// Generator handle shared between the pipeline and its worker threads.
pub type SharedGenerator = Arc<dyn TextGenerator>;

/// Which path produced an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSource {
    Generator,
    Fallback,
}

impl fmt::Display for InsightSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsightSource::Generator => f.write_str("generator"),
            InsightSource::Fallback => f.write_str("fallback"),
        }
    }
}

/// Insight text plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub text: String,
    pub source: InsightSource,
}

#[derive(Debug, Clone, Copy)]
pub struct InsightOptions {
    pub timeout: Duration,
}

impl Default for InsightOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Compact prompt summarizing the indicators and trend.
pub fn build_prompt(ticker: &str, ind: &Indicators, state: TrendState) -> String {
    format!(
        "Ticker: {ticker}, Close: ${:.2}, Change: {}, SMA10: {}, SMA30: {}, Trend: {state}. \
         Give 1-sentence trading recommendation:",
        ind.latest_close,
        ind.daily_change_pct
            .map(|c| format!("{c:+.2}%"))
            .unwrap_or_else(|| "n/a".into()),
        dollars_or_na(ind.sma_short),
        dollars_or_na(ind.sma_long),
    )
}

fn dollars_or_na(value: Option<f64>) -> String {
    value
        .map(|v| format!("${v:.2}"))
        .unwrap_or_else(|| "n/a".into())
}

/// Deterministic template used when no generator answer is usable.
pub fn fallback_text(ticker: &str, signal: &TrendSignal) -> String {
    format!(
        "{ticker} is in {} ({}) | {}",
        signal.state.label(),
        signal.note,
        signal.outlook
    )
}

/// Produce the insight for one analysis. Always returns non-empty text.
pub fn synthesize(
    ticker: &str,
    ind: &Indicators,
    signal: &TrendSignal,
    generator: Option<&SharedGenerator>,
    options: &InsightOptions,
) -> Insight {
    if let Some(generator) = generator {
        match attempt(generator, build_prompt(ticker, ind, signal.state), options.timeout) {
            Ok(text) => {
                debug!(ticker, generator = generator.name(), "using generated insight");
                return Insight {
                    text,
                    source: InsightSource::Generator,
                };
            }
            Err(e) => {
                warn!(ticker, generator = generator.name(), error = %e, "falling back to rule-based insight");
            }
        }
    }

    Insight {
        text: fallback_text(ticker, signal),
        source: InsightSource::Fallback,
    }
}

/// Run one generator call on a detached worker and wait at most `timeout`.
/// A call still running at the deadline is abandoned; its answer is dropped.
fn attempt(
    generator: &SharedGenerator,
    prompt: String,
    timeout: Duration,
) -> Result<String, GenerationError> {
    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(generator);
    thread::Builder::new()
        .name("insight-generator".into())
        .spawn(move || {
            let result =
                panic::catch_unwind(AssertUnwindSafe(|| worker.generate(&prompt, timeout)))
                    .unwrap_or(Err(GenerationError::Panicked));
            // The receiver is gone once the deadline has passed.
            let _ = tx.send(result);
        })
        .map_err(|e| GenerationError::Worker(e.to_string()))?;

    let result = match rx.recv_timeout(timeout) {
        Ok(result) => result?,
        Err(RecvTimeoutError::Timeout) => return Err(GenerationError::Timeout),
        Err(RecvTimeoutError::Disconnected) => return Err(GenerationError::Panicked),
    };

    let text = result.trim();
    if text.is_empty() {
        return Err(GenerationError::InvalidResponse("empty text".into()));
    }
    Ok(text.to_string())
}
