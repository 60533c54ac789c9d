//! Result record: the immutable output of one ticker's analysis.
//!
//! Records are built once, never mutated, and handed to presentation or
//! persistence. The JSON form carries a `schema_version`; newer versions
//! are rejected on load.

use crate::domain::is_valid_ticker;
use crate::indicators::Indicators;
use crate::insight::{Insight, InsightSource};
use crate::trend::{Action, TrendState};
use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current schema version for persisted records.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    1
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("ticker must not be empty")]
    EmptyTicker,

    #[error("ticker '{0}' contains characters outside [A-Z0-9.-]")]
    InvalidTicker(String),

    #[error("indicators for '{ticker}' contain non-finite values")]
    MalformedIndicators { ticker: String },

    #[error("insight text must not be empty")]
    EmptyInsight,

    #[error("unsupported schema version {found} (max supported: {SCHEMA_VERSION})")]
    UnsupportedSchema { found: u32 },

    #[error("record JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(default = "default_schema_version")]
    schema_version: u32,
    ticker: String,
    timestamp: DateTime<Utc>,
    indicators: Indicators,
    trend: TrendState,
    action: Action,
    insight: String,
    insight_source: InsightSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dataset_hash: Option<String>,
}

impl ResultRecord {
    /// Assemble a record stamped with the current time.
    pub fn build(
        ticker: &str,
        indicators: Indicators,
        trend: TrendState,
        insight: Insight,
    ) -> Result<Self, RecordError> {
        Self::build_at(ticker, indicators, trend, insight, Utc::now())
    }

    /// Assemble a record with an explicit timestamp.
    pub fn build_at(
        ticker: &str,
        indicators: Indicators,
        trend: TrendState,
        insight: Insight,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, RecordError> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(RecordError::EmptyTicker);
        }
        if !is_valid_ticker(ticker) {
            return Err(RecordError::InvalidTicker(ticker.to_string()));
        }
        if !indicators.is_well_formed() {
            return Err(RecordError::MalformedIndicators {
                ticker: ticker.to_string(),
            });
        }
        if insight.text.trim().is_empty() {
            return Err(RecordError::EmptyInsight);
        }

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            ticker: ticker.to_string(),
            // Sub-second precision is dropped so the storage key and the
            // serialized timestamp name the same instant.
            timestamp: timestamp
                .with_nanosecond(0)
                .unwrap_or(timestamp),
            action: Action::recommend(trend, indicators.daily_change_pct),
            indicators,
            trend,
            insight: insight.text,
            insight_source: insight.source,
            dataset_hash: None,
        })
    }

    /// Attach the digest of the series this record was derived from.
    pub fn with_dataset_hash(mut self, hash: impl Into<String>) -> Self {
        self.dataset_hash = Some(hash.into());
        self
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn indicators(&self) -> &Indicators {
        &self.indicators
    }

    pub fn trend(&self) -> TrendState {
        self.trend
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn insight(&self) -> &str {
        &self.insight
    }

    pub fn insight_source(&self) -> InsightSource {
        self.insight_source
    }

    pub fn dataset_hash(&self) -> Option<&str> {
        self.dataset_hash.as_deref()
    }

    /// Key under which the record is persisted:
    /// `analyses/{TICKER}/{timestamp}.json`, with `:` in the timestamp
    /// replaced by `-` so the key is a valid file name everywhere.
    pub fn storage_key(&self) -> String {
        let stamp = self
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Secs, true)
            .replace(':', "-");
        format!("analyses/{}/{stamp}.json", self.ticker)
    }

    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        let record: Self = serde_json::from_str(json)?;
        if record.schema_version > SCHEMA_VERSION {
            return Err(RecordError::UnsupportedSchema {
                found: record.schema_version,
            });
        }
        Ok(record)
    }
}
