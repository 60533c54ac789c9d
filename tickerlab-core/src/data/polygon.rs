//! Polygon.io data source.
//!
//! Fetches daily aggregates from the v2 aggregates endpoint. Handles request
//! pacing, exponential backoff on server errors, short `Retry-After` waits
//! on 429, and response parsing. The free tier allows 5 requests per
//! minute, so the default pacer spaces requests 13 seconds apart.

use super::pacer::FetchPacer;
use super::provider::{lookback_start, DataError, PriceDataSource};
use crate::domain::{PricePoint, PriceSeries};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

/// Free-tier spacing between requests.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(13);

/// Longest `Retry-After` the source will sleep through before retrying.
pub const DEFAULT_MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Assumed wait when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Polygon aggregates response.
#[derive(Debug, Deserialize)]
struct AggregatesResponse {
    status: Option<String>,
    #[serde(default)]
    results: Option<Vec<AggregateBar>>,
    error: Option<String>,
    message: Option<String>,
}

/// One daily aggregate. `t` is the bar start in Unix milliseconds.
#[derive(Debug, Deserialize)]
struct AggregateBar {
    t: i64,
    c: f64,
    #[serde(default)]
    v: f64,
}

pub struct PolygonSource {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    pacer: FetchPacer,
    max_retries: u32,
    base_delay: Duration,
    max_retry_after: Duration,
}

impl PolygonSource {
    pub fn new(api_key: impl Into<String>, pacer: FetchPacer) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            pacer,
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_retry_after: DEFAULT_MAX_RETRY_AFTER,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Aggregates URL for a ticker and date range. The API key is sent as a
    /// query parameter separately so it never appears in logs.
    fn aggregates_url(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/v2/aggs/ticker/{ticker}/range/1/day/{}/{}",
            self.base_url,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        )
    }

    /// Parse an aggregates response into a validated series.
    fn parse_response(ticker: &str, resp: AggregatesResponse) -> Result<PriceSeries, DataError> {
        match resp.status.as_deref() {
            Some("OK") | Some("DELAYED") => {}
            Some("NOT_AUTHORIZED") => {
                return Err(DataError::AuthenticationRequired(
                    resp.message.unwrap_or_else(|| "not authorized".into()),
                ))
            }
            other => {
                let detail = resp
                    .error
                    .or(resp.message)
                    .unwrap_or_else(|| "no detail".into());
                return Err(DataError::ResponseFormatChanged(format!(
                    "status {}: {detail}",
                    other.unwrap_or("missing")
                )));
            }
        }

        let results = resp.results.unwrap_or_default();
        if results.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }

        let mut points = Vec::with_capacity(results.len());
        for bar in results {
            let date = DateTime::from_timestamp_millis(bar.t)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {}", bar.t))
                })?;
            points.push(PricePoint::new(date, bar.c, bar.v.max(0.0).round() as u64));
        }

        PriceSeries::from_unsorted(ticker, points).map_err(|source| DataError::InvalidSeries {
            symbol: ticker.to_string(),
            source,
        })
    }

    /// Execute the request with pacing and retry logic.
    fn fetch_with_retry(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let url = self.aggregates_url(ticker, start, end);
        let mut last_error = None;
        let mut next_delay = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = next_delay
                    .take()
                    .unwrap_or_else(|| self.base_delay * 2u32.pow(attempt - 1));
                debug!(ticker, attempt, ?delay, "retrying aggregates request");
                std::thread::sleep(delay);
            }

            self.pacer.wait();

            let sent = self
                .client
                .get(&url)
                .query(&[
                    ("adjusted", "true"),
                    ("sort", "asc"),
                    ("apiKey", self.api_key.as_str()),
                ])
                .send();

            let resp = match sent {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());

            match status_action(status, retry_after, ticker, self.max_retry_after) {
                StatusAction::Parse => {}
                StatusAction::Fail(err) => return Err(err),
                StatusAction::Retry(err) => {
                    warn!(ticker, %status, "Polygon.io server error");
                    last_error = Some(err);
                    continue;
                }
                StatusAction::RetryAfter(wait, err) => {
                    warn!(ticker, wait_secs = wait.as_secs(), "rate limited by Polygon.io");
                    next_delay = Some(wait);
                    last_error = Some(err);
                    continue;
                }
            }

            let body: AggregatesResponse = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!(
                    "failed to parse response for {ticker}: {e}"
                ))
            })?;

            return Self::parse_response(ticker, body);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

/// What to do with a response, decided from its status alone.
#[derive(Debug)]
enum StatusAction {
    Parse,
    Retry(DataError),
    /// Retry after the server-requested wait.
    RetryAfter(Duration, DataError),
    Fail(DataError),
}

/// Map an HTTP status (and `Retry-After`, in seconds) to the next step.
///
/// 401/403 are authentication failures, 404 an unknown symbol, 5xx
/// retryable. 429 is retried after `Retry-After` when that wait is at most
/// `max_retry_after` and reported as `RateLimited` otherwise.
fn status_action(
    status: reqwest::StatusCode,
    retry_after: Option<u64>,
    ticker: &str,
    max_retry_after: Duration,
) -> StatusAction {
    use reqwest::StatusCode;

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StatusAction::Fail(DataError::AuthenticationRequired(format!(
                "Polygon.io rejected the API key (HTTP {status})"
            )))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            let secs = retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            let err = DataError::RateLimited {
                retry_after_secs: secs,
            };
            let wait = Duration::from_secs(secs);
            if wait <= max_retry_after {
                StatusAction::RetryAfter(wait, err)
            } else {
                StatusAction::Fail(err)
            }
        }
        StatusCode::NOT_FOUND => StatusAction::Fail(DataError::SymbolNotFound {
            symbol: ticker.to_string(),
        }),
        s if s.is_server_error() => {
            StatusAction::Retry(DataError::Other(format!("HTTP {status} for {ticker}")))
        }
        s if s.is_success() => StatusAction::Parse,
        _ => StatusAction::Fail(DataError::Other(format!("HTTP {status} for {ticker}"))),
    }
}

impl PriceDataSource for PolygonSource {
    fn name(&self) -> &str {
        "polygon"
    }

    fn fetch(&self, ticker: &str, lookback_days: u32) -> Result<PriceSeries, DataError> {
        let end = Utc::now().date_naive();
        let start = lookback_start(end, lookback_days)?;
        info!(ticker, %start, %end, "fetching daily aggregates");
        let series = self.fetch_with_retry(ticker, start, end)?;
        info!(ticker, points = series.len(), "fetched daily aggregates");
        Ok(series)
    }
}
