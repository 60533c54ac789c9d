//! CSV export of batch results.
//!
//! One row per record. Absent indicator values are written as empty cells so
//! spreadsheet tools read them as blanks rather than zeros.

use std::path::Path;

use anyhow::{Context, Result};
use tickerlab_core::record::ResultRecord;

const HEADER: [&str; 12] = [
    "ticker",
    "timestamp",
    "latest_close",
    "daily_change_pct",
    "sma_short",
    "sma_long",
    "avg_volume_short",
    "sample_count",
    "trend",
    "action",
    "insight_source",
    "insight",
];

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Export records as a CSV summary table.
pub fn export_summary_csv(records: &[ResultRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(HEADER)?;

    for rec in records {
        let ind = rec.indicators();
        wtr.write_record([
            rec.ticker().to_string(),
            rec.timestamp().to_rfc3339(),
            ind.latest_close.to_string(),
            cell(ind.daily_change_pct),
            cell(ind.sma_short),
            cell(ind.sma_long),
            cell(ind.avg_volume_short),
            ind.sample_count.to_string(),
            rec.trend().to_string(),
            rec.action().to_string(),
            rec.insight_source().to_string(),
            rec.insight().to_string(),
        ])?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

/// Write the CSV summary to `path`, creating parent directories.
pub fn write_summary_csv(records: &[ResultRecord], path: &Path) -> Result<()> {
    let csv = export_summary_csv(records)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tickerlab_core::indicators::Indicators;
    use tickerlab_core::insight::{Insight, InsightSource};
    use tickerlab_core::trend::TrendState;

    fn record(ticker: &str, sma_long: Option<f64>) -> ResultRecord {
        let ind = Indicators {
            latest_close: 10.5,
            daily_change_pct: Some(-1.5),
            sma_short: Some(11.0),
            sma_long,
            avg_volume_short: Some(500.0),
            sample_count: 12,
        };
        let insight = Insight {
            text: "Trend is unclear, wait".into(),
            source: InsightSource::Generator,
        };
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
        ResultRecord::build_at(ticker, ind, TrendState::Neutral, insight, ts).unwrap()
    }

    #[test]
    fn header_and_rows() {
        let csv = export_summary_csv(&[record("AAPL", Some(9.0)), record("MSFT", None)]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ticker,timestamp,latest_close"));
        assert!(lines[1].starts_with("AAPL,2024-01-02T21:00:00+00:00,10.5,-1.5,11,9,500,12,NEUTRAL"));
        assert!(lines[2].starts_with("MSFT,2024-01-02T21:00:00+00:00,10.5,-1.5,11,,500,12,NEUTRAL"));
    }

    #[test]
    fn insight_with_comma_is_quoted() {
        let csv = export_summary_csv(&[record("AAPL", None)]).unwrap();
        assert!(csv.contains(",generator,\"Trend is unclear, wait\""));
    }

    #[test]
    fn empty_input_is_header_only() {
        let csv = export_summary_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/summary.csv");
        write_summary_csv(&[record("AAPL", None)], &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("AAPL"));
    }
}
