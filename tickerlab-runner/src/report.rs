//! Console rendering of analysis results.

use std::fmt::Write as _;

use tickerlab_core::record::ResultRecord;
use tickerlab_core::trend::MoveMagnitude;

use crate::runner::{BatchEvent, BatchSummary};

const RULE_WIDTH: usize = 60;
const NA: &str = "n/a";

/// `$189.98`, or `n/a` when absent.
pub fn format_currency(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| format!("${v:.2}"))
}

/// `+1.25%` / `-0.40%`, or `n/a` when absent.
pub fn format_percent(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| format!("{v:+.2}%"))
}

/// Rounded and comma-grouped, e.g. `52,345,679`.
pub fn format_volume(value: Option<f64>) -> String {
    let Some(v) = value else {
        return NA.to_string();
    };
    let rounded = v.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        grouped.insert(0, '-');
    }
    grouped
}

/// Multi-line report for one record.
pub fn render_report(record: &ResultRecord) -> String {
    let ind = record.indicators();
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Analysis: {}", record.ticker());
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Stock Data:");
    let _ = writeln!(out, "  Latest Close:     {}", format_currency(Some(ind.latest_close)));
    let _ = writeln!(out, "  Daily Change:     {}", format_percent(ind.daily_change_pct));
    if let Some(desc) = MoveMagnitude::of(ind.daily_change_pct).describe(ind.daily_change_pct) {
        let _ = writeln!(out, "  Move:             {desc}");
    }
    let _ = writeln!(out, "  SMA(10):          {}", format_currency(ind.sma_short));
    let _ = writeln!(out, "  SMA(30):          {}", format_currency(ind.sma_long));
    let _ = writeln!(out, "  Avg Volume (10):  {}", format_volume(ind.avg_volume_short));
    let _ = writeln!(out, "  Data Points:      {}", ind.sample_count);
    let _ = writeln!(out);
    let _ = writeln!(out, "Trend:  {}", record.trend());
    let _ = writeln!(out, "Action: {}", record.action());
    let _ = writeln!(out);
    let _ = writeln!(out, "Insight ({}):", record.insight_source());
    let _ = writeln!(out, "  {}", record.insight());
    let _ = writeln!(out);
    let _ = writeln!(out, "Analyzed at {}", record.timestamp().to_rfc3339());
    let _ = write!(out, "{rule}");
    out
}

/// One-line footer for a finished batch.
pub fn render_summary(summary: &BatchSummary) -> String {
    let mut line = format!(
        "{} of {} ticker(s) analyzed",
        summary.succeeded(),
        summary.total
    );
    if !summary.saved.is_empty() {
        let _ = write!(line, ", {} saved", summary.saved.len());
    }
    if summary.store_failures > 0 {
        let _ = write!(line, ", {} save failure(s)", summary.store_failures);
    }
    let _ = write!(line, " in {:.1}s", summary.elapsed_secs);
    line
}

/// Progress callback that prints reports to stdout as a batch runs.
pub fn print_event(event: &BatchEvent) {
    match event {
        BatchEvent::Started { ticker, index, total } => {
            println!("\n[{}/{}] {ticker}", index + 1, total);
        }
        BatchEvent::Analyzed(record) => println!("{}", render_report(record)),
        BatchEvent::Saved { key, .. } => println!("Saved: {key}"),
        BatchEvent::Failed { ticker, error } => println!("FAIL: {ticker}: {error}"),
        BatchEvent::StoreFailed { ticker, error } => {
            println!("WARN: could not save {ticker}: {error}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tickerlab_core::indicators::Indicators;
    use tickerlab_core::insight::{Insight, InsightSource};
    use tickerlab_core::trend::TrendState;

    #[test]
    fn currency_and_percent() {
        assert_eq!(format_currency(Some(189.98)), "$189.98");
        assert_eq!(format_currency(Some(39.0)), "$39.00");
        assert_eq!(format_currency(None), "n/a");
        assert_eq!(format_percent(Some(1.25)), "+1.25%");
        assert_eq!(format_percent(Some(-0.4)), "-0.40%");
        assert_eq!(format_percent(Some(0.0)), "+0.00%");
        assert_eq!(format_percent(None), "n/a");
    }

    #[test]
    fn volume_grouping() {
        assert_eq!(format_volume(Some(52_345_678.6)), "52,345,679");
        assert_eq!(format_volume(Some(999.0)), "999");
        assert_eq!(format_volume(Some(1_000.0)), "1,000");
        assert_eq!(format_volume(Some(0.0)), "0");
        assert_eq!(format_volume(None), "n/a");
    }

    fn record(change: Option<f64>, sma_long: Option<f64>) -> ResultRecord {
        let ind = Indicators {
            latest_close: 39.0,
            daily_change_pct: change,
            sma_short: Some(34.5),
            sma_long,
            avg_volume_short: Some(1_234_567.0),
            sample_count: 40,
        };
        let insight = Insight {
            text: "AAPL is in UPTREND".into(),
            source: InsightSource::Fallback,
        };
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        ResultRecord::build_at("AAPL", ind, TrendState::Uptrend, insight, ts).unwrap()
    }

    #[test]
    fn report_contains_values() {
        let text = render_report(&record(Some(2.63), Some(24.5)));
        assert!(text.contains("Analysis: AAPL"));
        assert!(text.contains("$39.00"));
        assert!(text.contains("+2.63%"));
        assert!(text.contains("$24.50"));
        assert!(text.contains("1,234,567"));
        assert!(text.contains("Trend:  UPTREND"));
        assert!(text.contains("Insight (fallback):"));
        assert!(text.contains("AAPL is in UPTREND"));
        assert!(text.contains("Move:             Large move (+2.63%)"));
    }

    #[test]
    fn report_marks_absent_values() {
        let text = render_report(&record(None, None));
        assert!(text.contains("Daily Change:     n/a\n"));
        assert!(text.contains("SMA(30):          n/a"));
    }

    #[test]
    fn summary_line() {
        let summary = BatchSummary {
            total: 3,
            records: vec![record(Some(1.0), Some(24.5))],
            saved: vec!["k".into()],
            elapsed_secs: 1.5,
            ..Default::default()
        };
        assert_eq!(render_summary(&summary), "1 of 3 ticker(s) analyzed, 1 saved in 1.5s");
    }
}
