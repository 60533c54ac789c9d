//! Property tests for the analysis pipeline.
//!
//! Uses proptest to verify:
//! 1. Moving-average presence depends only on series length
//! 2. Classification depends only on the two moving averages
//! 3. Equal moving averages are always neutral
//! 4. The fallback insight is byte-identical across calls

use chrono::NaiveDate;
use proptest::prelude::*;
use tickerlab_core::domain::{PricePoint, PriceSeries};
use tickerlab_core::indicators::{compute, Indicators, LONG_WINDOW, SHORT_WINDOW};
use tickerlab_core::insight::{fallback_text, synthesize, InsightOptions, InsightSource};
use tickerlab_core::trend::{classify, TrendState};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (1.0..1000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_closes(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(arb_price(), 1..max_len)
}

fn arb_change() -> impl Strategy<Value = Option<f64>> {
    prop::option::of(-20.0..20.0_f64)
}

fn series_from(closes: &[f64]) -> PriceSeries {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let points = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PricePoint::new(base + chrono::Duration::days(i as i64), c, 500_000))
        .collect();
    PriceSeries::new("PROP", points).unwrap()
}

fn indicators(short: Option<f64>, long: Option<f64>, change: Option<f64>) -> Indicators {
    Indicators {
        latest_close: 100.0,
        daily_change_pct: change,
        sma_short: short,
        sma_long: long,
        avg_volume_short: Some(1.0),
        sample_count: 30,
    }
}

// ── 1. Presence by length ────────────────────────────────────────────

proptest! {
    #[test]
    fn averages_present_iff_window_fits(closes in arb_closes(60)) {
        let ind = compute(&series_from(&closes)).unwrap();
        prop_assert_eq!(ind.sma_short.is_some(), closes.len() >= SHORT_WINDOW);
        prop_assert_eq!(ind.avg_volume_short.is_some(), closes.len() >= SHORT_WINDOW);
        prop_assert_eq!(ind.sma_long.is_some(), closes.len() >= LONG_WINDOW);
        prop_assert_eq!(ind.latest_close, *closes.last().unwrap());
        prop_assert_eq!(ind.daily_change_pct.is_some(), closes.len() >= 2);
    }

    #[test]
    fn averages_use_only_trailing_window(
        prefix in arb_closes(40),
        tail in prop::collection::vec(arb_price(), LONG_WINDOW..=LONG_WINDOW),
    ) {
        let mut full = prefix.clone();
        full.extend_from_slice(&tail);
        let with_prefix = compute(&series_from(&full)).unwrap();
        let tail_only = compute(&series_from(&tail)).unwrap();
        prop_assert_eq!(with_prefix.sma_short, tail_only.sma_short);
        prop_assert_eq!(with_prefix.sma_long, tail_only.sma_long);
    }
}

// ── 2/3. Classification laws ─────────────────────────────────────────

proptest! {
    #[test]
    fn equal_averages_always_neutral(avg in arb_price(), change in arb_change()) {
        let sig = classify(&indicators(Some(avg), Some(avg), change));
        prop_assert_eq!(sig.state, TrendState::Neutral);
    }

    #[test]
    fn state_ignores_everything_but_averages(
        short in arb_price(),
        long in arb_price(),
        change_a in arb_change(),
        change_b in arb_change(),
    ) {
        let a = classify(&indicators(Some(short), Some(long), change_a));
        let mut other = indicators(Some(short), Some(long), change_b);
        other.latest_close = 1.0;
        other.avg_volume_short = None;
        other.sample_count = 999;
        let b = classify(&other);
        prop_assert_eq!(a.state, b.state);
        prop_assert_eq!(a.note, b.note);
    }

    #[test]
    fn ordering_decides_direction(short in arb_price(), long in arb_price()) {
        let state = classify(&indicators(Some(short), Some(long), None)).state;
        let expected = if short > long {
            TrendState::Uptrend
        } else if short < long {
            TrendState::Downtrend
        } else {
            TrendState::Neutral
        };
        prop_assert_eq!(state, expected);
    }

    #[test]
    fn flat_series_is_neutral(price in arb_price(), len in LONG_WINDOW..60usize) {
        let ind = compute(&series_from(&vec![price; len])).unwrap();
        prop_assert_eq!(ind.sma_short, ind.sma_long);
        prop_assert_eq!(classify(&ind).state, TrendState::Neutral);
    }
}

// ── 4. Fallback determinism ──────────────────────────────────────────

proptest! {
    #[test]
    fn fallback_is_byte_identical(closes in arb_closes(50)) {
        let ind = compute(&series_from(&closes)).unwrap();
        let sig = classify(&ind);
        let first = synthesize("PROP", &ind, &sig, None, &InsightOptions::default());
        let second = synthesize("PROP", &ind, &sig, None, &InsightOptions::default());
        prop_assert_eq!(first.source, InsightSource::Fallback);
        prop_assert!(!first.text.is_empty());
        prop_assert_eq!(first.text.as_bytes(), second.text.as_bytes());
        prop_assert_eq!(first.text, fallback_text("PROP", &sig));
    }
}
