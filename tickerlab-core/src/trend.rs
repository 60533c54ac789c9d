//! Trend classifier.
//!
//! Compares the short and long moving averages to label the trend, then
//! picks a qualitative outlook from the sign of the latest daily change.
//! The outlook mapping is a heuristic kept for continuity with earlier
//! output, not a validated signal.

use crate::indicators::Indicators;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NOTE_INSUFFICIENT: &str = "insufficient history";
pub const NOTE_ABOVE: &str = "10-period MA above 30-period MA";
pub const NOTE_BELOW: &str = "10-period MA below 30-period MA";
pub const NOTE_EQUAL: &str = "10-period MA equal to 30-period MA";

pub const OUTLOOK_PULLBACK: &str = "Watch for pullback";
pub const OUTLOOK_MOMENTUM_UP: &str = "Positive momentum continues";
pub const OUTLOOK_REVERSAL: &str = "Possible reversal forming";
pub const OUTLOOK_MOMENTUM_DOWN: &str = "Downward momentum persists";
pub const OUTLOOK_NEUTRAL: &str = "No clear direction, wait for confirmation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendState {
    Uptrend,
    Downtrend,
    Neutral,
}

impl TrendState {
    pub fn label(&self) -> &'static str {
        match self {
            TrendState::Uptrend => "UPTREND",
            TrendState::Downtrend => "DOWNTREND",
            TrendState::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for TrendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Output of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendSignal {
    pub state: TrendState,
    /// Why the state was chosen.
    pub note: &'static str,
    /// Short qualitative phrase for the reader.
    pub outlook: &'static str,
}

/// Size of the latest daily move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveMagnitude {
    /// |change| > 2%
    Large,
    /// |change| > 0.5%
    Moderate,
    Quiet,
}

impl MoveMagnitude {
    pub fn of(daily_change_pct: Option<f64>) -> Self {
        match daily_change_pct.map(f64::abs) {
            Some(c) if c > 2.0 => MoveMagnitude::Large,
            Some(c) if c > 0.5 => MoveMagnitude::Moderate,
            _ => MoveMagnitude::Quiet,
        }
    }

    /// Report line for the move, if it is worth mentioning.
    pub fn describe(&self, daily_change_pct: Option<f64>) -> Option<String> {
        let change = daily_change_pct?;
        match self {
            MoveMagnitude::Large => Some(format!(
                "Large move ({change:+.2}%) - evaluate fundamentals"
            )),
            MoveMagnitude::Moderate => Some(format!("Moderate movement ({change:+.2}%)")),
            MoveMagnitude::Quiet => None,
        }
    }
}

/// Suggested posture derived from trend and daily change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    BuyOnDips,
    HoldWatchSupport,
    Avoid,
    Wait,
}

impl Action {
    pub fn recommend(state: TrendState, daily_change_pct: Option<f64>) -> Self {
        let change = daily_change_pct.unwrap_or(0.0);
        match state {
            TrendState::Uptrend if change > 0.0 => Action::BuyOnDips,
            TrendState::Uptrend => Action::HoldWatchSupport,
            TrendState::Downtrend if change < 0.0 => Action::Avoid,
            _ => Action::Wait,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::BuyOnDips => "HOLD/BUY on dips",
            Action::HoldWatchSupport => "HOLD, watch support",
            Action::Avoid => "AVOID or short setup",
            Action::Wait => "WAIT for confirmation",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify the trend from the two moving averages.
///
/// The state depends only on `sma_short` and `sma_long`; equal averages are
/// always neutral. The daily change only affects the outlook phrase.
pub fn classify(ind: &Indicators) -> TrendSignal {
    let (short, long) = match (ind.sma_short, ind.sma_long) {
        (Some(s), Some(l)) => (s, l),
        _ => {
            return TrendSignal {
                state: TrendState::Neutral,
                note: NOTE_INSUFFICIENT,
                outlook: OUTLOOK_NEUTRAL,
            }
        }
    };

    let change = ind.daily_change_pct;
    if short > long {
        let outlook = match change {
            Some(c) if c < 0.0 => OUTLOOK_PULLBACK,
            _ => OUTLOOK_MOMENTUM_UP,
        };
        TrendSignal {
            state: TrendState::Uptrend,
            note: NOTE_ABOVE,
            outlook,
        }
    } else if short < long {
        let outlook = match change {
            Some(c) if c > 0.0 => OUTLOOK_REVERSAL,
            _ => OUTLOOK_MOMENTUM_DOWN,
        };
        TrendSignal {
            state: TrendState::Downtrend,
            note: NOTE_BELOW,
            outlook,
        }
    } else {
        TrendSignal {
            state: TrendState::Neutral,
            note: NOTE_EQUAL,
            outlook: OUTLOOK_NEUTRAL,
        }
    }
}
