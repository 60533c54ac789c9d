//! tickerlab core: price series, indicators, trend classification, insight
//! synthesis, and result records.
//!
//! This crate contains the analysis pipeline for one ticker:
//! - Domain types (price points, validated daily series)
//! - Indicator calculator (latest close, daily change, 10/30 SMAs, average volume)
//! - Trend classifier (moving-average ordering plus qualitative outlook)
//! - Insight synthesizer (optional text generator with deterministic fallback)
//! - Result record (immutable output bundle and its JSON form)
//! - Price data sources (Polygon.io, local CSV) with request pacing
//!
//! Every stage except the generator call is pure.

pub mod data;
pub mod domain;
pub mod indicators;
pub mod insight;
pub mod record;
pub mod trend;
