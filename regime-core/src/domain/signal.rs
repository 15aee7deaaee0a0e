//! Scoring and replay result records.
//!
//! All of these are plain serializable artifacts handed to the presentation
//! layer; nothing downstream recomputes them. A `SignalRecord` is immutable
//! once the replayer emits it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::verdict::Verdict;

/// One named score contribution with a human-readable rationale.
///
/// A factor family that has no usable input still emits a row (score 0.0,
/// diagnostic rationale) so confidence accounting can see the gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub name: String,
    pub score: f64,
    pub rationale: String,
}

impl Factor {
    pub fn new(name: &str, score: f64, rationale: impl Into<String>) -> Self {
        Factor {
            name: name.to_string(),
            score,
            rationale: rationale.into(),
        }
    }

    /// Diagnostic zero-score row for a family with missing input.
    pub fn no_data(name: &str, rationale: impl Into<String>) -> Self {
        Factor::new(name, 0.0, rationale)
    }
}

/// Full scoring output for one asset at one point in time.
///
/// Factor rows are in insertion order (volatility, positioning, momentum,
/// liquidity, correlation, trend filter), never sorted by magnitude. The
/// total equals the sum of the rows, including the trend-filter adjustment
/// row when that family is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    pub factors: Vec<Factor>,
    pub total_score: f64,
    pub verdict: Verdict,
    pub confidence: f64,
}

impl Scorecard {
    /// Well-formed "no data" card: single diagnostic row, zero total, zero
    /// confidence. Returned instead of an error whenever the feature frame
    /// is too thin to score.
    pub fn no_data(reason: impl Into<String>) -> Self {
        Scorecard {
            factors: vec![Factor::no_data("No Data", reason)],
            total_score: 0.0,
            verdict: Verdict::NoData,
            confidence: 0.0,
        }
    }
}

/// One walk-forward checkpoint: the scorecard as it would have been
/// produced on `date` using only data visible at `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub date: NaiveDate,
    pub total_score: f64,
    pub verdict: Verdict,
    pub confidence: f64,
    pub factors: Vec<Factor>,
}

/// Checkpoint records sorted ascending by date.
pub type SignalSeries = Vec<SignalRecord>;

/// One day of an equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub price: f64,
    pub equity: f64,
}
