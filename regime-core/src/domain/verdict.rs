//! Discrete directional verdicts.
//!
//! The legacy scorer bands totals into the five-way set, the compass scorer
//! into the three-way trend set. Both collapse to a `Direction` for the
//! validator, which only cares whether a call was bullish or bearish.

use serde::{Deserialize, Serialize};

/// Discretized directional call derived from a total composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    // Five-way legacy bands
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
    // Three-way compass bands
    BullishTrend,
    BearishTrend,
    /// Confidence collapsed or the feature frame was too thin to score.
    NoData,
}

/// Direction of a verdict, as the backtester consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Bullish,
    Flat,
    Bearish,
    Unknown,
}

impl Verdict {
    pub fn direction(self) -> Direction {
        match self {
            Verdict::StrongBuy | Verdict::Buy | Verdict::BullishTrend => Direction::Bullish,
            Verdict::Sell | Verdict::StrongSell | Verdict::BearishTrend => Direction::Bearish,
            Verdict::Neutral => Direction::Flat,
            Verdict::NoData => Direction::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Verdict::StrongBuy => "Strong Buy",
            Verdict::Buy => "Buy",
            Verdict::Neutral => "Neutral",
            Verdict::Sell => "Sell",
            Verdict::StrongSell => "Strong Sell",
            Verdict::BullishTrend => "Bullish Trend",
            Verdict::BearishTrend => "Bearish Trend",
            Verdict::NoData => "No Data",
        }
    }
}
