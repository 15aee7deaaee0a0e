//! Trend validation: did the replayed signals carry their weight?
//!
//! The validator holds the asset long while the most recent signal is
//! bullish and sits in cash otherwise, compounds that into an equity
//! curve against Buy & Hold, and separately grades each directional call
//! against the realized forward return over the configured horizon. It is
//! deliberately fee-free; fees and trailing stops belong to the
//! trade-level simulation, not to regime validation.

pub mod metrics;

use chrono::Months;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BacktestSettings;
use crate::data::align::asof_index;
use crate::domain::{Dataset, Direction, EquityPoint, SignalSeries};

use metrics::{daily_returns, max_drawdown_pct, sharpe_ratio, total_return_pct};

/// Outcome tally for directional calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub bullish_correct: usize,
    pub bullish_wrong: usize,
    pub bearish_correct: usize,
    pub bearish_wrong: usize,
    /// Forward return exactly zero: evaluated, neither correct nor wrong.
    pub ties: usize,
    /// Neutral or no-data verdicts, never graded.
    pub non_directional: usize,
    /// Directional calls whose horizon runs past the price history.
    pub unresolved: usize,
}

impl ConfusionCounts {
    pub fn evaluated(&self) -> usize {
        self.bullish_correct + self.bullish_wrong + self.bearish_correct + self.bearish_wrong
            + self.ties
    }

    pub fn correct(&self) -> usize {
        self.bullish_correct + self.bearish_correct
    }

    pub fn wrong(&self) -> usize {
        self.bullish_wrong + self.bearish_wrong
    }
}

/// Aggregate performance of a signal series over one asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub strategy_return_pct: f64,
    pub strategy_max_drawdown_pct: f64,
    pub strategy_sharpe: f64,
    pub buy_hold_return_pct: f64,
    pub buy_hold_max_drawdown_pct: f64,
    pub buy_hold_sharpe: f64,
    /// How much shallower the strategy's worst drawdown was, in points.
    pub drawdown_reduction_pct: f64,
    /// correct / (correct + wrong), ties excluded. 0.0 with nothing graded.
    pub directional_accuracy: f64,
    /// evaluated / total signals. 0.0 with no signals.
    pub coverage: f64,
    pub counts: ConfusionCounts,
}

/// Full validation artifact: metrics plus both curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub metrics: ValidationMetrics,
    pub equity: Vec<EquityPoint>,
    pub buy_hold: Vec<EquityPoint>,
}

impl ValidationReport {
    fn empty() -> Self {
        ValidationReport {
            metrics: ValidationMetrics::default(),
            equity: Vec::new(),
            buy_hold: Vec::new(),
        }
    }
}

/// Validate a signal series against the asset's realized prices.
///
/// Degenerate input (under two price rows, no signals) yields an empty
/// report rather than an error.
pub fn validate(
    price: &Dataset,
    signals: &SignalSeries,
    settings: &BacktestSettings,
) -> ValidationReport {
    let close = match price.column("close") {
        Some(c) if price.len() >= 2 => c,
        _ => return ValidationReport::empty(),
    };
    if signals.is_empty() {
        return ValidationReport::empty();
    }

    let positions = position_series(&price.dates, signals);
    let (equity, buy_hold) = equity_curves(price, close, &positions, settings.initial_capital);

    let strat: Vec<f64> = equity.iter().map(|p| p.equity).collect();
    let bh: Vec<f64> = buy_hold.iter().map(|p| p.equity).collect();
    let strat_dd = max_drawdown_pct(&strat);
    let bh_dd = max_drawdown_pct(&bh);

    let counts = grade_directions(price, close, signals, settings.horizon_months);
    let graded = counts.correct() + counts.wrong();
    let directional_accuracy = if graded > 0 {
        counts.correct() as f64 / graded as f64
    } else {
        0.0
    };
    let coverage = counts.evaluated() as f64 / signals.len() as f64;

    debug!(
        signals = signals.len(),
        evaluated = counts.evaluated(),
        accuracy = directional_accuracy,
        "validation complete"
    );

    ValidationReport {
        metrics: ValidationMetrics {
            strategy_return_pct: total_return_pct(&strat),
            strategy_max_drawdown_pct: strat_dd,
            strategy_sharpe: sharpe_ratio(&daily_returns(&strat)),
            buy_hold_return_pct: total_return_pct(&bh),
            buy_hold_max_drawdown_pct: bh_dd,
            buy_hold_sharpe: sharpe_ratio(&daily_returns(&bh)),
            drawdown_reduction_pct: bh_dd - strat_dd,
            directional_accuracy,
            coverage,
            counts,
        },
        equity,
        buy_hold,
    }
}

/// 1.0 while the most recent signal at or before each price date is
/// bullish, 0.0 otherwise (including before the first signal).
fn position_series(dates: &[chrono::NaiveDate], signals: &SignalSeries) -> Vec<f64> {
    let signal_dates: Vec<chrono::NaiveDate> = signals.iter().map(|s| s.date).collect();
    dates
        .iter()
        .map(|&d| match asof_index(&signal_dates, d) {
            Some(i) if signals[i].verdict.direction() == Direction::Bullish => 1.0,
            _ => 0.0,
        })
        .collect()
}

/// Compound both curves from the same starting capital. A signal takes
/// effect the day it is emitted: day i's return (close i-1 → close i)
/// accrues to the position flagged on day i itself.
fn equity_curves(
    price: &Dataset,
    close: &[f64],
    positions: &[f64],
    capital: f64,
) -> (Vec<EquityPoint>, Vec<EquityPoint>) {
    let n = price.len();
    let mut equity = Vec::with_capacity(n);
    let mut buy_hold = Vec::with_capacity(n);
    let mut strat = capital;

    for i in 0..n {
        if i > 0 && close[i - 1] != 0.0 {
            let r = close[i] / close[i - 1] - 1.0;
            strat *= 1.0 + positions[i] * r;
        }
        let bh = if close[0] != 0.0 {
            capital * close[i] / close[0]
        } else {
            capital
        };
        equity.push(EquityPoint {
            date: price.dates[i],
            price: close[i],
            equity: strat,
        });
        buy_hold.push(EquityPoint {
            date: price.dates[i],
            price: close[i],
            equity: bh,
        });
    }
    (equity, buy_hold)
}

/// Grade each directional call against the realized return over
/// `horizon_months` calendar months. The forward price is the backward
/// as-of price at the horizon date; a horizon past the last price row
/// leaves the call unresolved.
fn grade_directions(
    price: &Dataset,
    close: &[f64],
    signals: &SignalSeries,
    horizon_months: u32,
) -> ConfusionCounts {
    let mut counts = ConfusionCounts::default();
    let last_date = match price.dates.last() {
        Some(&d) => d,
        None => return counts,
    };

    for signal in signals {
        let direction = signal.verdict.direction();
        if !matches!(direction, Direction::Bullish | Direction::Bearish) {
            counts.non_directional += 1;
            continue;
        }
        let horizon_date = match signal.date.checked_add_months(Months::new(horizon_months)) {
            Some(d) if d <= last_date => d,
            _ => {
                counts.unresolved += 1;
                continue;
            }
        };
        let base = asof_index(&price.dates, signal.date).map(|i| close[i]);
        let forward = asof_index(&price.dates, horizon_date).map(|i| close[i]);
        let (base, forward) = match (base, forward) {
            (Some(b), Some(f)) if b != 0.0 && !b.is_nan() && !f.is_nan() => (b, f),
            _ => {
                counts.unresolved += 1;
                continue;
            }
        };

        let ret = forward / base - 1.0;
        if ret == 0.0 {
            counts.ties += 1;
        } else {
            match direction {
                Direction::Bullish if ret > 0.0 => counts.bullish_correct += 1,
                Direction::Bullish => counts.bullish_wrong += 1,
                Direction::Bearish if ret < 0.0 => counts.bearish_correct += 1,
                Direction::Bearish => counts.bearish_wrong += 1,
                Direction::Flat | Direction::Unknown => {}
            }
        }
    }
    counts
}
