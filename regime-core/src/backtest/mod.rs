//! Trade-level simulation of acting on the signal series.
//!
//! Where the trend validator asks "was the regime call right", this module
//! asks "what would trading it have cost": entries are sized by signal
//! confidence, every fill pays the configured fee, and an open position is
//! closed the day price falls a configured fraction below its high-water
//! mark. One position at a time, long or flat, marked to close daily.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BacktestSettings;
use crate::data::align::asof_index;
use crate::domain::{Dataset, Direction, EquityPoint, SignalSeries};
use crate::validate::metrics::{daily_returns, max_drawdown_pct, sharpe_ratio, total_return_pct};

/// Why a fill happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    /// Entered long on a bullish signal while flat.
    Buy,
    /// Closed because the standing signal stopped being bullish.
    Exit,
    /// Closed by the trailing stop off the high-water mark.
    TrailStop,
}

impl TradeAction {
    pub fn label(&self) -> &'static str {
        match self {
            TradeAction::Buy => "buy",
            TradeAction::Exit => "exit",
            TradeAction::TrailStop => "trail_stop",
        }
    }
}

/// One fill in the trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub date: chrono::NaiveDate,
    pub action: TradeAction,
    pub price: f64,
    pub units: f64,
    pub equity: f64,
}

/// Curve-level performance of the simulated account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestMetrics {
    pub total_return_pct: f64,
    pub max_drawdown_pct: f64,
    pub sharpe: f64,
    pub trades: usize,
}

/// Full simulation artifact: metrics, daily equity, trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub metrics: BacktestMetrics,
    pub equity: Vec<EquityPoint>,
    pub trades: Vec<TradeEvent>,
}

impl BacktestReport {
    fn empty() -> Self {
        BacktestReport {
            metrics: BacktestMetrics::default(),
            equity: Vec::new(),
            trades: Vec::new(),
        }
    }
}

/// Simulate trading the signal series over the asset's realized prices.
///
/// Fills happen at the day's close. An entry commits `confidence` (clamped
/// to [0, 1]) of available cash, less the fee; exits pay the fee on
/// proceeds. After a trailing stop the account sits flat until the next
/// day, then re-enters if the standing signal is still bullish.
///
/// Degenerate input (under two price rows, no signals) yields an empty
/// report rather than an error.
pub fn run_backtest(
    price: &Dataset,
    signals: &SignalSeries,
    settings: &BacktestSettings,
) -> BacktestReport {
    let close = match price.column("close") {
        Some(c) if price.len() >= 2 => c,
        _ => return BacktestReport::empty(),
    };
    if signals.is_empty() {
        return BacktestReport::empty();
    }

    let signal_dates: Vec<chrono::NaiveDate> = signals.iter().map(|s| s.date).collect();
    let mut cash = settings.initial_capital;
    let mut units = 0.0_f64;
    let mut high_watermark = 0.0_f64;
    let mut equity = Vec::with_capacity(price.len());
    let mut trades = Vec::new();

    for (i, &date) in price.dates.iter().enumerate() {
        let px = close[i];
        if !px.is_finite() || px <= 0.0 {
            // Unusable mark: hold state, carry equity at the last cash value.
            equity.push(EquityPoint {
                date,
                price: px,
                equity: cash + units * high_watermark,
            });
            continue;
        }

        let standing = asof_index(&signal_dates, date).map(|j| &signals[j]);
        let bullish = standing
            .map(|s| s.verdict.direction() == Direction::Bullish)
            .unwrap_or(false);

        if units > 0.0 {
            high_watermark = high_watermark.max(px);
            let off_peak = px / high_watermark - 1.0;
            if off_peak <= -settings.trailing_stop_pct {
                cash += units * px * (1.0 - settings.fee_pct);
                trades.push(TradeEvent {
                    date,
                    action: TradeAction::TrailStop,
                    price: px,
                    units,
                    equity: cash,
                });
                units = 0.0;
            } else if !bullish {
                cash += units * px * (1.0 - settings.fee_pct);
                trades.push(TradeEvent {
                    date,
                    action: TradeAction::Exit,
                    price: px,
                    units,
                    equity: cash,
                });
                units = 0.0;
            }
        } else if bullish {
            let confidence = standing.map(|s| s.confidence).unwrap_or(0.0);
            let invested = cash * confidence.clamp(0.0, 1.0);
            if invested > 0.0 {
                units = invested * (1.0 - settings.fee_pct) / px;
                cash -= invested;
                high_watermark = px;
                trades.push(TradeEvent {
                    date,
                    action: TradeAction::Buy,
                    price: px,
                    units,
                    equity: cash + units * px,
                });
            }
        }

        equity.push(EquityPoint {
            date,
            price: px,
            equity: cash + units * px,
        });
    }

    let curve: Vec<f64> = equity.iter().map(|p| p.equity).collect();
    let metrics = BacktestMetrics {
        total_return_pct: total_return_pct(&curve),
        max_drawdown_pct: max_drawdown_pct(&curve),
        sharpe: sharpe_ratio(&daily_returns(&curve)),
        trades: trades.len(),
    };
    debug!(
        trades = trades.len(),
        total_return_pct = metrics.total_return_pct,
        "backtest complete"
    );

    BacktestReport {
        metrics,
        equity,
        trades,
    }
}
