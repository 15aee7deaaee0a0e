//! Typed, validated configuration.
//!
//! Every threshold the scoring engine, replayer, or backtester reads lives
//! here, grouped by concern and loaded once at process entry from TOML.
//! There is no global singleton: construct a `Config` and pass it (or a
//! narrow view of it) into each component. Validation errors are fatal at
//! load — nothing re-reads configuration mid-computation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Which scoring strategy the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerMode {
    /// Sigma-multiple volatility thresholds, five-way verdict bands.
    Legacy,
    /// Trailing-quantile volatility thresholds, three-way trend bands.
    Compass,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub assets: AssetSettings,
    pub windows: WindowSettings,
    pub signals: SignalSettings,
    pub scoring: ScoringSettings,
    pub backtest: BacktestSettings,
}

impl Config {
    /// Load and validate a TOML config file. Missing keys fall back to
    /// defaults; present-but-invalid values are fatal.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.windows.validate()?;
        self.signals.validate()?;
        self.scoring.validate()?;
        self.backtest.validate()?;
        Ok(())
    }
}

/// Per-asset data boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    pub btc_price_start: NaiveDate,
    pub eth_price_start: NaiveDate,
    pub btc_cot_min_date: NaiveDate,
    pub eth_cot_min_date: NaiveDate,
    pub macro_min_date: NaiveDate,
}

impl Default for AssetSettings {
    fn default() -> Self {
        let d = |y, m, dd| NaiveDate::from_ymd_opt(y, m, dd).unwrap();
        AssetSettings {
            btc_price_start: d(2014, 9, 17),
            eth_price_start: d(2015, 8, 7),
            btc_cot_min_date: d(2020, 5, 12),
            eth_cot_min_date: d(2023, 3, 28),
            macro_min_date: d(2014, 9, 17),
        }
    }
}

impl AssetSettings {
    /// Earliest usable positioning-report date for an asset key.
    pub fn cot_min_date(&self, asset: &str) -> NaiveDate {
        match asset {
            "eth" => self.eth_cot_min_date,
            _ => self.btc_cot_min_date,
        }
    }
}

/// Rolling-window sizes for the feature builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    /// Volatility-index deviation: rolling mean window (observations).
    pub vix_dev_window: usize,
    /// Positioning min-max oscillator window (report periods).
    pub cot_oscillator_window: usize,
    /// Positioning z-score window (report periods).
    pub zscore_window: usize,
    /// Minimum periods before the z-score becomes valid.
    pub zscore_min_periods: usize,
    /// Momentum / auxiliary % change window (observations).
    pub momentum_window: usize,
    /// Rolling correlation window and minimum valid pairs.
    pub corr_window: usize,
    pub corr_min_periods: usize,
    /// Trend-filter moving average window and minimum periods.
    pub ma_window: usize,
    pub ma_min_periods: usize,
    /// Forward-return horizon for training frames (observations).
    pub target_horizon: usize,
    /// Trailing lookback for quantile thresholds (observations).
    pub quantile_lookback: usize,
}

impl Default for WindowSettings {
    fn default() -> Self {
        WindowSettings {
            vix_dev_window: 252,
            cot_oscillator_window: 26,
            zscore_window: 104,
            zscore_min_periods: 52,
            momentum_window: 30,
            corr_window: 60,
            corr_min_periods: 30,
            ma_window: 200,
            ma_min_periods: 100,
            target_horizon: 30,
            quantile_lookback: 504,
        }
    }
}

impl WindowSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.vix_dev_window < 2 {
            return Err(invalid("windows.vix_dev_window", "must be >= 2"));
        }
        if self.cot_oscillator_window < 2 {
            return Err(invalid("windows.cot_oscillator_window", "must be >= 2"));
        }
        if self.zscore_window < 2 {
            return Err(invalid("windows.zscore_window", "must be >= 2"));
        }
        if self.zscore_min_periods < 2 || self.zscore_min_periods > self.zscore_window {
            return Err(invalid(
                "windows.zscore_min_periods",
                "must be in 2..=zscore_window",
            ));
        }
        if self.momentum_window == 0 {
            return Err(invalid("windows.momentum_window", "must be >= 1"));
        }
        if self.corr_min_periods < 2 || self.corr_min_periods > self.corr_window {
            return Err(invalid(
                "windows.corr_min_periods",
                "must be in 2..=corr_window",
            ));
        }
        if self.ma_min_periods == 0 || self.ma_min_periods > self.ma_window {
            return Err(invalid(
                "windows.ma_min_periods",
                "must be in 1..=ma_window",
            ));
        }
        if self.target_horizon == 0 {
            return Err(invalid("windows.target_horizon", "must be >= 1"));
        }
        if self.quantile_lookback < 20 {
            return Err(invalid("windows.quantile_lookback", "must be >= 20"));
        }
        Ok(())
    }
}

/// Walk-forward replay schedule and minimum-data floors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSettings {
    /// Checkpoint spacing in bars for the legacy scorer.
    pub step_days: usize,
    /// Checkpoint spacing in bars for the compass scorer.
    pub compass_step_days: usize,
    /// First checkpoint at max(min_start_bars, len * start_fraction).
    pub start_fraction: f64,
    pub min_start_bars: usize,
    /// Price history shorter than this yields an empty signal series.
    pub min_price_rows: usize,
    /// Feature frames thinner than this score as "no data".
    pub min_feature_rows: usize,
    /// Confidence at or below this forces the NoData verdict.
    pub confidence_epsilon: f64,
}

impl Default for SignalSettings {
    fn default() -> Self {
        SignalSettings {
            step_days: 7,
            compass_step_days: 30,
            start_fraction: 0.5,
            min_start_bars: 200,
            min_price_rows: 300,
            min_feature_rows: 50,
            confidence_epsilon: 1e-9,
        }
    }
}

impl SignalSettings {
    /// Checkpoint spacing for the given scorer mode.
    pub fn step_for(&self, mode: ScorerMode) -> usize {
        match mode {
            ScorerMode::Legacy => self.step_days,
            ScorerMode::Compass => self.compass_step_days,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.step_days == 0 || self.compass_step_days == 0 {
            return Err(invalid("signals.step_days", "must be >= 1"));
        }
        if !(0.0..=1.0).contains(&self.start_fraction) {
            return Err(invalid("signals.start_fraction", "must be in [0, 1]"));
        }
        if self.min_feature_rows == 0 {
            return Err(invalid("signals.min_feature_rows", "must be >= 1"));
        }
        if !self.confidence_epsilon.is_finite() || self.confidence_epsilon < 0.0 {
            return Err(invalid(
                "signals.confidence_epsilon",
                "must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

/// Factor scores, thresholds, and verdict bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    pub mode: ScorerMode,

    // Five-way verdict bands (legacy). Ordered strong_sell < sell < 0 < buy
    // < strong_buy so banding is monotonic in the total.
    pub verdict_strong_buy: f64,
    pub verdict_buy: f64,
    pub verdict_sell: f64,
    pub verdict_strong_sell: f64,

    // Three-way trend bands (compass).
    pub compass_bullish: f64,
    pub compass_bearish: f64,

    pub trend_filter_enabled: bool,
    pub trend_penalty_multiplier: f64,

    pub vix_enabled: bool,
    pub vix_strong_risk_on_score: f64,
    pub vix_risk_on_score: f64,
    pub vix_strong_risk_off_score: f64,
    pub vix_risk_off_score: f64,

    pub momentum_enabled: bool,
    pub momentum_strong_move_pct: f64,
    pub momentum_score: f64,

    pub liquidity_enabled: bool,
    pub liquidity_dxy_strong_pct: f64,
    pub liquidity_us10y_spike_pct: f64,
    pub liquidity_score_each: f64,

    pub correlation_enabled: bool,
    pub corr_threshold: f64,
    pub corr_base: f64,
    pub corr_slope: f64,

    pub cot_enabled: bool,
    pub cot_strong_score: f64,
    pub cot_score: f64,
    /// Absolute oscillator floor: at or below this is strong bear even when
    /// the trailing 5th percentile sits higher.
    pub cot_floor: f64,
    /// Commercial z-score magnitude that triggers the overlay bonus/penalty.
    pub cot_z_extreme: f64,
    pub cot_z_bonus: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        ScoringSettings {
            mode: ScorerMode::Compass,
            verdict_strong_buy: 4.0,
            verdict_buy: 1.5,
            verdict_sell: -1.5,
            verdict_strong_sell: -4.0,
            compass_bullish: 1.5,
            compass_bearish: -1.5,
            trend_filter_enabled: true,
            trend_penalty_multiplier: 0.5,
            vix_enabled: true,
            vix_strong_risk_on_score: 3.0,
            vix_risk_on_score: 1.8,
            vix_strong_risk_off_score: -3.0,
            vix_risk_off_score: -1.8,
            momentum_enabled: true,
            momentum_strong_move_pct: 18.0,
            momentum_score: 0.9,
            liquidity_enabled: true,
            liquidity_dxy_strong_pct: 6.0,
            liquidity_us10y_spike_pct: 12.0,
            liquidity_score_each: 0.8,
            correlation_enabled: true,
            corr_threshold: 0.82,
            corr_base: 0.7,
            corr_slope: -0.7,
            cot_enabled: true,
            cot_strong_score: 2.0,
            cot_score: 1.0,
            cot_floor: 0.0,
            cot_z_extreme: 3.0,
            cot_z_bonus: 0.5,
        }
    }
}

impl ScoringSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.verdict_strong_sell < self.verdict_sell
            && self.verdict_sell < 0.0
            && 0.0 < self.verdict_buy
            && self.verdict_buy < self.verdict_strong_buy)
        {
            return Err(invalid(
                "scoring.verdict_*",
                "bands must satisfy strong_sell < sell < 0 < buy < strong_buy",
            ));
        }
        if !(self.compass_bearish < 0.0 && 0.0 < self.compass_bullish) {
            return Err(invalid(
                "scoring.compass_*",
                "bands must satisfy bearish < 0 < bullish",
            ));
        }
        if !(0.0 < self.trend_penalty_multiplier && self.trend_penalty_multiplier <= 1.0) {
            return Err(invalid(
                "scoring.trend_penalty_multiplier",
                "must be in (0, 1]",
            ));
        }
        if self.vix_strong_risk_on_score < self.vix_risk_on_score || self.vix_risk_on_score < 0.0 {
            return Err(invalid(
                "scoring.vix_*",
                "risk-on scores must satisfy 0 <= risk_on <= strong_risk_on",
            ));
        }
        if self.vix_strong_risk_off_score > self.vix_risk_off_score
            || self.vix_risk_off_score > 0.0
        {
            return Err(invalid(
                "scoring.vix_*",
                "risk-off scores must satisfy strong_risk_off <= risk_off <= 0",
            ));
        }
        if self.momentum_strong_move_pct <= 0.0 || self.momentum_score < 0.0 {
            return Err(invalid("scoring.momentum_*", "must be positive"));
        }
        if self.liquidity_score_each < 0.0 {
            return Err(invalid("scoring.liquidity_score_each", "must be >= 0"));
        }
        if self.corr_slope > 0.0 {
            return Err(invalid(
                "scoring.corr_slope",
                "correlation only penalizes; slope must be <= 0",
            ));
        }
        if self.cot_strong_score < self.cot_score || self.cot_score < 0.0 {
            return Err(invalid(
                "scoring.cot_*",
                "must satisfy 0 <= score <= strong_score",
            ));
        }
        if self.cot_z_extreme <= 0.0 || self.cot_z_bonus < 0.0 {
            return Err(invalid("scoring.cot_z_*", "must be positive"));
        }
        Ok(())
    }
}

/// Backtest / trend-validation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub initial_capital: f64,
    /// Per-fill fee fraction for the trade simulation; the trend validator
    /// itself is fee-free.
    pub fee_pct: f64,
    /// Close an open position once price falls this fraction below its
    /// high-water mark.
    pub trailing_stop_pct: f64,
    /// Forward-return horizon for directional accuracy, in calendar months.
    pub horizon_months: u32,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        BacktestSettings {
            initial_capital: 100.0,
            fee_pct: 0.001,
            trailing_stop_pct: 0.15,
            horizon_months: 6,
        }
    }
}

impl BacktestSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capital <= 0.0 {
            return Err(invalid("backtest.initial_capital", "must be > 0"));
        }
        if !(0.0..1.0).contains(&self.fee_pct) {
            return Err(invalid("backtest.fee_pct", "must be in [0, 1)"));
        }
        if !(0.0..1.0).contains(&self.trailing_stop_pct) {
            return Err(invalid("backtest.trailing_stop_pct", "must be in [0, 1)"));
        }
        if self.horizon_months == 0 {
            return Err(invalid("backtest.horizon_months", "must be >= 1"));
        }
        Ok(())
    }
}
