//! Sigma-threshold scorer with five-way verdict bands.
//!
//! Volatility cut-points are placed at one and two sample standard
//! deviations around the full-history mean of the deviation series. Wider
//! verdict bands and a weekly cadence made this the original dashboard
//! scorer; it survives behind the strategy seam for comparison runs.

use crate::config::Config;
use crate::domain::Scorecard;
use crate::features::FeatureFrame;

use super::thresholds::sigma_levels;
use super::{
    band_five, cot_factor, correlation_factor, finalize, liquidity_factor, momentum_factor,
    too_thin, vix_factor, ScoreStrategy, VixLevels,
};

pub struct LegacyScorer;

impl ScoreStrategy for LegacyScorer {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn score(&self, frame: &FeatureFrame, config: &Config) -> Scorecard {
        if too_thin(frame, config) {
            return Scorecard::no_data(format!(
                "{} feature rows, need {}",
                frame.len(),
                config.signals.min_feature_rows
            ));
        }
        let sc = &config.scoring;

        let mut factors = Vec::new();
        if sc.vix_enabled {
            let levels = frame
                .column("vix_dev")
                .and_then(sigma_levels)
                .map(|s| VixLevels {
                    strong_low: s.at(-2.0),
                    low: s.at(-1.0),
                    high: s.at(1.0),
                    strong_high: s.at(2.0),
                });
            factors.push(vix_factor(frame, levels, sc));
        }
        if sc.cot_enabled {
            factors.push(cot_factor(frame, config.windows.quantile_lookback, sc));
        }
        if sc.momentum_enabled {
            factors.push(momentum_factor(frame, sc));
        }
        if sc.liquidity_enabled {
            factors.push(liquidity_factor(frame, sc));
        }
        if sc.correlation_enabled {
            factors.push(correlation_factor(frame, sc));
        }
        finalize(factors, frame, config, band_five)
    }
}
