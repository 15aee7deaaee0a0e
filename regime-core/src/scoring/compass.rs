//! Quantile-threshold scorer with three-way trend bands.
//!
//! Volatility cut-points are the trailing 5th/10th/90th/95th percentiles of
//! the deviation series, so "calm" and "fear" adapt to the regime the
//! market is actually in rather than to all of recorded history. Verdicts
//! collapse to bullish / neutral / bearish trend calls on a monthly
//! cadence.

use crate::config::Config;
use crate::domain::Scorecard;
use crate::features::FeatureFrame;

use super::thresholds::quantile_thresholds;
use super::{
    band_three, cot_factor, correlation_factor, finalize, liquidity_factor, momentum_factor,
    too_thin, vix_factor, ScoreStrategy, VixLevels,
};

pub struct CompassScorer;

impl ScoreStrategy for CompassScorer {
    fn name(&self) -> &'static str {
        "compass"
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
        let lookback = config.windows.quantile_lookback;

        let mut factors = Vec::new();
        if sc.vix_enabled {
            let levels = frame
                .column("vix_dev")
                .and_then(|col| quantile_thresholds(col, lookback))
                .map(|q| VixLevels {
                    strong_low: q.p5,
                    low: q.p10,
                    high: q.p90,
                    strong_high: q.p95,
                });
            factors.push(vix_factor(frame, levels, sc));
        }
        if sc.cot_enabled {
            factors.push(cot_factor(frame, lookback, sc));
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
        finalize(factors, frame, config, band_three)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Verdict;
    use chrono::NaiveDate;

    fn frame_with(cols: Vec<(&str, Vec<f64>)>) -> FeatureFrame {
        let n = cols.first().map(|(_, v)| v.len()).unwrap_or(0);
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        FeatureFrame {
            dates: (0..n)
                .map(|i| start + chrono::Duration::days(i as i64))
                .collect(),
            close: vec![100.0; n],
            columns: cols
                .into_iter()
                .map(|(name, v)| (name.to_string(), v))
                .collect(),
        }
    }

    #[test]
    fn thin_frame_is_no_data() {
        let config = Config::default();
        let frame = frame_with(vec![("mom_30d", vec![1.0; 5])]);
        assert_eq!(CompassScorer.score(&frame, &config).verdict, Verdict::NoData);
    }

    #[test]
    fn quantile_thresholds_adapt_to_recent_regime() {
        let mut config = Config::default();
        config.windows.quantile_lookback = 100;
        let n = 200;
        // Old history wildly volatile, recent history tight around zero;
        // a modest latest spike still clears the recent p95 and reads as
        // contrarian risk-on.
        let mut dev: Vec<f64> = (0..100)
            .map(|i| if i % 2 == 0 { 80.0 } else { -80.0 })
            .collect();
        dev.extend((0..99).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }));
        dev.push(8.0);
        let frame = frame_with(vec![("vix_dev", dev)]);
        let card = CompassScorer.score(&frame, &config);
        let vol = &card.factors[0];
        assert_eq!(vol.score, config.scoring.vix_strong_risk_on_score);
    }

    #[test]
    fn bands_are_three_way() {
        let mut config = Config::default();
        config.scoring.momentum_strong_move_pct = 5.0;
        config.scoring.compass_bullish = 0.5;
        let n = 100;
        let frame = frame_with(vec![
            ("mom_30d", vec![10.0; n]),
            ("above_200ma", vec![1.0; n]),
        ]);
        let card = CompassScorer.score(&frame, &config);
        assert_eq!(card.verdict, Verdict::BullishTrend);

        // Below the MA the -0.9 momentum subtotal is scaled to -0.45.
        let frame = frame_with(vec![
            ("mom_30d", vec![-10.0; n]),
            ("above_200ma", vec![0.0; n]),
        ]);
        config.scoring.compass_bearish = -0.4;
        let card = CompassScorer.score(&frame, &config);
        assert_eq!(card.verdict, Verdict::BearishTrend);
    }

    #[test]
    fn both_strategies_agree_on_factor_row_order() {
        let config = Config::default();
        let n = 100;
        let frame = frame_with(vec![("mom_30d", vec![1.0; n])]);
        let compass = CompassScorer.score(&frame, &config);
        let legacy = super::super::LegacyScorer.score(&frame, &config);
        let names = |card: &Scorecard| {
            card.factors
                .iter()
                .map(|f| f.name.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&compass), names(&legacy));
    }
}
