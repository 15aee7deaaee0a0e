//! Composite regime scoring.
//!
//! A scorer turns the latest row of a feature frame into a `Scorecard`:
//! one factor row per enabled family, a total, a banded verdict, and a
//! data-coverage confidence. The two strategies differ only in how they
//! derive volatility thresholds and how they band the total; the factor
//! families themselves are shared.
//!
//! Scoring is pure: same frame + same config → same card. All thresholds
//! are either config constants or statistics of the visible history, so a
//! replayed card never depends on data after its date.

pub mod compass;
pub mod legacy;
pub mod thresholds;

pub use compass::CompassScorer;
pub use legacy::LegacyScorer;

use crate::config::{Config, ScorerMode, ScoringSettings};
use crate::domain::{Factor, Scorecard, Verdict};
use crate::features::{enabled_columns, FeatureFrame};

use thresholds::quantile_thresholds;

/// A scoring strategy. Implementations must be pure and thread-safe so the
/// replayer can score checkpoints in parallel.
pub trait ScoreStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn score(&self, frame: &FeatureFrame, config: &Config) -> Scorecard;
}

/// Construct the scorer selected by configuration.
pub fn build_scorer(mode: ScorerMode) -> Box<dyn ScoreStrategy> {
    match mode {
        ScorerMode::Legacy => Box::new(LegacyScorer),
        ScorerMode::Compass => Box::new(CompassScorer),
    }
}

/// Volatility-deviation cut-points, however the strategy derived them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct VixLevels {
    pub strong_low: f64,
    pub low: f64,
    pub high: f64,
    pub strong_high: f64,
}

/// Graduated volatility factor, read contrarian: a fear spike stretching
/// far above its mean is risk-on (capitulation gets bought), deep
/// complacency far below it is risk-off, the middle is neutral.
pub(crate) fn vix_factor(
    frame: &FeatureFrame,
    levels: Option<VixLevels>,
    sc: &ScoringSettings,
) -> Factor {
    let dev = match frame.latest("vix_dev") {
        Some(v) => v,
        None => return Factor::no_data("Volatility", "volatility deviation unavailable"),
    };
    let levels = match levels {
        Some(l) => l,
        None => {
            return Factor::no_data(
                "Volatility",
                "not enough history for volatility thresholds",
            )
        }
    };

    // Strictly beyond a cut-point, so a flat history (all levels collapsed
    // onto the value itself) stays neutral.
    let (score, rationale) = if dev > levels.strong_high {
        (
            sc.vix_strong_risk_on_score,
            format!(
                "deviation {dev:+.1}% in capitulation-fear zone (> {:+.1}%), contrarian risk-on",
                levels.strong_high
            ),
        )
    } else if dev > levels.high {
        (
            sc.vix_risk_on_score,
            format!("deviation {dev:+.1}% above fear threshold ({:+.1}%)", levels.high),
        )
    } else if dev < levels.strong_low {
        (
            sc.vix_strong_risk_off_score,
            format!(
                "deviation {dev:+.1}% in deep-complacency zone (< {:+.1}%)",
                levels.strong_low
            ),
        )
    } else if dev < levels.low {
        (
            sc.vix_risk_off_score,
            format!("deviation {dev:+.1}% below complacency threshold ({:+.1}%)", levels.low),
        )
    } else {
        (0.0, format!("deviation {dev:+.1}% in neutral range"))
    };
    Factor::new("Volatility", score, rationale)
}

/// Positioning factor: the commercial oscillator scored against trailing
/// quantiles of its own history, with a commercial z-score overlay at
/// extremes. The inverted large-speculator oscillator stays a diagnostic
/// feature column and never enters the score.
///
/// The bearish floor check comes first: an oscillator pinned at the bottom
/// of its absolute range is strong bear even when the trailing quantiles
/// have drifted lower still.
pub(crate) fn cot_factor(frame: &FeatureFrame, lookback: usize, sc: &ScoringSettings) -> Factor {
    let history = match frame.column("cot_comm") {
        Some(c) => c,
        None => return Factor::no_data("Positioning", "positioning data unavailable"),
    };
    let osc = match history.last().copied().filter(|v| !v.is_nan()) {
        Some(v) => v,
        None => return Factor::no_data("Positioning", "positioning data unavailable"),
    };

    // The oscillator lives on a fixed 0..100 scale, so absolute cut-points
    // stand in until enough history accrues for trailing quantiles.
    let q = quantile_thresholds(history, lookback);
    let (p5, p10, p90, p95) = match q {
        Some(q) => (q.p5, q.p10, q.p90, q.p95),
        None => (5.0, 10.0, 90.0, 95.0),
    };

    let (mut score, mut rationale) = if osc <= p5 || osc <= sc.cot_floor {
        (
            -sc.cot_strong_score,
            format!("commercial oscillator {osc:.0} at bearish extreme (<= {p5:.0})"),
        )
    } else if osc <= p10 {
        (
            -sc.cot_score,
            format!("commercial oscillator {osc:.0} in bearish decile (<= {p10:.0})"),
        )
    } else if osc >= p95 {
        (
            sc.cot_strong_score,
            format!("commercial oscillator {osc:.0} at bullish extreme (>= {p95:.0})"),
        )
    } else if osc >= p90 {
        (
            sc.cot_score,
            format!("commercial oscillator {osc:.0} in bullish decile (>= {p90:.0})"),
        )
    } else {
        (0.0, format!("commercial oscillator {osc:.0} mid-range"))
    };

    if let Some(z) = frame.latest("z_comm") {
        if z.abs() >= sc.cot_z_extreme {
            let bonus = sc.cot_z_bonus * z.signum();
            score += bonus;
            rationale.push_str(&format!("; commercial z-score {z:+.1} adds {bonus:+.1}"));
        }
    }
    Factor::new("Positioning", score, rationale)
}

/// Momentum factor: symmetric score once the trailing move clears the
/// configured magnitude.
pub(crate) fn momentum_factor(frame: &FeatureFrame, sc: &ScoringSettings) -> Factor {
    let mom = match frame.latest("mom_30d") {
        Some(v) => v,
        None => return Factor::no_data("Momentum", "price history too short for momentum"),
    };
    if mom.abs() >= sc.momentum_strong_move_pct {
        Factor::new(
            "Momentum",
            sc.momentum_score * mom.signum(),
            format!(
                "30d move {mom:+.1}% clears ±{:.0}% threshold",
                sc.momentum_strong_move_pct
            ),
        )
    } else {
        Factor::new("Momentum", 0.0, format!("30d move {mom:+.1}% within range"))
    }
}

/// Liquidity factor: dollar-index and 10y-yield trailing moves, each
/// contributing symmetrically when they clear their threshold. A strong
/// dollar or a yield spike drains risk appetite.
pub(crate) fn liquidity_factor(frame: &FeatureFrame, sc: &ScoringSettings) -> Factor {
    let dxy = frame.latest("dxy_30d");
    let us10y = frame.latest("us10y_30d");
    if dxy.is_none() && us10y.is_none() {
        return Factor::no_data("Liquidity", "macro rate data unavailable");
    }

    let mut score = 0.0;
    let mut parts = Vec::new();
    if let Some(d) = dxy {
        if d >= sc.liquidity_dxy_strong_pct {
            score -= sc.liquidity_score_each;
            parts.push(format!("dollar surging {d:+.1}%"));
        } else if d <= -sc.liquidity_dxy_strong_pct {
            score += sc.liquidity_score_each;
            parts.push(format!("dollar weakening {d:+.1}%"));
        }
    }
    if let Some(y) = us10y {
        if y >= sc.liquidity_us10y_spike_pct {
            score -= sc.liquidity_score_each;
            parts.push(format!("10y yield spiking {y:+.1}%"));
        } else if y <= -sc.liquidity_us10y_spike_pct {
            score += sc.liquidity_score_each;
            parts.push(format!("10y yield falling {y:+.1}%"));
        }
    }
    let rationale = if parts.is_empty() {
        "macro liquidity neutral".to_string()
    } else {
        parts.join("; ")
    };
    Factor::new("Liquidity", score, rationale)
}

/// Correlation factor: a graduated penalty once the asset trades like an
/// equity-index proxy. Never positive.
pub(crate) fn correlation_factor(frame: &FeatureFrame, sc: &ScoringSettings) -> Factor {
    let corr = match frame.latest("spx_corr") {
        Some(v) => v,
        None => return Factor::no_data("Correlation", "correlation window not yet valid"),
    };
    if corr >= sc.corr_threshold {
        let score = ((corr - sc.corr_base) * sc.corr_slope).min(0.0);
        Factor::new(
            "Correlation",
            score,
            format!("equity correlation {corr:.2} above {:.2}", sc.corr_threshold),
        )
    } else {
        Factor::new("Correlation", 0.0, format!("equity correlation {corr:.2} benign"))
    }
}

/// Trend-filter adjustment row. When the asset closed below its long moving
/// average the subtotal is scaled by the penalty multiplier, whatever its
/// sign; the row records the delta so the factor rows still sum to the
/// total.
pub(crate) fn trend_adjustment(
    frame: &FeatureFrame,
    subtotal: f64,
    sc: &ScoringSettings,
) -> Factor {
    match frame.latest("above_200ma") {
        None => Factor::no_data("Trend Filter", "long moving average not yet valid"),
        Some(above) if above == 0.0 => {
            let adjusted = subtotal * sc.trend_penalty_multiplier;
            Factor::new(
                "Trend Filter",
                adjusted - subtotal,
                format!(
                    "below long MA, subtotal scaled by {:.2}",
                    sc.trend_penalty_multiplier
                ),
            )
        }
        Some(_) => Factor::new("Trend Filter", 0.0, "above long MA"),
    }
}

/// Data-coverage confidence: equal-weight blend of how complete the latest
/// row is and how much complete history backs the thresholds.
pub(crate) fn confidence(frame: &FeatureFrame, config: &Config) -> f64 {
    let cols = enabled_columns(config);
    if cols.is_empty() {
        return 0.0;
    }
    let latest = frame.latest_coverage(&cols);
    let depth = (frame.complete_rows(&cols) as f64 / config.signals.min_feature_rows as f64)
        .min(1.0);
    (0.5 * (latest + depth)).clamp(0.0, 1.0)
}

/// Five-way banding of a total score. Monotonic: a larger total never maps
/// to a more bearish verdict.
pub(crate) fn band_five(total: f64, sc: &ScoringSettings) -> Verdict {
    if total >= sc.verdict_strong_buy {
        Verdict::StrongBuy
    } else if total >= sc.verdict_buy {
        Verdict::Buy
    } else if total <= sc.verdict_strong_sell {
        Verdict::StrongSell
    } else if total <= sc.verdict_sell {
        Verdict::Sell
    } else {
        Verdict::Neutral
    }
}

/// Three-way trend banding of a total score.
pub(crate) fn band_three(total: f64, sc: &ScoringSettings) -> Verdict {
    if total >= sc.compass_bullish {
        Verdict::BullishTrend
    } else if total <= sc.compass_bearish {
        Verdict::BearishTrend
    } else {
        Verdict::Neutral
    }
}

/// Assemble a scorecard from factor rows: sum, band, attach confidence,
/// and collapse to NoData when confidence has evaporated.
pub(crate) fn finalize(
    mut factors: Vec<Factor>,
    frame: &FeatureFrame,
    config: &Config,
    band: impl Fn(f64, &ScoringSettings) -> Verdict,
) -> Scorecard {
    let sc = &config.scoring;
    if sc.trend_filter_enabled {
        let subtotal: f64 = factors.iter().map(|f| f.score).sum();
        factors.push(trend_adjustment(frame, subtotal, sc));
    }
    let total: f64 = factors.iter().map(|f| f.score).sum();
    let confidence = confidence(frame, config);
    let verdict = if confidence <= config.signals.confidence_epsilon {
        Verdict::NoData
    } else {
        band(total, sc)
    };
    Scorecard {
        factors,
        total_score: total,
        verdict,
        confidence,
    }
}

/// Shared entry guard: frames thinner than the configured floor never reach
/// the factor families.
pub(crate) fn too_thin(frame: &FeatureFrame, config: &Config) -> bool {
    frame.len() < config.signals.min_feature_rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

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

    fn levels() -> VixLevels {
        VixLevels {
            strong_low: -20.0,
            low: -10.0,
            high: 10.0,
            strong_high: 20.0,
        }
    }

    #[test]
    fn vix_factor_graduates_contrarian() {
        // Stretched fear is bought, deep complacency is sold.
        let sc = ScoringSettings::default();
        let cases = [
            (-25.0, sc.vix_strong_risk_off_score),
            (-15.0, sc.vix_risk_off_score),
            (0.0, 0.0),
            (15.0, sc.vix_risk_on_score),
            (25.0, sc.vix_strong_risk_on_score),
        ];
        for (dev, expected) in cases {
            let frame = frame_with(vec![("vix_dev", vec![dev])]);
            let f = vix_factor(&frame, Some(levels()), &sc);
            assert_eq!(f.score, expected, "dev={dev}");
        }
    }

    #[test]
    fn vix_fear_spike_is_risk_on() {
        let sc = ScoringSettings::default();
        let frame = frame_with(vec![("vix_dev", vec![60.0])]);
        let f = vix_factor(&frame, Some(levels()), &sc);
        assert_eq!(f.score, sc.vix_strong_risk_on_score);
        assert!(f.score > 0.0);
    }

    #[test]
    fn vix_flat_history_stays_neutral() {
        // A flat deviation series collapses every level onto the value
        // itself; sitting exactly on the cut-points is not "beyond" them.
        let sc = ScoringSettings::default();
        let collapsed = VixLevels {
            strong_low: 0.0,
            low: 0.0,
            high: 0.0,
            strong_high: 0.0,
        };
        let frame = frame_with(vec![("vix_dev", vec![0.0])]);
        assert_eq!(vix_factor(&frame, Some(collapsed), &sc).score, 0.0);
    }

    #[test]
    fn vix_factor_no_data_rows() {
        let sc = ScoringSettings::default();
        let frame = frame_with(vec![("vix_dev", vec![f64::NAN])]);
        assert_eq!(vix_factor(&frame, Some(levels()), &sc).score, 0.0);
        let frame = frame_with(vec![("vix_dev", vec![5.0])]);
        assert_eq!(vix_factor(&frame, None, &sc).score, 0.0);
    }

    #[test]
    fn cot_floor_beats_quantiles() {
        let sc = ScoringSettings {
            cot_floor: 2.0,
            ..Default::default()
        };
        // History hugging the bottom of the range so trailing p5 < floor.
        let mut history = vec![0.5; 99];
        history.push(1.0);
        let frame = frame_with(vec![("cot_comm", history)]);
        let f = cot_factor(&frame, 504, &sc);
        assert_eq!(f.score, -sc.cot_strong_score);
    }

    #[test]
    fn cot_bullish_extreme_with_z_overlay() {
        let sc = ScoringSettings::default();
        let mut osc: Vec<f64> = (0..100).map(|i| i as f64).collect();
        osc.push(99.5);
        let n = osc.len();
        let mut z = vec![0.0; n];
        z[n - 1] = 3.5;
        let frame = frame_with(vec![("cot_comm", osc), ("z_comm", z)]);
        let f = cot_factor(&frame, 504, &sc);
        assert_eq!(f.score, sc.cot_strong_score + sc.cot_z_bonus);
    }

    #[test]
    fn cot_scores_commercial_oscillator_only() {
        // The inverted large-speculator column is present but must not
        // dilute the commercial reading (an average would land mid-range).
        let sc = ScoringSettings::default();
        let mut comm: Vec<f64> = (0..100).map(|i| i as f64).collect();
        comm.push(99.5);
        let n = comm.len();
        let frame = frame_with(vec![("cot_comm", comm), ("cot_large_inv", vec![5.0; n])]);
        let f = cot_factor(&frame, 504, &sc);
        assert_eq!(f.score, sc.cot_strong_score);
    }

    #[test]
    fn momentum_symmetric() {
        let sc = ScoringSettings::default();
        let up = frame_with(vec![("mom_30d", vec![20.0])]);
        let down = frame_with(vec![("mom_30d", vec![-20.0])]);
        let flat = frame_with(vec![("mom_30d", vec![5.0])]);
        assert_eq!(momentum_factor(&up, &sc).score, sc.momentum_score);
        assert_eq!(momentum_factor(&down, &sc).score, -sc.momentum_score);
        assert_eq!(momentum_factor(&flat, &sc).score, 0.0);
    }

    #[test]
    fn liquidity_sums_both_legs() {
        let sc = ScoringSettings::default();
        let frame = frame_with(vec![("dxy_30d", vec![7.0]), ("us10y_30d", vec![15.0])]);
        let f = liquidity_factor(&frame, &sc);
        assert_eq!(f.score, -2.0 * sc.liquidity_score_each);

        let frame = frame_with(vec![("dxy_30d", vec![-7.0]), ("us10y_30d", vec![15.0])]);
        assert_eq!(liquidity_factor(&frame, &sc).score, 0.0);
    }

    #[test]
    fn correlation_penalty_graduates_and_never_rewards() {
        let sc = ScoringSettings::default();
        let benign = frame_with(vec![("spx_corr", vec![0.5])]);
        assert_eq!(correlation_factor(&benign, &sc).score, 0.0);

        let high = frame_with(vec![("spx_corr", vec![0.9])]);
        let higher = frame_with(vec![("spx_corr", vec![0.99])]);
        let p1 = correlation_factor(&high, &sc).score;
        let p2 = correlation_factor(&higher, &sc).score;
        assert!(p1 < 0.0);
        assert!(p2 < p1, "penalty must deepen with correlation");
    }

    #[test]
    fn trend_adjustment_scales_any_subtotal_below_ma() {
        let sc = ScoringSettings::default();
        let below = frame_with(vec![("above_200ma", vec![0.0])]);
        let above = frame_with(vec![("above_200ma", vec![1.0])]);

        let f = trend_adjustment(&below, 4.0, &sc);
        assert!((f.score - (4.0 * sc.trend_penalty_multiplier - 4.0)).abs() < 1e-10);
        // The multiplier is not gated on sign: a bearish subtotal shrinks
        // toward zero by the same factor.
        let f = trend_adjustment(&below, -2.0, &sc);
        assert!((f.score - (-2.0 * sc.trend_penalty_multiplier + 2.0)).abs() < 1e-10);
        assert_eq!(trend_adjustment(&below, 0.0, &sc).score, 0.0);
        assert_eq!(trend_adjustment(&above, 4.0, &sc).score, 0.0);
    }

    #[test]
    fn band_five_is_monotonic() {
        let sc = ScoringSettings::default();
        let mut last_rank = 0;
        for i in -80..=80 {
            let total = i as f64 / 10.0;
            let rank = match band_five(total, &sc) {
                Verdict::StrongSell => 1,
                Verdict::Sell => 2,
                Verdict::Neutral => 3,
                Verdict::Buy => 4,
                Verdict::StrongBuy => 5,
                v => panic!("unexpected verdict {v:?}"),
            };
            assert!(rank >= last_rank, "banding regressed at total={total}");
            last_rank = rank;
        }
    }

    #[test]
    fn band_three_maps_extremes() {
        let sc = ScoringSettings::default();
        assert_eq!(band_three(2.0, &sc), Verdict::BullishTrend);
        assert_eq!(band_three(0.0, &sc), Verdict::Neutral);
        assert_eq!(band_three(-2.0, &sc), Verdict::BearishTrend);
    }

    #[test]
    fn finalize_total_equals_factor_sum() {
        let config = Config::default();
        let n = 60;
        let frame = frame_with(vec![
            ("mom_30d", vec![20.0; n]),
            ("above_200ma", vec![0.0; n]),
        ]);
        let factors = vec![
            Factor::new("Volatility", 3.0, "x"),
            Factor::new("Momentum", 0.9, "x"),
        ];
        let card = finalize(factors, &frame, &config, band_five);
        let sum: f64 = card.factors.iter().map(|f| f.score).sum();
        assert!((card.total_score - sum).abs() < 1e-10);
        // Trend row dampened the 3.9 subtotal.
        assert!((card.total_score - 3.9 * config.scoring.trend_penalty_multiplier).abs() < 1e-10);
    }

    #[test]
    fn zero_confidence_forces_no_data_verdict() {
        let config = Config::default();
        // Frame rows exist but every enabled column is absent.
        let frame = frame_with(vec![("unused", vec![1.0; 60])]);
        let card = finalize(vec![Factor::new("Volatility", 5.0, "x")], &frame, &config, band_five);
        assert_eq!(card.verdict, Verdict::NoData);
        assert_eq!(card.confidence, 0.0);
    }
}
