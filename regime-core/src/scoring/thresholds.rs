//! Threshold schemes for graduated factor scoring.
//!
//! Two schemes exist: sigma multiples over the full visible history
//! (legacy) and trailing-window percentile cut-points (compass). Both are
//! pure functions of the values passed in — recomputed per checkpoint,
//! they only ever see point-in-time data.

/// Mean and standard deviation of the full visible history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SigmaLevels {
    pub mean: f64,
    pub std: f64,
}

impl SigmaLevels {
    /// Level at `mean + k * std`.
    pub fn at(&self, k: f64) -> f64 {
        self.mean + k * self.std
    }
}

/// Full-history mean/std over non-NaN values. None below two observations.
pub fn sigma_levels(values: &[f64]) -> Option<SigmaLevels> {
    let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if present.len() < 2 {
        return None;
    }
    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    // Sample std, matching how the dashboard's static levels were drawn.
    let var = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(SigmaLevels {
        mean,
        std: var.sqrt(),
    })
}

/// Percentile cut-points over a trailing lookback window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantileThresholds {
    pub p5: f64,
    pub p10: f64,
    pub p90: f64,
    pub p95: f64,
}

/// Minimum non-NaN observations before quantiles are meaningful.
const MIN_QUANTILE_OBS: usize = 20;

/// Quantile thresholds over the trailing `lookback` observations.
/// None when too few non-NaN values are visible.
pub fn quantile_thresholds(values: &[f64], lookback: usize) -> Option<QuantileThresholds> {
    let start = values.len().saturating_sub(lookback);
    let mut tail: Vec<f64> = values[start..]
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .collect();
    if tail.len() < MIN_QUANTILE_OBS {
        return None;
    }
    tail.sort_by(f64::total_cmp);
    Some(QuantileThresholds {
        p5: percentile_sorted(&tail, 0.05),
        p10: percentile_sorted(&tail, 0.10),
        p90: percentile_sorted(&tail, 0.90),
        p95: percentile_sorted(&tail, 0.95),
    })
}

/// Linear-interpolation percentile of an already-sorted slice.
fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = q * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}
