//! NaN-aware rolling statistics.
//!
//! Every function takes a value slice and returns a same-length vector with
//! a NaN warmup prefix. A window observation is "present" when it is not
//! NaN; a result is emitted once the window holds at least `min_periods`
//! present observations.
//!
//! Degenerate-statistics policy (deliberate, see the scoring contract):
//! - zero rolling std  → z-score is exactly 0.0, never NaN
//! - zero rolling range → min-max oscillator is NaN (flat series carries
//!   no information)
//! - zero rolling mean → deviation % is NaN (no divide-by-zero)

/// Rolling mean over `window` observations, valid from `min_periods`
/// present observations.
pub fn rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    let mut sum = 0.0;
    let mut count = 0usize;

    for i in 0..n {
        let v = values[i];
        if !v.is_nan() {
            sum += v;
            count += 1;
        }
        if i >= window {
            let leaving = values[i - window];
            if !leaving.is_nan() {
                sum -= leaving;
                count -= 1;
            }
        }
        if count >= min_periods.max(1) {
            result[i] = sum / count as f64;
        }
    }
    result
}

/// Rolling population standard deviation.
pub fn rolling_std_pop(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    let mut sum = 0.0;
    let mut sumsq = 0.0;
    let mut count = 0usize;

    for i in 0..n {
        let v = values[i];
        if !v.is_nan() {
            sum += v;
            sumsq += v * v;
            count += 1;
        }
        if i >= window {
            let leaving = values[i - window];
            if !leaving.is_nan() {
                sum -= leaving;
                sumsq -= leaving * leaving;
                count -= 1;
            }
        }
        if count >= min_periods.max(1) {
            let mean = sum / count as f64;
            // Catastrophic cancellation leaves the one-pass variance a hair
            // off zero on constant windows at large magnitudes; snap
            // anything within relative epsilon of zero before the sqrt.
            let var = sumsq / count as f64 - mean * mean;
            result[i] = if var <= mean * mean * 1e-12 {
                0.0
            } else {
                var.sqrt()
            };
        }
    }
    result
}

/// Rolling z-score: (value - rolling_mean) / rolling_std (population).
///
/// A zero-std window yields exactly 0.0 so a degenerate low-variance
/// stretch never propagates NaN into scoring.
pub fn rolling_zscore(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    let mean = rolling_mean(values, window, min_periods);
    let std = rolling_std_pop(values, window, min_periods);
    values
        .iter()
        .zip(mean.iter().zip(&std))
        .map(|(&v, (&m, &s))| {
            if v.is_nan() || m.is_nan() || s.is_nan() {
                f64::NAN
            } else if s == 0.0 {
                0.0
            } else {
                (v - m) / s
            }
        })
        .collect()
}

/// Rolling 0–100 min-max oscillator: where the current value sits within
/// its trailing range. Requires a full window; a zero range yields NaN.
pub fn minmax_oscillator(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    for i in 0..n {
        if i + 1 < window {
            continue;
        }
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        let lo = slice.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = slice.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if hi > lo {
            result[i] = (values[i] - lo) / (hi - lo) * 100.0;
        }
    }
    result
}

/// Trailing % change over `periods` observations: (v / v[-periods] - 1) * 100.
/// Undefined until the window is full or when the base value is 0 or NaN.
pub fn pct_change(values: &[f64], periods: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    for i in periods..n {
        let base = values[i - periods];
        let v = values[i];
        if !v.is_nan() && !base.is_nan() && base != 0.0 {
            result[i] = (v / base - 1.0) * 100.0;
        }
    }
    result
}

/// Forward % change over `horizon` observations (training targets only —
/// reads the future by definition).
pub fn forward_pct_change(values: &[f64], horizon: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    for i in 0..n.saturating_sub(horizon) {
        let v = values[i];
        let fwd = values[i + horizon];
        if !v.is_nan() && !fwd.is_nan() && v != 0.0 {
            result[i] = (fwd / v - 1.0) * 100.0;
        }
    }
    result
}

/// Rolling Pearson correlation over pairs where both sides are present.
pub fn rolling_corr(a: &[f64], b: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    let n = a.len().min(b.len());
    let mut result = vec![f64::NAN; n];

    for i in 0..n {
        let start = (i + 1).saturating_sub(window);
        let mut count = 0usize;
        let mut sum_a = 0.0;
        let mut sum_b = 0.0;
        let mut sum_aa = 0.0;
        let mut sum_bb = 0.0;
        let mut sum_ab = 0.0;

        for j in start..=i {
            let (x, y) = (a[j], b[j]);
            if x.is_nan() || y.is_nan() {
                continue;
            }
            count += 1;
            sum_a += x;
            sum_b += y;
            sum_aa += x * x;
            sum_bb += y * y;
            sum_ab += x * y;
        }

        if count < min_periods.max(2) {
            continue;
        }
        let k = count as f64;
        let cov = sum_ab - sum_a * sum_b / k;
        let var_a = sum_aa - sum_a * sum_a / k;
        let var_b = sum_bb - sum_b * sum_b / k;
        if var_a > 0.0 && var_b > 0.0 {
            result[i] = (cov / (var_a * var_b).sqrt()).clamp(-1.0, 1.0);
        }
    }
    result
}

/// % deviation of a series from its own rolling mean. NaN when the rolling
/// mean is zero or not yet valid.
pub fn deviation_pct(values: &[f64], window: usize) -> Vec<f64> {
    let mean = rolling_mean(values, window, window);
    values
        .iter()
        .zip(&mean)
        .map(|(&v, &m)| {
            if v.is_nan() || m.is_nan() || m == 0.0 {
                f64::NAN
            } else {
                (v / m - 1.0) * 100.0
            }
        })
        .collect()
}

/// Forward-fill: each NaN takes the last present value before it.
pub fn ffill(values: &[f64]) -> Vec<f64> {
    let mut result = Vec::with_capacity(values.len());
    let mut last = f64::NAN;
    for &v in values {
        if !v.is_nan() {
            last = v;
        }
        result.push(last);
    }
    result
}
