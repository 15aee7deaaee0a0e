//! Pure performance metrics over equity curves.
//!
//! All functions are total: degenerate input (too short, flat, empty)
//! yields 0.0 rather than NaN or an error, so report assembly never has
//! to special-case a metric.

/// Trading days per year, for annualization.
const TRADING_DAYS: f64 = 252.0;

/// Simple daily returns of an equity or price curve. First element has no
/// predecessor and is skipped, so the result is one shorter than the input.
pub fn daily_returns(curve: &[f64]) -> Vec<f64> {
    curve
        .windows(2)
        .map(|w| if w[0] != 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

/// Total return over a curve, in percent. 0.0 below two points.
pub fn total_return_pct(curve: &[f64]) -> f64 {
    match (curve.first(), curve.last()) {
        (Some(&first), Some(&last)) if curve.len() >= 2 && first != 0.0 => {
            (last / first - 1.0) * 100.0
        }
        _ => 0.0,
    }
}

/// Maximum peak-to-trough drawdown, in percent (positive number).
pub fn max_drawdown_pct(curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &v in curve {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            worst = worst.max((peak - v) / peak);
        }
    }
    worst * 100.0
}

/// Annualized Sharpe ratio (zero risk-free rate) over daily returns.
/// Zero-variance or too-short return series yields 0.0.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    // A constant return series can leave rounding noise in the variance;
    // anything within relative epsilon of zero counts as flat.
    if var <= mean * mean * 1e-12 {
        return 0.0;
    }
    mean / var.sqrt() * TRADING_DAYS.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-10,
            "actual={actual}, expected={expected}"
        );
    }

    #[test]
    fn returns_and_total() {
        let curve = [100.0, 110.0, 99.0];
        let r = daily_returns(&curve);
        assert_eq!(r.len(), 2);
        assert_approx(r[0], 0.1);
        assert_approx(r[1], -0.1);
        assert_approx(total_return_pct(&curve), -1.0);
    }

    #[test]
    fn drawdown_known_curve() {
        // Peak 120, trough 90: 25% drawdown.
        let curve = [100.0, 120.0, 90.0, 110.0];
        assert_approx(max_drawdown_pct(&curve), 25.0);
    }

    #[test]
    fn drawdown_monotone_curve_is_zero() {
        let curve = [100.0, 101.0, 102.0];
        assert_eq!(max_drawdown_pct(&curve), 0.0);
    }

    #[test]
    fn sharpe_degenerate_is_zero() {
        assert_eq!(sharpe_ratio(&[]), 0.0);
        assert_eq!(sharpe_ratio(&[0.01]), 0.0);
        assert_eq!(sharpe_ratio(&[0.01; 50]), 0.0);
    }

    #[test]
    fn sharpe_positive_for_rising_noisy_curve() {
        let returns: Vec<f64> = (0..100)
            .map(|i| if i % 2 == 0 { 0.02 } else { -0.005 })
            .collect();
        assert!(sharpe_ratio(&returns) > 0.0);
    }

    #[test]
    fn empty_inputs_are_total() {
        assert_eq!(total_return_pct(&[]), 0.0);
        assert_eq!(max_drawdown_pct(&[]), 0.0);
        assert!(daily_returns(&[]).is_empty());
    }
}
