//! Temporal alignment: as-of joins onto a primary date axis.
//!
//! All joins assume sorted axes (datasets canonicalize on construction) and
//! use binary search. The backward join is the default — a value is only
//! visible on or after its report date, which is what keeps weekly
//! positioning reports a step function between releases. The nearest join
//! exists for continuously sampled sources (volatility index, macro prices)
//! where a small date mismatch in either direction carries no information.

use chrono::NaiveDate;

/// Index of the latest date at or before `target`, or None if every date
/// is after `target`.
pub fn asof_index(dates: &[NaiveDate], target: NaiveDate) -> Option<usize> {
    let idx = dates.partition_point(|d| *d <= target);
    if idx == 0 {
        None
    } else {
        Some(idx - 1)
    }
}

/// Index of the date closest to `target`; ties prefer the earlier date so
/// the result never drifts forward more than it has to.
pub fn nearest_index(dates: &[NaiveDate], target: NaiveDate) -> Option<usize> {
    if dates.is_empty() {
        return None;
    }
    let idx = dates.partition_point(|d| *d <= target);
    if idx == 0 {
        return Some(0);
    }
    if idx == dates.len() {
        return Some(dates.len() - 1);
    }
    let before = (target - dates[idx - 1]).num_days();
    let after = (dates[idx] - target).num_days();
    if after < before {
        Some(idx)
    } else {
        Some(idx - 1)
    }
}

/// Backward as-of join: for each primary date, the most recent auxiliary
/// value at or before it. NaN where no auxiliary value is visible yet.
/// An empty auxiliary series yields an all-NaN column, not an error.
pub fn join_backward(
    primary: &[NaiveDate],
    aux_dates: &[NaiveDate],
    aux_values: &[f64],
) -> Vec<f64> {
    primary
        .iter()
        .map(|&d| match asof_index(aux_dates, d) {
            Some(i) => aux_values[i],
            None => f64::NAN,
        })
        .collect()
}

/// Nearest-date join for continuously sampled auxiliary series.
pub fn join_nearest(
    primary: &[NaiveDate],
    aux_dates: &[NaiveDate],
    aux_values: &[f64],
) -> Vec<f64> {
    primary
        .iter()
        .map(|&d| match nearest_index(aux_dates, d) {
            Some(i) => aux_values[i],
            None => f64::NAN,
        })
        .collect()
}
