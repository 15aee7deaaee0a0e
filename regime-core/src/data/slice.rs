//! Point-in-time truncation.
//!
//! The walk-forward replayer's no-lookahead guarantee rests entirely on
//! this module: truncating a dataset to `date <= cutoff` before any feature
//! or score is computed. Sorted axes take a binary-search fast path; the
//! boolean-filter fallback handles anything else. The two paths must
//! produce identical row sets — that equivalence is a tested invariant,
//! not an optimization detail.

use chrono::NaiveDate;

use crate::domain::Dataset;

/// Number of leading rows with `date <= cutoff` in a sorted axis.
pub fn sorted_cutoff_len(dates: &[NaiveDate], cutoff: NaiveDate) -> usize {
    dates.partition_point(|d| *d <= cutoff)
}

/// Row mask for `date <= cutoff`, valid for any axis ordering.
pub fn filter_cutoff_mask(dates: &[NaiveDate], cutoff: NaiveDate) -> Vec<bool> {
    dates.iter().map(|d| *d <= cutoff).collect()
}

fn is_sorted(dates: &[NaiveDate]) -> bool {
    dates.windows(2).all(|w| w[0] <= w[1])
}

/// Truncate a dataset to rows with `date <= cutoff`.
pub fn truncate_dataset(ds: &Dataset, cutoff: NaiveDate) -> Dataset {
    if is_sorted(&ds.dates) {
        let n = sorted_cutoff_len(&ds.dates, cutoff);
        Dataset {
            dates: ds.dates[..n].to_vec(),
            columns: ds
                .columns
                .iter()
                .map(|(name, col)| (name.clone(), col[..n].to_vec()))
                .collect(),
        }
    } else {
        let mask = filter_cutoff_mask(&ds.dates, cutoff);
        Dataset {
            dates: ds
                .dates
                .iter()
                .zip(&mask)
                .filter(|(_, &m)| m)
                .map(|(d, _)| *d)
                .collect(),
            columns: ds
                .columns
                .iter()
                .map(|(name, col)| {
                    let kept = col
                        .iter()
                        .zip(&mask)
                        .filter(|(_, &m)| m)
                        .map(|(v, _)| *v)
                        .collect();
                    (name.clone(), kept)
                })
                .collect(),
        }
    }
}
