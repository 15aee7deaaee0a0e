//! Feature construction: one row per trading day of the asset's price
//! series, columns derived from heterogeneous source series via as-of
//! joins.
//!
//! No value in the frame may depend on information dated after its row —
//! the positioning columns join backward (report lag preserved as a step
//! function), the continuously sampled macro columns join nearest, and
//! every rolling statistic is trailing. The one deliberate exception is
//! the `target` column, which reads forward returns and therefore only
//! exists in training mode.

pub mod rolling;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::config::Config;
use crate::data::align::{join_backward, join_nearest};
use crate::data::DatasetMap;
use crate::domain::Dataset;

use rolling::{
    deviation_pct, ffill, forward_pct_change, minmax_oscillator, pct_change, rolling_corr,
    rolling_mean, rolling_zscore,
};

/// Why the frame is being built. Training frames zero-fill gaps and carry
/// the forward-return target; signal frames must never do either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureMode {
    Signals,
    Training,
}

/// All indicator column names, in build order.
pub const FEATURE_COLUMNS: &[&str] = &[
    "vix_dev",
    "cot_comm",
    "cot_large_inv",
    "z_comm",
    "mom_30d",
    "dxy_30d",
    "us10y_30d",
    "spx_corr",
    "above_200ma",
];

/// Aligned per-asset feature frame: price axis plus indicator columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    pub dates: Vec<NaiveDate>,
    pub close: Vec<f64>,
    pub columns: BTreeMap<String, Vec<f64>>,
}

impl FeatureFrame {
    pub fn empty() -> Self {
        FeatureFrame {
            dates: Vec::new(),
            close: Vec::new(),
            columns: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|c| c.as_slice())
    }

    /// Value of a column in the latest row; None when the column is absent,
    /// the frame is empty, or the value is NaN.
    pub fn latest(&self, name: &str) -> Option<f64> {
        let col = self.columns.get(name)?;
        let v = *col.last()?;
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }

    /// Fraction of `names` present (non-NaN) in the latest row.
    pub fn latest_coverage(&self, names: &[&str]) -> f64 {
        if names.is_empty() || self.is_empty() {
            return 0.0;
        }
        let present = names.iter().filter(|n| self.latest(n).is_some()).count();
        present as f64 / names.len() as f64
    }

    /// Number of rows where every column in `names` is present.
    pub fn complete_rows(&self, names: &[&str]) -> usize {
        if names.is_empty() {
            return 0;
        }
        (0..self.len())
            .filter(|&i| {
                names.iter().all(|n| {
                    self.columns
                        .get(*n)
                        .map(|c| !c[i].is_nan())
                        .unwrap_or(false)
                })
            })
            .count()
    }
}

/// Indicator columns enabled by the scoring configuration.
pub fn enabled_columns(config: &Config) -> Vec<&'static str> {
    let sc = &config.scoring;
    let mut cols = Vec::new();
    if sc.vix_enabled {
        cols.push("vix_dev");
    }
    if sc.cot_enabled {
        cols.extend(["cot_comm", "cot_large_inv", "z_comm"]);
    }
    if sc.momentum_enabled {
        cols.push("mom_30d");
    }
    if sc.liquidity_enabled {
        cols.extend(["dxy_30d", "us10y_30d"]);
    }
    if sc.correlation_enabled {
        cols.push("spx_corr");
    }
    if sc.trend_filter_enabled {
        cols.push("above_200ma");
    }
    cols
}

/// Build the aligned feature frame for one asset.
///
/// Absent or empty auxiliary datasets yield all-NaN columns, never an
/// error; an absent or close-less price dataset yields an empty frame.
pub fn build_features(
    data: &DatasetMap,
    asset: &str,
    mode: FeatureMode,
    config: &Config,
) -> FeatureFrame {
    let sc = &config.scoring;
    let w = &config.windows;

    let price = match data.get(asset) {
        Some(ds) if !ds.is_empty() && ds.has_column("close") => ds,
        _ => {
            debug!(asset, "no price data, empty feature frame");
            return FeatureFrame::empty();
        }
    };
    let dates = price.dates.clone();
    let close = price.column("close").unwrap().to_vec();

    let mut columns: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let all_nan = || vec![f64::NAN; dates.len()];

    if sc.vix_enabled {
        let col = match data.get("vix") {
            Some(vix) if !vix.is_empty() => {
                // Prefer computing the deviation from the raw index; fall
                // back to a precomputed deviation column if that is all the
                // upstream loader provided.
                let dev = if let Some(vclose) = vix.column("close") {
                    deviation_pct(vclose, w.vix_dev_window)
                } else if let Some(dev) = vix.column("deviation_pct") {
                    dev.to_vec()
                } else {
                    vec![f64::NAN; vix.len()]
                };
                join_nearest(&dates, &vix.dates, &dev)
            }
            _ => all_nan(),
        };
        columns.insert("vix_dev".into(), col);
    }

    if sc.cot_enabled {
        let cot_key = format!("{asset}_cot");
        let min_date = config.assets.cot_min_date(asset);
        match data.get(&cot_key) {
            Some(cot) if !cot.is_empty() => {
                let cot = restrict_from(cot, min_date);
                let comm = cot.column("comm_net");
                let large = cot.column("large_net");

                let (cot_comm, z_comm) = match comm {
                    Some(net) => (
                        minmax_oscillator(net, w.cot_oscillator_window),
                        rolling_zscore(net, w.zscore_window, w.zscore_min_periods),
                    ),
                    None => (vec![f64::NAN; cot.len()], vec![f64::NAN; cot.len()]),
                };
                let cot_large_inv = match large {
                    Some(net) => minmax_oscillator(net, w.cot_oscillator_window)
                        .into_iter()
                        .map(|v| if v.is_nan() { v } else { 100.0 - v })
                        .collect(),
                    None => vec![f64::NAN; cot.len()],
                };

                columns.insert("cot_comm".into(), join_backward(&dates, &cot.dates, &cot_comm));
                columns.insert(
                    "cot_large_inv".into(),
                    join_backward(&dates, &cot.dates, &cot_large_inv),
                );
                columns.insert("z_comm".into(), join_backward(&dates, &cot.dates, &z_comm));
            }
            _ => {
                columns.insert("cot_comm".into(), all_nan());
                columns.insert("cot_large_inv".into(), all_nan());
                columns.insert("z_comm".into(), all_nan());
            }
        }
    }

    if sc.momentum_enabled {
        columns.insert("mom_30d".into(), pct_change(&close, w.momentum_window));
    }

    if sc.liquidity_enabled {
        for (key, col_name) in [("dxy", "dxy_30d"), ("us10y", "us10y_30d")] {
            let col = match data.get(key) {
                Some(ds) if !ds.is_empty() && ds.has_column("close") => {
                    let change = pct_change(ds.column("close").unwrap(), w.momentum_window);
                    join_nearest(&dates, &ds.dates, &change)
                }
                _ => all_nan(),
            };
            columns.insert(col_name.into(), col);
        }
    }

    if sc.correlation_enabled {
        let col = match data.get("spx") {
            Some(spx) if !spx.is_empty() && spx.has_column("close") => {
                let spx_close = join_nearest(&dates, &spx.dates, spx.column("close").unwrap());
                rolling_corr(&close, &spx_close, w.corr_window, w.corr_min_periods)
            }
            _ => all_nan(),
        };
        columns.insert("spx_corr".into(), col);
    }

    if sc.trend_filter_enabled {
        let ma = rolling_mean(&close, w.ma_window, w.ma_min_periods);
        let above: Vec<f64> = close
            .iter()
            .zip(&ma)
            .map(|(&c, &m)| {
                if c.is_nan() || m.is_nan() {
                    f64::NAN
                } else if c > m {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();
        columns.insert("above_200ma".into(), above);
    }

    if mode == FeatureMode::Training {
        columns.insert("target".into(), forward_pct_change(&close, w.target_horizon));
    }

    // Bridge short gaps; the as-of joins already enforce visibility, so a
    // forward fill never moves information backward in time.
    for col in columns.values_mut() {
        *col = ffill(col);
    }

    let frame = FeatureFrame {
        dates,
        close,
        columns,
    };

    let frame = match mode {
        FeatureMode::Signals => drop_all_nan_rows(frame, &enabled_columns(config)),
        FeatureMode::Training => zero_fill(frame),
    };

    debug!(
        asset,
        rows = frame.len(),
        cols = frame.columns.len(),
        ?mode,
        "feature frame built"
    );
    frame
}

/// Drop rows where every named indicator column is NaN. Live scoring must
/// see gaps as gaps — a row with no information at all is noise.
fn drop_all_nan_rows(frame: FeatureFrame, names: &[&str]) -> FeatureFrame {
    if names.is_empty() {
        return frame;
    }
    let keep: Vec<usize> = (0..frame.len())
        .filter(|&i| {
            names.iter().any(|n| {
                frame
                    .columns
                    .get(*n)
                    .map(|c| !c[i].is_nan())
                    .unwrap_or(false)
            })
        })
        .collect();

    FeatureFrame {
        dates: keep.iter().map(|&i| frame.dates[i]).collect(),
        close: keep.iter().map(|&i| frame.close[i]).collect(),
        columns: frame
            .columns
            .iter()
            .map(|(name, col)| (name.clone(), keep.iter().map(|&i| col[i]).collect()))
            .collect(),
    }
}

/// Zero-fill remaining gaps. Defensible for model training, never for a
/// live signal (which reports "no data" instead).
fn zero_fill(mut frame: FeatureFrame) -> FeatureFrame {
    for col in frame.columns.values_mut() {
        for v in col.iter_mut() {
            if v.is_nan() {
                *v = 0.0;
            }
        }
    }
    frame
}

/// Rows of a dataset at or after `min_date`.
fn restrict_from(ds: &Dataset, min_date: NaiveDate) -> Dataset {
    let start = ds.dates.partition_point(|d| *d < min_date);
    Dataset {
        dates: ds.dates[start..].to_vec(),
        columns: ds
            .columns
            .iter()
            .map(|(name, col)| (name.clone(), col[start..].to_vec()))
            .collect(),
    }
}
