//! Dated series and small named-column frames.
//!
//! `Series` is a single value column on a date axis; `Dataset` is a set of
//! named columns sharing one axis. Both canonicalize on construction: sorted
//! ascending, duplicate dates collapsed keeping the last row. Missing values
//! are strict NaN (no sentinel prices).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One value column on a sorted, deduplicated date axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl Series {
    /// Build a canonical series from raw points: sort ascending, keep the
    /// last row for a duplicated date.
    pub fn from_points(points: Vec<(NaiveDate, f64)>) -> Self {
        let (dates, columns) = canonical_rows(
            points.iter().map(|(d, _)| *d).collect(),
            vec![points.into_iter().map(|(_, v)| v).collect()],
        );
        let mut columns = columns;
        Series {
            dates,
            values: columns.pop().unwrap_or_default(),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Most recent value at or before `date` (backward as-of lookup).
    pub fn value_asof(&self, date: NaiveDate) -> Option<f64> {
        let idx = self.dates.partition_point(|d| *d <= date);
        if idx == 0 {
            None
        } else {
            Some(self.values[idx - 1])
        }
    }
}

/// A named-column frame: one `date` axis plus f64 columns.
///
/// This is the shape every upstream dataset arrives in (price candles,
/// volatility index, positioning reports). Column names are normalized
/// lowercase snake_case by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub dates: Vec<NaiveDate>,
    pub columns: BTreeMap<String, Vec<f64>>,
}

impl Dataset {
    /// Build a canonical dataset. Every column must have one value per date;
    /// shorter columns are padded with NaN, longer ones truncated.
    pub fn new(dates: Vec<NaiveDate>, columns: BTreeMap<String, Vec<f64>>) -> Self {
        let n = dates.len();
        let names: Vec<String> = columns.keys().cloned().collect();
        let mut cols: Vec<Vec<f64>> = columns
            .into_values()
            .map(|mut c| {
                c.resize(n, f64::NAN);
                c
            })
            .collect();
        let (dates, canon) = canonical_rows(dates, std::mem::take(&mut cols));
        Dataset {
            dates,
            columns: names.into_iter().zip(canon).collect(),
        }
    }

    /// An empty dataset (absent upstream source).
    pub fn empty() -> Self {
        Dataset {
            dates: Vec::new(),
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

    /// Extract one column as a standalone `Series`.
    pub fn series(&self, name: &str) -> Option<Series> {
        self.columns.get(name).map(|c| Series {
            dates: self.dates.clone(),
            values: c.clone(),
        })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }
}

/// Sort rows by date (stable) and collapse duplicate dates keeping the last.
fn canonical_rows(dates: Vec<NaiveDate>, columns: Vec<Vec<f64>>) -> (Vec<NaiveDate>, Vec<Vec<f64>>) {
    let mut order: Vec<usize> = (0..dates.len()).collect();
    order.sort_by_key(|&i| dates[i]);

    // After a stable sort, the last index within a run of equal dates is the
    // last-seen row for that date.
    let mut keep: Vec<usize> = Vec::with_capacity(order.len());
    for (pos, &i) in order.iter().enumerate() {
        let is_last_of_run = match order.get(pos + 1) {
            Some(&next) => dates[next] != dates[i],
            None => true,
        };
        if is_last_of_run {
            keep.push(i);
        }
    }

    let out_dates: Vec<NaiveDate> = keep.iter().map(|&i| dates[i]).collect();
    let out_columns: Vec<Vec<f64>> = columns
        .into_iter()
        .map(|col| keep.iter().map(|&i| col[i]).collect())
        .collect();
    (out_dates, out_columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn from_points_sorts_ascending() {
        let s = Series::from_points(vec![(d("2024-01-03"), 3.0), (d("2024-01-01"), 1.0)]);
        assert_eq!(s.dates, vec![d("2024-01-01"), d("2024-01-03")]);
        assert_eq!(s.values, vec![1.0, 3.0]);
    }

    #[test]
    fn duplicate_dates_keep_last() {
        let s = Series::from_points(vec![
            (d("2024-01-01"), 1.0),
            (d("2024-01-02"), 2.0),
            (d("2024-01-01"), 9.0),
        ]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.values, vec![9.0, 2.0]);
    }

    #[test]
    fn value_asof_backward() {
        let s = Series::from_points(vec![(d("2024-01-02"), 2.0), (d("2024-01-09"), 9.0)]);
        assert_eq!(s.value_asof(d("2024-01-01")), None);
        assert_eq!(s.value_asof(d("2024-01-02")), Some(2.0));
        assert_eq!(s.value_asof(d("2024-01-05")), Some(2.0));
        assert_eq!(s.value_asof(d("2024-01-09")), Some(9.0));
        assert_eq!(s.value_asof(d("2024-02-01")), Some(9.0));
    }

    #[test]
    fn dataset_pads_short_columns() {
        let mut cols = BTreeMap::new();
        cols.insert("close".to_string(), vec![1.0]);
        let ds = Dataset::new(vec![d("2024-01-01"), d("2024-01-02")], cols);
        assert_eq!(ds.len(), 2);
        assert!(ds.column("close").unwrap()[1].is_nan());
    }

    #[test]
    fn dataset_dedupes_per_column() {
        let mut cols = BTreeMap::new();
        cols.insert("close".to_string(), vec![1.0, 2.0, 3.0]);
        cols.insert("open".to_string(), vec![10.0, 20.0, 30.0]);
        let ds = Dataset::new(
            vec![d("2024-01-02"), d("2024-01-01"), d("2024-01-02")],
            cols,
        );
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column("close").unwrap(), &[2.0, 3.0]);
        assert_eq!(ds.column("open").unwrap(), &[20.0, 30.0]);
    }
}
