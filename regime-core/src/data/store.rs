//! Keyed dataset snapshot.
//!
//! `DataStore` is the in-memory mapping from dataset key ("btc", "vix",
//! "btc_cot", …) to its tabular series, fingerprinted with blake3 so two
//! runs over the same inputs are provably over the same inputs. Cache
//! invalidation is explicit — `replace` and `refresh` recompute the
//! fingerprint; nothing expires by time. Replay correctness depends on the
//! snapshot staying frozen for the duration of one replay.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::Dataset;

use super::slice::truncate_dataset;
use super::DataError;

/// Mapping from dataset key to its tabular series.
pub type DatasetMap = BTreeMap<String, Dataset>;

/// A frozen, fingerprinted snapshot of all loaded datasets.
#[derive(Debug, Clone)]
pub struct DataStore {
    datasets: DatasetMap,
    fingerprint: String,
}

impl DataStore {
    pub fn new(datasets: DatasetMap) -> Self {
        let fingerprint = fingerprint_of(&datasets);
        DataStore {
            datasets,
            fingerprint,
        }
    }

    pub fn empty() -> Self {
        Self::new(DatasetMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&Dataset> {
        self.datasets.get(key)
    }

    /// Like `get`, for callers that cannot proceed without the dataset.
    pub fn require(&self, key: &str) -> Result<&Dataset, DataError> {
        self.datasets
            .get(key)
            .ok_or_else(|| DataError::MissingDataset(key.to_string()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(|k| k.as_str())
    }

    pub fn snapshot(&self) -> &DatasetMap {
        &self.datasets
    }

    /// Content hash of the snapshot. Changes iff the data changes.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Replace one dataset and recompute the fingerprint (explicit
    /// invalidation — the only way a snapshot changes).
    pub fn replace(&mut self, key: impl Into<String>, dataset: Dataset) {
        self.datasets.insert(key.into(), dataset);
        self.fingerprint = fingerprint_of(&self.datasets);
    }

    /// Swap in a full fresh load.
    pub fn refresh(&mut self, datasets: DatasetMap) {
        self.datasets = datasets;
        self.fingerprint = fingerprint_of(&self.datasets);
    }

    /// Point-in-time view: every dataset truncated to `date <= cutoff`.
    /// The store itself is untouched; each checkpoint works on its own copy.
    pub fn truncated(&self, cutoff: NaiveDate) -> DatasetMap {
        self.datasets
            .iter()
            .map(|(key, ds)| (key.clone(), truncate_dataset(ds, cutoff)))
            .collect()
    }
}

fn fingerprint_of(datasets: &DatasetMap) -> String {
    // BTreeMap iteration order is stable, so the serialization (and hash)
    // is deterministic for equal content.
    let json = serde_json::to_vec(datasets).unwrap_or_default();
    blake3::hash(&json).to_hex().to_string()
}
