//! Data plumbing: as-of joins, point-in-time truncation, keyed snapshots.
//!
//! No I/O lives here — loading is the CLI's job. Everything below operates
//! on already-canonical in-memory datasets.

pub mod align;
pub mod slice;
pub mod store;

pub use store::{DataStore, DatasetMap};

use thiserror::Error;

/// A genuinely wrong-shaped dataset request. Absent or thin data degrades
/// to neutral results everywhere in the engine; this error is reserved for
/// callers that require a dataset or column to exist.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("dataset {0:?} is not loaded")]
    MissingDataset(String),
    #[error("dataset {dataset:?} has no {column:?} column")]
    MissingColumn { dataset: String, column: String },
}

/// The named column of a dataset, as a hard requirement.
pub fn require_column<'a>(
    key: &str,
    ds: &'a crate::domain::Dataset,
    column: &str,
) -> Result<&'a [f64], DataError> {
    ds.column(column).ok_or_else(|| DataError::MissingColumn {
        dataset: key.to_string(),
        column: column.to_string(),
    })
}
