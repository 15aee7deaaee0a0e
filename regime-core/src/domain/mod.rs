//! Domain types: dated series, verdicts, scoring records, equity points.

pub mod series;
pub mod signal;
pub mod verdict;

pub use series::{Dataset, Series};
pub use signal::{EquityPoint, Factor, Scorecard, SignalRecord, SignalSeries};
pub use verdict::{Direction, Verdict};
