//! Walk-forward signal replay.
//!
//! Each checkpoint truncates every dataset to `date <= checkpoint`, rebuilds
//! the feature frame from that view alone, and scores it. A replayed record
//! is therefore exactly the card a live run would have produced on that day;
//! no value anywhere in the pipeline may peek past the checkpoint.
//!
//! Checkpoints are independent, so they score in parallel. The collect
//! preserves schedule order and scoring is pure, which makes the whole
//! replay deterministic for a fixed store fingerprint and config.

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::Config;
use crate::data::DataStore;
use crate::domain::{Scorecard, SignalRecord, SignalSeries};
use crate::features::{build_features, FeatureMode};
use crate::scoring::build_scorer;

/// Checkpoint dates for one asset's price axis: the back half of the
/// history (never earlier than the warmup floor), stepped at the cadence
/// of the configured scorer.
pub fn checkpoints(price_dates: &[NaiveDate], config: &Config) -> Vec<NaiveDate> {
    let len = price_dates.len();
    if len < config.signals.min_price_rows {
        return Vec::new();
    }
    let fraction_start = (len as f64 * config.signals.start_fraction).ceil() as usize;
    let start = fraction_start.max(config.signals.min_start_bars);
    if start >= len {
        return Vec::new();
    }
    let step = config.signals.step_for(config.scoring.mode).max(1);
    (start..len).step_by(step).map(|i| price_dates[i]).collect()
}

/// Score one asset as of `cutoff`, seeing only data dated at or before it.
pub fn score_at(store: &DataStore, asset: &str, cutoff: NaiveDate, config: &Config) -> Scorecard {
    let view = store.truncated(cutoff);
    let frame = build_features(&view, asset, FeatureMode::Signals, config);
    let scorer = build_scorer(config.scoring.mode);
    scorer.score(&frame, config)
}

/// Score one asset on the full store, as a live run would.
pub fn score_latest(store: &DataStore, asset: &str, config: &Config) -> Scorecard {
    let frame = build_features(store.snapshot(), asset, FeatureMode::Signals, config);
    let scorer = build_scorer(config.scoring.mode);
    scorer.score(&frame, config)
}

/// Replay the full checkpoint schedule for one asset.
///
/// Too little price history yields an empty series, never an error; the
/// caller distinguishes "nothing to replay" from "replayed to NoData" by
/// the records themselves.
pub fn replay(store: &DataStore, asset: &str, config: &Config) -> SignalSeries {
    let price_dates = match store.get(asset) {
        Some(ds) if ds.has_column("close") => &ds.dates,
        _ => {
            debug!(asset, "no price dataset, empty replay");
            return Vec::new();
        }
    };
    let schedule = checkpoints(price_dates, config);
    if schedule.is_empty() {
        debug!(
            asset,
            rows = price_dates.len(),
            "price history below replay floor"
        );
        return Vec::new();
    }
    info!(
        asset,
        checkpoints = schedule.len(),
        fingerprint = store.fingerprint(),
        "replaying signals"
    );

    let scorer = build_scorer(config.scoring.mode);
    let records: SignalSeries = schedule
        .par_iter()
        .map(|&date| {
            let view = store.truncated(date);
            let frame = build_features(&view, asset, FeatureMode::Signals, config);
            let card = scorer.score(&frame, config);
            SignalRecord {
                date,
                total_score: card.total_score,
                verdict: card.verdict,
                confidence: card.confidence,
                factors: card.factors,
            }
        })
        .collect();

    debug!(asset, records = records.len(), "replay complete");
    records
}
