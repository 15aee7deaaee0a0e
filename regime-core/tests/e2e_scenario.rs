//! End-to-end pipeline run: load → features → replay → validate.
//!
//! A steadily rising asset with calm volatility and no positioning data
//! should replay to bullish trend calls, beat cash, and grade its
//! resolvable calls correct.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use regime_core::config::{Config, ScorerMode};
use regime_core::data::{DataStore, DatasetMap};
use regime_core::domain::{Dataset, Verdict};
use regime_core::replay::replay;
use regime_core::validate::validate;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn daily_dataset(start: &str, column: &str, values: Vec<f64>) -> Dataset {
    let start = d(start);
    let dates = (0..values.len())
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect();
    let mut columns = BTreeMap::new();
    columns.insert(column.to_string(), values);
    Dataset::new(dates, columns)
}

fn scenario_store() -> DataStore {
    let n = 300;
    let mut map = DatasetMap::new();
    // Linear rise: every trailing 30-day move is positive.
    map.insert(
        "btc".into(),
        daily_dataset("2023-01-01", "close", (0..n).map(|i| 100.0 + i as f64).collect()),
    );
    // Perfectly flat volatility: the upstream loader already computed a
    // deviation column, always zero.
    map.insert(
        "vix".into(),
        daily_dataset("2023-01-01", "deviation_pct", vec![0.0; n]),
    );
    // Positioning source present but empty: engine must degrade, not fail.
    map.insert("btc_cot".into(), Dataset::empty());
    DataStore::new(map)
}

fn scenario_config() -> Config {
    let mut config = Config::default();
    config.scoring.mode = ScorerMode::Compass;
    // Thresholds sized to the scenario's gentle drift.
    config.scoring.momentum_strong_move_pct = 5.0;
    config.scoring.compass_bullish = 0.5;
    config.backtest.horizon_months = 1;
    config.validate().unwrap();
    config
}

#[test]
fn rising_market_replays_to_bullish_trend_calls() {
    let store = scenario_store();
    let config = scenario_config();

    let records = replay(&store, "btc", &config);
    assert!(!records.is_empty());
    for record in &records {
        assert_eq!(record.verdict, Verdict::BullishTrend, "at {}", record.date);
        assert!(record.total_score >= config.scoring.compass_bullish);
        assert!(record.confidence > 0.0);
        // Factor rows always sum to the total.
        let sum: f64 = record.factors.iter().map(|f| f.score).sum();
        assert!((record.total_score - sum).abs() < 1e-9);

        let score_of = |name: &str| {
            record
                .factors
                .iter()
                .find(|f| f.name == name)
                .map(|f| f.score)
                .unwrap()
        };
        // Flat deviation is neutral, empty positioning is a zero diagnostic
        // row, and the rising price carries the score.
        assert_eq!(score_of("Volatility"), 0.0);
        assert_eq!(score_of("Positioning"), 0.0);
        assert!(score_of("Momentum") > 0.0);
    }
}

#[test]
fn validation_tracks_the_rise_and_grades_calls_correct() {
    let store = scenario_store();
    let config = scenario_config();

    let records = replay(&store, "btc", &config);
    let price = store.get("btc").unwrap().clone();
    let report = validate(&price, &records, &config.backtest);

    let m = &report.metrics;
    assert!(m.strategy_return_pct > 0.0);
    assert!(m.strategy_return_pct <= m.buy_hold_return_pct + 1e-9);
    assert_eq!(m.strategy_max_drawdown_pct, 0.0);

    // Every call whose one-month horizon fits inside the history is a
    // correct bullish call; late calls stay unresolved.
    let c = m.counts;
    assert!(c.bullish_correct > 0);
    assert_eq!(c.bullish_wrong, 0);
    assert_eq!(c.bearish_correct + c.bearish_wrong, 0);
    assert_eq!(m.directional_accuracy, 1.0);
    assert!(m.coverage > 0.0 && m.coverage <= 1.0);
    assert_eq!(
        c.evaluated() + c.non_directional + c.unresolved,
        records.len()
    );
}

#[test]
fn empty_positioning_source_scores_like_an_absent_one() {
    let store = scenario_store();
    let config = scenario_config();
    let with_cot_gap = replay(&store, "btc", &config);

    // Same store minus the empty positioning dataset scores identically.
    let mut map = store.snapshot().clone();
    map.remove("btc_cot");
    let without = replay(&DataStore::new(map), "btc", &config);
    assert_eq!(with_cot_gap, without);
}
