//! Criterion benchmarks for the replay hot paths.
//!
//! Benchmarks:
//! 1. Feature frame construction on a multi-year store
//! 2. Full walk-forward replay (truncate + features + score per checkpoint)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::BTreeMap;

use chrono::NaiveDate;
use regime_core::config::Config;
use regime_core::data::{DataStore, DatasetMap};
use regime_core::domain::Dataset;
use regime_core::features::{build_features, FeatureMode};
use regime_core::replay::replay;

fn daily_dates(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    (0..n)
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect()
}

fn make_store(n: usize) -> DataStore {
    let close: Vec<f64> = (0..n)
        .map(|i| 100.0 + (i as f64) * 0.2 + 15.0 * ((i as f64) * 0.05).sin())
        .collect();
    let vix: Vec<f64> = (0..n)
        .map(|i| 20.0 + 8.0 * ((i as f64) * 0.03).cos())
        .collect();

    let mut map = DatasetMap::new();
    for (key, values) in [("btc", close.clone()), ("vix", vix), ("spx", close.clone()), ("dxy", close.clone()), ("us10y", close)] {
        let mut columns = BTreeMap::new();
        columns.insert("close".to_string(), values);
        map.insert(key.to_string(), Dataset::new(daily_dates(n), columns));
    }

    // Weekly positioning reports.
    let weeks = n / 7;
    let report_dates: Vec<NaiveDate> = (0..weeks)
        .map(|i| NaiveDate::from_ymd_opt(2020, 5, 12).unwrap() + chrono::Duration::days(7 * i as i64))
        .collect();
    let mut columns = BTreeMap::new();
    columns.insert(
        "comm_net".to_string(),
        (0..weeks).map(|i| ((i as f64) * 0.4).sin() * 1000.0).collect(),
    );
    columns.insert(
        "large_net".to_string(),
        (0..weeks).map(|i| ((i as f64) * 0.4).cos() * 1000.0).collect(),
    );
    map.insert("btc_cot".to_string(), Dataset::new(report_dates, columns));

    DataStore::new(map)
}

fn bench_build_features(c: &mut Criterion) {
    let config = Config::default();
    let mut group = c.benchmark_group("build_features");
    for n in [500usize, 2000] {
        let store = make_store(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                black_box(build_features(
                    store.snapshot(),
                    "btc",
                    FeatureMode::Signals,
                    &config,
                ))
            })
        });
    }
    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let config = Config::default();
    let store = make_store(1500);
    c.bench_function("replay_1500_bars", |b| {
        b.iter(|| black_box(replay(&store, "btc", &config)))
    });
}

criterion_group!(benches, bench_build_features, bench_replay);
criterion_main!(benches);
