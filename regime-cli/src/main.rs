//! Regime CLI — score, replay, and validate commands.
//!
//! Commands:
//! - `score` — score each asset on the latest data and print the scorecard
//! - `replay` — walk-forward replay of historical signals, written as JSON + CSV
//! - `validate` — replay then grade the signals against realized prices

mod loader;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use regime_core::backtest::{run_backtest, BacktestReport};
use regime_core::config::Config;
use regime_core::data::DataStore;
use regime_core::domain::{Scorecard, SignalSeries};
use regime_core::replay::{replay, score_latest};
use regime_core::validate::{validate, ValidationReport};

#[derive(Parser)]
#[command(name = "regime", about = "Macro/crypto regime-signal engine")]
struct Cli {
    /// Directory holding the dataset CSV files.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Assets to run, by dataset key.
    #[arg(long, default_values_t = vec!["btc".to_string(), "eth".to_string()])]
    assets: Vec<String>,

    /// Output directory for artifacts.
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score each asset on the full dataset and print the scorecard.
    Score,
    /// Replay historical signals walk-forward and write them as artifacts.
    Replay,
    /// Replay, then validate the signals against realized prices.
    Validate,
    /// Replay, then simulate trading the signals with fees and a trailing stop.
    Backtest,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    let datasets = loader::load_datasets(&cli.data_dir)?;
    let store = DataStore::new(datasets);
    info!(
        datasets = store.keys().count(),
        fingerprint = store.fingerprint(),
        "data loaded"
    );
    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("creating {}", cli.output_dir.display()))?;

    // One asset failing must not take down the others.
    let mut failures = 0;
    for asset in &cli.assets {
        let result = match cli.command {
            Commands::Score => run_score(&store, asset, &config, &cli.output_dir),
            Commands::Replay => run_replay(&store, asset, &config, &cli.output_dir),
            Commands::Validate => run_validate(&store, asset, &config, &cli.output_dir),
            Commands::Backtest => run_backtest_cmd(&store, asset, &config, &cli.output_dir),
        };
        if let Err(err) = result {
            error!(asset, error = %format!("{err:#}"), "asset run failed");
            failures += 1;
        }
    }
    if failures == cli.assets.len() {
        bail!("all {} asset runs failed", failures);
    }
    Ok(())
}

fn run_score(store: &DataStore, asset: &str, config: &Config, out: &Path) -> Result<()> {
    let card = score_latest(store, asset, config);
    print_scorecard(asset, &card);
    write_json(&out.join(format!("{asset}_scorecard.json")), &card)
}

fn run_replay(store: &DataStore, asset: &str, config: &Config, out: &Path) -> Result<()> {
    let records = replay(store, asset, config);
    println!("{asset}: {} replayed signals", records.len());
    write_json(&out.join(format!("{asset}_signals.json")), &records)?;
    write_signals_csv(&out.join(format!("{asset}_signals.csv")), &records)
}

fn run_validate(store: &DataStore, asset: &str, config: &Config, out: &Path) -> Result<()> {
    let price = store.require(asset)?.clone();
    regime_core::data::require_column(asset, &price, "close")?;
    let records = replay(store, asset, config);
    let report = validate(&price, &records, &config.backtest);
    print_report(asset, &records, &report);
    write_json(&out.join(format!("{asset}_validation.json")), &report)?;
    write_equity_csv(&out.join(format!("{asset}_equity.csv")), &report)
}

fn run_backtest_cmd(store: &DataStore, asset: &str, config: &Config, out: &Path) -> Result<()> {
    let price = store.require(asset)?.clone();
    regime_core::data::require_column(asset, &price, "close")?;
    let records = replay(store, asset, config);
    let report = run_backtest(&price, &records, &config.backtest);
    let m = &report.metrics;
    println!(
        "{asset}: {} trades, return {:+.1}% (max DD {:.1}%, Sharpe {:.2})",
        m.trades, m.total_return_pct, m.max_drawdown_pct, m.sharpe
    );
    write_json(&out.join(format!("{asset}_backtest.json")), &report)?;
    write_trades_csv(&out.join(format!("{asset}_trades.csv")), &report)
}

fn print_scorecard(asset: &str, card: &Scorecard) {
    println!("{asset}: {} (total {:+.2}, confidence {:.0}%)",
        card.verdict.label(),
        card.total_score,
        card.confidence * 100.0
    );
    for factor in &card.factors {
        println!("  {:<12} {:+.2}  {}", factor.name, factor.score, factor.rationale);
    }
}

fn print_report(asset: &str, records: &SignalSeries, report: &ValidationReport) {
    let m = &report.metrics;
    println!("{asset}: {} signals", records.len());
    println!(
        "  strategy {:+.1}% (max DD {:.1}%, Sharpe {:.2})",
        m.strategy_return_pct, m.strategy_max_drawdown_pct, m.strategy_sharpe
    );
    println!(
        "  buy&hold {:+.1}% (max DD {:.1}%, Sharpe {:.2})",
        m.buy_hold_return_pct, m.buy_hold_max_drawdown_pct, m.buy_hold_sharpe
    );
    println!(
        "  directional accuracy {:.0}% on {:.0}% coverage",
        m.directional_accuracy * 100.0,
        m.coverage * 100.0
    );
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "artifact written");
    Ok(())
}

fn write_signals_csv(path: &Path, records: &SignalSeries) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["date", "total_score", "verdict", "confidence"])?;
    for r in records {
        writer.write_record([
            r.date.to_string(),
            format!("{:.4}", r.total_score),
            r.verdict.label().to_string(),
            format!("{:.4}", r.confidence),
        ])?;
    }
    writer.flush()?;
    info!(path = %path.display(), "artifact written");
    Ok(())
}

fn write_trades_csv(path: &Path, report: &BacktestReport) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["date", "action", "price", "units", "equity"])?;
    for t in &report.trades {
        writer.write_record([
            t.date.to_string(),
            t.action.label().to_string(),
            format!("{:.4}", t.price),
            format!("{:.6}", t.units),
            format!("{:.4}", t.equity),
        ])?;
    }
    writer.flush()?;
    info!(path = %path.display(), "artifact written");
    Ok(())
}

fn write_equity_csv(path: &Path, report: &ValidationReport) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["date", "price", "equity", "buy_hold"])?;
    for (strat, bh) in report.equity.iter().zip(&report.buy_hold) {
        writer.write_record([
            strat.date.to_string(),
            format!("{:.4}", strat.price),
            format!("{:.4}", strat.equity),
            format!("{:.4}", bh.equity),
        ])?;
    }
    writer.flush()?;
    info!(path = %path.display(), "artifact written");
    Ok(())
}
