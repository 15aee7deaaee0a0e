//! Regime Core — macro/crypto regime-signal engine.
//!
//! This crate contains the full signal pipeline:
//! - Domain types (dated series, verdicts, scorecards, equity points)
//! - Temporal alignment (backward/nearest as-of joins, point-in-time slices)
//! - Feature construction over heterogeneous source series
//! - Composite scoring behind a strategy seam (sigma legacy / quantile compass)
//! - Walk-forward replay with no-lookahead truncation
//! - Trend validation against realized forward returns
//! - Fee-and-trailing-stop trade simulation over the signal series

pub mod backtest;
pub mod config;
pub mod data;
pub mod domain;
pub mod features;
pub mod replay;
pub mod scoring;
pub mod validate;
