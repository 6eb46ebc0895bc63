//! Run orchestration: wires a feed, the core pipeline, and the report.
//!
//! Entry points:
//! - `run_from_config()`: resolves the data source from a [`RunConfig`]. Used by the CLI.
//! - `run_with_feed()`: fetches one symbol from any [`CandleFeed`].
//! - `run_series()`: takes an already validated series, no I/O. Used by batch runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use killzone_core::config::ConfigError;
use killzone_core::domain::{CandleSeries, SimulatedTrade, TradeSetup};
use killzone_core::feed::{CandleFeed, FeedError};
use killzone_core::pipeline::{Pipeline, SessionReport};
use killzone_core::stats::OutcomeStats;

use crate::config::{DataSpec, RunConfig, RunConfigError};
use crate::data_loader::{load_csv, source_label, LoadError, SyntheticFeed};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] RunConfigError),
    #[error("strategy error: {0}")]
    Strategy(#[from] ConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of one run over one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: String,
    pub symbol: String,
    /// Input label that tells runs on the same symbol apart: the CSV file stem
    /// (`XAUUSD_M15`), or the symbol for feed runs.
    #[serde(default)]
    pub source: String,
    pub candle_count: usize,
    pub day_count: usize,
    pub has_synthetic: bool,
    pub setups: Vec<TradeSetup>,
    pub trades: Vec<SimulatedTrade>,
    pub sessions: Vec<SessionReport>,
    pub stats: OutcomeStats,
}

/// Default schema version for reports written before the field existed.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunReport {
    /// Name used for artifact directories. Falls back to the symbol for
    /// reports saved without a source label.
    pub fn label(&self) -> &str {
        if self.source.is_empty() {
            &self.symbol
        } else {
            &self.source
        }
    }
}

/// Backtest an already loaded series. No I/O.
pub fn run_series(
    pipeline: &Pipeline,
    series: &CandleSeries,
    source: &str,
    run_id: &str,
    has_synthetic: bool,
) -> RunReport {
    let out = pipeline.backtest(series);
    let report = RunReport {
        schema_version: SCHEMA_VERSION,
        run_id: run_id.to_string(),
        symbol: series.symbol().to_string(),
        source: source.to_string(),
        candle_count: series.len(),
        day_count: out.scan.days.len(),
        has_synthetic,
        setups: out.scan.setups,
        trades: out.trades,
        sessions: out.scan.sessions,
        stats: out.stats,
    };
    info!(
        symbol = %report.symbol,
        source = %report.source,
        candles = report.candle_count,
        days = report.day_count,
        setups = report.stats.setups_found,
        wins = report.stats.wins,
        losses = report.stats.losses,
        total_r = report.stats.total_r,
        synthetic = report.has_synthetic,
        "run complete"
    );
    report
}

/// Fetch `symbol` from `feed` and backtest it.
pub fn run_with_feed(
    pipeline: &Pipeline,
    feed: &dyn CandleFeed,
    symbol: &str,
    run_id: &str,
) -> Result<RunReport, RunError> {
    let series = feed.fetch(symbol)?;
    Ok(run_series(pipeline, &series, symbol, run_id, feed.is_synthetic()))
}

/// Run everything a [`RunConfig`] describes.
pub fn run_from_config(config: &RunConfig) -> Result<RunReport, RunError> {
    let pipeline = config.pipeline()?;
    let run_id = config.run_id();
    let symbol = &config.run.symbol;

    match config.data_spec()? {
        DataSpec::Csv(path) => {
            let series = load_csv(&path, symbol)?;
            let source = source_label(&path).unwrap_or_else(|| symbol.clone());
            Ok(run_series(&pipeline, &series, &source, &run_id, false))
        }
        DataSpec::Synthetic { start, days } => {
            let feed = SyntheticFeed::new(start, days);
            run_with_feed(&pipeline, &feed, symbol, &run_id)
        }
    }
}
