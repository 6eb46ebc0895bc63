//! Killzone Core: session-window setup detection and outcome simulation.
//!
//! This crate contains the classification-and-confirmation engine:
//! - Domain types (candles, validated series, setups, simulated trades)
//! - Session window table and strategy configuration
//! - Swing point and imbalance zone detection
//! - Per-day bias classification from the pre-window slice
//! - Per-session confirmation state machine
//! - Signal assembly, walk-forward simulation, and statistics
//! - The candle feed trait that separates acquisition from the engine
//!
//! There is no file or network I/O here; see `killzone-runner` for that.

pub mod assembler;
pub mod bias;
pub mod config;
pub mod day;
pub mod domain;
pub mod feed;
pub mod pipeline;
pub mod scanner;
pub mod session;
pub mod simulator;
pub mod stats;
pub mod structure;

pub use config::{ConfigError, StrategyConfig};
pub use domain::{CandleSeries, DataError};
pub use feed::{CandleFeed, FeedError};
pub use pipeline::{BacktestOutput, Pipeline, ScanOutput, SessionOutcome, SessionReport};
