//! Killzone Runner: run orchestration on top of `killzone-core`.
//!
//! This crate provides:
//! - TOML run configs with content-addressed run IDs
//! - CSV and deterministic synthetic candle feeds
//! - Single-symbol runs producing a versioned [`RunReport`]
//! - JSON, CSV, and Markdown artifacts
//! - Parallel multi-symbol batch runs

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use batch::{run_batch, run_csv_batch, BatchError, BatchFailure, BatchOutcome};
pub use config::{DataSpec, RunConfig, RunConfigError, RunId};
pub use data_loader::{load_csv, CsvFeed, LoadError, SyntheticFeed};
pub use export::{export_json, import_json, render_markdown, save_artifacts};
pub use runner::{run_from_config, run_series, run_with_feed, RunError, RunReport, SCHEMA_VERSION};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn run_report_is_send_sync() {
        assert_send::<RunReport>();
        assert_sync::<RunReport>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<DataSpec>();
        assert_sync::<DataSpec>();
    }

    #[test]
    fn feeds_are_send_sync() {
        assert_send::<CsvFeed>();
        assert_sync::<CsvFeed>();
        assert_send::<SyntheticFeed>();
        assert_sync::<SyntheticFeed>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
        assert_send::<BatchError>();
        assert_sync::<BatchError>();
    }
}
