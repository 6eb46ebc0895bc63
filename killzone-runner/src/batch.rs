//! Multi-symbol batch runs.
//!
//! Inputs are independent, so each series is backtested on its own rayon
//! task. Results are returned sorted by symbol, then by input label,
//! regardless of completion order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use killzone_core::domain::CandleSeries;
use killzone_core::pipeline::Pipeline;

use crate::data_loader::{load_csv, source_label, symbol_from_path, LoadError};
use crate::runner::{run_series, RunReport};

/// Why a batch input was skipped.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Two inputs would write their artifacts to the same directory.
    #[error("duplicate input label '{label}' (already used by {})", first.display())]
    DuplicateSource { label: String, first: PathBuf },
}

/// An input that could not be run.
#[derive(Debug)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub error: BatchError,
}

/// Outcome of a file-based batch: one report per readable input.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub reports: Vec<RunReport>,
    pub failures: Vec<BatchFailure>,
}

/// Backtest every series in parallel with one shared pipeline.
///
/// Each report is labelled with its symbol. Use [`run_csv_batch`] for several
/// inputs on one symbol.
pub fn run_batch(pipeline: &Pipeline, series: &[CandleSeries], run_id: &str) -> Vec<RunReport> {
    let labelled: Vec<(String, &CandleSeries)> =
        series.iter().map(|s| (s.symbol().to_string(), s)).collect();
    run_labelled(pipeline, &labelled, run_id)
}

fn run_labelled(
    pipeline: &Pipeline,
    inputs: &[(String, &CandleSeries)],
    run_id: &str,
) -> Vec<RunReport> {
    let mut reports: Vec<RunReport> = inputs
        .par_iter()
        .map(|(source, s)| run_series(pipeline, s, source, run_id, false))
        .collect();
    reports.sort_by(|a, b| (&a.symbol, &a.source).cmp(&(&b.symbol, &b.source)));
    reports
}

/// Load and backtest CSV files. The symbol comes from each file name and the
/// file stem labels the report, so `XAUUSD_M15.csv` and `XAUUSD_M5.csv` run
/// side by side.
///
/// A file that fails to load, or whose label repeats an earlier input's, is
/// recorded and skipped; the rest still run.
pub fn run_csv_batch(pipeline: &Pipeline, paths: &[PathBuf], run_id: &str) -> BatchOutcome {
    let loaded: Vec<(&PathBuf, Result<CandleSeries, LoadError>)> =
        paths.par_iter().map(|p| (p, load_for_batch(p))).collect();

    let mut inputs: Vec<(String, CandleSeries)> = Vec::with_capacity(loaded.len());
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    let mut failures = Vec::new();
    for (path, result) in loaded {
        let outcome = result.map_err(BatchError::from).and_then(|series| {
            let label = source_label(path).unwrap_or_else(|| series.symbol().to_string());
            match seen.get(&label) {
                Some(first) => Err(BatchError::DuplicateSource {
                    label,
                    first: first.clone(),
                }),
                None => {
                    seen.insert(label.clone(), path.clone());
                    Ok((label, series))
                }
            }
        });
        match outcome {
            Ok(input) => inputs.push(input),
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping input");
                failures.push(BatchFailure {
                    path: path.clone(),
                    error,
                });
            }
        }
    }

    let labelled: Vec<(String, &CandleSeries)> =
        inputs.iter().map(|(label, s)| (label.clone(), s)).collect();
    let reports = run_labelled(pipeline, &labelled, run_id);
    info!(
        runs = reports.len(),
        skipped = failures.len(),
        "batch complete"
    );
    BatchOutcome { reports, failures }
}

fn load_for_batch(path: &Path) -> Result<CandleSeries, LoadError> {
    let symbol = symbol_from_path(path).unwrap_or_else(|| "UNKNOWN".to_string());
    load_csv(path, &symbol)
}
