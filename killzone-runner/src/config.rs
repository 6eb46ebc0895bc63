//! Serializable run configuration.
//!
//! A run file has two tables:
//!
//! ```toml
//! [run]
//! symbol = "XAUUSD"
//! input = "data/XAUUSD_M15.csv"   # or: synthetic_days = 60
//! output_dir = "artifacts"
//!
//! [strategy]
//! r_multiple = 3.0
//! ```
//!
//! `[strategy]` is a core [`StrategyConfig`]; every field is optional.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use killzone_core::config::{ConfigError, StrategyConfig};
use killzone_core::pipeline::Pipeline;

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum RunConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid strategy: {0}")]
    Strategy(#[from] ConfigError),

    #[error("run needs exactly one data source: set either `input` or `synthetic_days`")]
    DataSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSection {
    pub symbol: String,
    /// CSV file with `timestamp,open,high,low,close[,volume]` columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
    /// Generate this many weekdays of synthetic candles instead of reading a file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthetic_days: Option<usize>,
    /// First synthetic day.
    #[serde(default = "default_synthetic_start")]
    pub synthetic_start: NaiveDate,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_synthetic_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

/// Where a run's candles come from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSpec {
    Csv(PathBuf),
    Synthetic { start: NaiveDate, days: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub run: RunSection,
    #[serde(default)]
    pub strategy: StrategyConfig,
}

impl RunConfig {
    /// A synthetic-data run with the default strategy.
    pub fn synthetic(symbol: impl Into<String>, days: usize) -> Self {
        Self {
            run: RunSection {
                symbol: symbol.into(),
                input: None,
                synthetic_days: Some(days),
                synthetic_start: default_synthetic_start(),
                output_dir: default_output_dir(),
            },
            strategy: StrategyConfig::default(),
        }
    }

    /// A CSV run with the default strategy.
    pub fn csv(symbol: impl Into<String>, input: impl Into<PathBuf>) -> Self {
        let mut config = Self::synthetic(symbol, 0);
        config.run.synthetic_days = None;
        config.run.input = Some(input.into());
        config
    }

    pub fn from_toml_str(s: &str) -> Result<Self, RunConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, RunConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| RunConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs have the same RunId.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    pub fn data_spec(&self) -> Result<DataSpec, RunConfigError> {
        match (&self.run.input, self.run.synthetic_days) {
            (Some(path), None) => Ok(DataSpec::Csv(path.clone())),
            (None, Some(days)) if days > 0 => Ok(DataSpec::Synthetic {
                start: self.run.synthetic_start,
                days,
            }),
            _ => Err(RunConfigError::DataSource),
        }
    }

    /// Validate the strategy and the data source together.
    pub fn pipeline(&self) -> Result<Pipeline, RunConfigError> {
        self.data_spec()?;
        Ok(Pipeline::new(self.strategy.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use killzone_core::config::StopRule;

    const SAMPLE: &str = r#"
[run]
symbol = "XAUUSD"
input = "data/XAUUSD_M15.csv"

[strategy]
r_multiple = 4.0
stop_rule = "engulf_extreme"
"#;

    #[test]
    fn parses_sample() {
        let cfg = RunConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(cfg.run.symbol, "XAUUSD");
        assert_eq!(cfg.run.output_dir, PathBuf::from("artifacts"));
        assert_eq!(cfg.strategy.r_multiple, 4.0);
        assert_eq!(cfg.strategy.stop_rule, StopRule::EngulfExtreme);
        assert_eq!(
            cfg.data_spec().unwrap(),
            DataSpec::Csv(PathBuf::from("data/XAUUSD_M15.csv"))
        );
        assert!(cfg.pipeline().is_ok());
    }

    #[test]
    fn strategy_table_is_optional() {
        let cfg = RunConfig::from_toml_str("[run]\nsymbol = \"EURUSD\"\nsynthetic_days = 5\n").unwrap();
        assert_eq!(cfg.strategy, StrategyConfig::default());
        assert!(matches!(
            cfg.data_spec().unwrap(),
            DataSpec::Synthetic { days: 5, .. }
        ));
    }

    #[test]
    fn rejects_ambiguous_data_source() {
        let both = RunConfig::from_toml_str(
            "[run]\nsymbol = \"X\"\ninput = \"a.csv\"\nsynthetic_days = 3\n",
        )
        .unwrap();
        assert!(matches!(both.data_spec(), Err(RunConfigError::DataSource)));

        let neither = RunConfig::from_toml_str("[run]\nsymbol = \"X\"\n").unwrap();
        assert!(matches!(neither.pipeline(), Err(RunConfigError::DataSource)));
    }

    #[test]
    fn invalid_strategy_surfaces_before_running() {
        let cfg = RunConfig::from_toml_str(
            "[run]\nsymbol = \"X\"\nsynthetic_days = 3\n[strategy]\nswing_lookback = 0\n",
        )
        .unwrap();
        assert!(matches!(
            cfg.pipeline(),
            Err(RunConfigError::Strategy(ConfigError::NonPositiveLookback { .. }))
        ));
    }

    #[test]
    fn default_toml_parses_back() {
        let cfg = RunConfig::synthetic("XAUUSD", 20);
        let text = cfg.to_toml_string().unwrap();
        assert!(text.contains("[strategy]"));
        assert_eq!(RunConfig::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn csv_constructor_sets_input_only() {
        let cfg = RunConfig::csv("XAUUSD", "data/XAUUSD.csv");
        assert_eq!(
            cfg.data_spec().unwrap(),
            DataSpec::Csv(PathBuf::from("data/XAUUSD.csv"))
        );
    }

    #[test]
    fn run_id_deterministic_and_param_sensitive() {
        let a = RunConfig::from_toml_str(SAMPLE).unwrap();
        let mut b = a.clone();
        assert_eq!(a.run_id(), b.run_id());
        assert_eq!(a.run_id().len(), 64);
        b.strategy.engulf_min_ratio = 0.5;
        assert_ne!(a.run_id(), b.run_id());
    }
}
