//! Killzone CLI: scan, backtest, and batch commands over candle CSVs.
//!
//! Commands:
//! - `scan`: print the setups found in one series
//! - `backtest`: scan, simulate, print the statistics, write artifacts
//! - `batch`: backtest several CSV files in parallel
//! - `config check` / `config default`: validate or print a run config
//! - `synth`: write a deterministic synthetic candle CSV

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use killzone_core::config::StrategyConfig;
use killzone_core::pipeline::{Pipeline, SessionOutcome};
use killzone_runner::batch::run_csv_batch;
use killzone_runner::data_loader::{generate_synthetic_candles, symbol_from_path, write_csv};
use killzone_runner::{run_from_config, save_artifacts, RunConfig, RunReport};

#[derive(Parser)]
#[command(
    name = "killzone",
    about = "Killzone: session-window setup scanner and outcome backtester"
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan one series and print the setups it produces.
    Scan {
        #[command(flatten)]
        source: SourceArgs,

        /// Print setups as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Scan, simulate outcomes, and write the artifact set.
    Backtest {
        #[command(flatten)]
        source: SourceArgs,

        /// Output directory for artifacts. Overrides the run config.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the summary only.
        #[arg(long, default_value_t = false)]
        no_artifacts: bool,
    },
    /// Backtest several CSV files in parallel. Symbols come from file names.
    Batch {
        /// Candle CSV files (e.g. data/XAUUSD_M15.csv).
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Strategy TOML overriding the defaults.
        #[arg(long)]
        strategy: Option<PathBuf>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "artifacts")]
        output_dir: PathBuf,

        /// Print the summary only.
        #[arg(long, default_value_t = false)]
        no_artifacts: bool,
    },
    /// Run config commands.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Write a deterministic synthetic candle CSV.
    Synth {
        /// Symbol; also seeds the generator.
        #[arg(long, default_value = "XAUUSD")]
        symbol: String,

        /// Number of weekdays to generate.
        #[arg(long, default_value_t = 20)]
        days: usize,

        /// First day (YYYY-MM-DD).
        #[arg(long, default_value = "2024-01-01")]
        start: NaiveDate,

        /// Candle width in minutes.
        #[arg(long, default_value_t = 15)]
        bar_minutes: u32,

        /// Output CSV path.
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Parse and validate a run config.
    Check {
        /// Path to the run config TOML.
        path: PathBuf,
    },
    /// Print a default run config.
    Default {
        #[arg(long, default_value = "XAUUSD")]
        symbol: String,

        /// Synthetic days in the generated `[run]` table.
        #[arg(long, default_value_t = 20)]
        synthetic_days: usize,
    },
}

/// Where the candles and strategy for a single run come from.
#[derive(Args)]
struct SourceArgs {
    /// Run config TOML with `[run]` and `[strategy]` tables.
    #[arg(long, conflicts_with_all = ["input", "synthetic_days"])]
    config: Option<PathBuf>,

    /// Candle CSV (`timestamp,open,high,low,close[,volume]`).
    #[arg(long, conflicts_with = "synthetic_days")]
    input: Option<PathBuf>,

    /// Use this many weekdays of synthetic candles.
    #[arg(long)]
    synthetic_days: Option<usize>,

    /// Symbol. Defaults to the CSV file name prefix.
    #[arg(long)]
    symbol: Option<String>,

    /// Strategy TOML overriding the defaults (or the run config's `[strategy]`).
    #[arg(long)]
    strategy: Option<PathBuf>,
}

impl SourceArgs {
    fn resolve(&self) -> Result<RunConfig> {
        let mut config = if let Some(path) = &self.config {
            RunConfig::from_file(path)?
        } else if let Some(input) = &self.input {
            let symbol = match &self.symbol {
                Some(s) => s.clone(),
                None => symbol_from_path(input)
                    .with_context(|| format!("cannot infer symbol from {}", input.display()))?,
            };
            RunConfig::csv(symbol, input)
        } else if let Some(days) = self.synthetic_days {
            let symbol = self.symbol.clone().unwrap_or_else(|| "XAUUSD".to_string());
            RunConfig::synthetic(symbol, days)
        } else {
            bail!("one of --config, --input, or --synthetic-days is required");
        };

        if let Some(symbol) = &self.symbol {
            config.run.symbol = symbol.clone();
        }
        if let Some(path) = &self.strategy {
            config.strategy = load_strategy(path)?;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Scan { source, json } => run_scan(&source, json),
        Commands::Backtest {
            source,
            output_dir,
            no_artifacts,
        } => run_backtest(&source, output_dir, no_artifacts),
        Commands::Batch {
            inputs,
            strategy,
            output_dir,
            no_artifacts,
        } => run_batch(&inputs, strategy.as_deref(), &output_dir, no_artifacts),
        Commands::Config { action } => match action {
            ConfigAction::Check { path } => run_config_check(&path),
            ConfigAction::Default {
                symbol,
                synthetic_days,
            } => run_config_default(symbol, synthetic_days),
        },
        Commands::Synth {
            symbol,
            days,
            start,
            bar_minutes,
            output,
        } => run_synth(&symbol, days, start, bar_minutes, &output),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_strategy(path: &Path) -> Result<StrategyConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read strategy {}", path.display()))?;
    StrategyConfig::from_toml_str(&text)
        .with_context(|| format!("invalid strategy {}", path.display()))
}

fn run_scan(source: &SourceArgs, json: bool) -> Result<()> {
    let config = source.resolve()?;
    let report = run_from_config(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.setups)?);
        return Ok(());
    }

    print_header(&report);
    if report.setups.is_empty() {
        println!("No setups.");
    } else {
        println!(
            "{:<10} {:<8} {:<7} {:<4} {:>12} {:>12} {:>12}  {:<17} Complete",
            "Day", "Session", "Setup", "Side", "Entry", "Stop", "Target", "Zone"
        );
        println!("{}", "-".repeat(98));
        for s in &report.setups {
            println!(
                "{:<10} {:<8} {:<7} {:<4} {:>12.5} {:>12.5} {:>12.5}  {:<17} {}",
                s.day,
                s.session,
                s.kind.label(),
                s.direction.label(),
                s.entry,
                s.stop,
                s.target,
                format!("{:.2}-{:.2}", s.zone.low, s.zone.high),
                if s.window_complete { "yes" } else { "no" },
            );
        }
    }
    println!();
    print_session_outcomes(&report);
    Ok(())
}

fn run_backtest(source: &SourceArgs, output_dir: Option<PathBuf>, no_artifacts: bool) -> Result<()> {
    let mut config = source.resolve()?;
    if let Some(dir) = output_dir {
        config.run.output_dir = dir;
    }
    let report = run_from_config(&config)?;

    print_header(&report);
    print_stats(&report);

    if !no_artifacts {
        let run_dir = save_artifacts(&report, &config.run.output_dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_batch(
    inputs: &[PathBuf],
    strategy: Option<&Path>,
    output_dir: &Path,
    no_artifacts: bool,
) -> Result<()> {
    let strategy = match strategy {
        Some(path) => load_strategy(path)?,
        None => StrategyConfig::default(),
    };
    let run_id = strategy.full_hash();
    let pipeline = Pipeline::new(strategy)?;

    let outcome = run_csv_batch(&pipeline, inputs, &run_id);
    for failure in &outcome.failures {
        eprintln!("Skipped {}: {}", failure.path.display(), failure.error);
    }
    if outcome.reports.is_empty() {
        bail!("no input could be loaded");
    }

    println!(
        "{:<16} {:>8} {:>7} {:>6} {:>6} {:>5} {:>9} {:>9}",
        "Input", "Candles", "Setups", "Wins", "Losses", "Open", "Win rate", "Total R"
    );
    println!("{}", "-".repeat(74));
    for r in &outcome.reports {
        let s = &r.stats;
        println!(
            "{:<16} {:>8} {:>7} {:>6} {:>6} {:>5} {:>8.2}% {:>+9.2}",
            r.label(),
            r.candle_count,
            s.setups_found,
            s.wins,
            s.losses,
            s.open_trades,
            s.winrate_pct,
            s.total_r
        );
    }

    if !no_artifacts {
        for r in &outcome.reports {
            let run_dir = save_artifacts(r, output_dir)?;
            println!("Artifacts saved to: {}", run_dir.display());
        }
    }
    Ok(())
}

fn run_config_check(path: &Path) -> Result<()> {
    let config = RunConfig::from_file(path)?;
    let pipeline = config.pipeline()?;

    println!("Config OK: {}", path.display());
    println!("Symbol:   {}", config.run.symbol);
    println!("Run ID:   {}", config.run_id());
    for w in pipeline.sessions().windows() {
        println!(
            "Window:   {:<8} {}-{}",
            w.name,
            w.start.format("%H:%M"),
            w.end.format("%H:%M")
        );
    }
    Ok(())
}

fn run_config_default(symbol: String, synthetic_days: usize) -> Result<()> {
    let config = RunConfig::synthetic(symbol, synthetic_days);
    let text = config
        .to_toml_string()
        .context("failed to serialize default config")?;
    print!("{text}");
    Ok(())
}

fn run_synth(
    symbol: &str,
    days: usize,
    start: NaiveDate,
    bar_minutes: u32,
    output: &Path,
) -> Result<()> {
    if days == 0 {
        bail!("--days must be at least 1");
    }
    let candles = generate_synthetic_candles(symbol, start, days, bar_minutes);
    write_csv(output, &candles)?;
    println!(
        "Wrote {} synthetic candles for {symbol} to {}",
        candles.len(),
        output.display()
    );
    Ok(())
}

// ─── Output ─────────────────────────────────────────────────────────

fn print_header(report: &RunReport) {
    println!("Symbol:  {}", report.symbol);
    println!("Input:   {}", report.label());
    println!(
        "Candles: {} over {} days",
        report.candle_count, report.day_count
    );
    println!("Run ID:  {}", report.run_id);
    if report.has_synthetic {
        println!("WARNING: synthetic data, results are not from market prices");
    }
    println!();
}

fn print_stats(report: &RunReport) {
    let s = &report.stats;
    println!("Setups found:     {}", s.setups_found);
    println!("Completed trades: {}", s.completed_trades);
    println!("Wins:             {}", s.wins);
    println!("Losses:           {}", s.losses);
    println!("Open:             {}", s.open_trades);
    println!("Win rate:         {:.2}%", s.winrate_pct);
    println!("Total R:          {:+.2}", s.total_r);

    if !s.by_session.is_empty() {
        println!();
        println!(
            "{:<10} {:>7} {:>6} {:>7} {:>9}",
            "Group", "Setups", "Wins", "Losses", "Total R"
        );
        println!("{}", "-".repeat(43));
        let by_session = s.by_session.iter().map(|(name, b)| (name.as_str(), b));
        let by_kind = s.by_kind.iter().map(|(kind, b)| (kind.label(), b));
        for (group, b) in by_session.chain(by_kind) {
            println!(
                "{:<10} {:>7} {:>6} {:>7} {:>+9.2}",
                group, b.setups, b.wins, b.losses, b.total_r
            );
        }
    }
    println!();
}

fn print_session_outcomes(report: &RunReport) {
    let mut emitted = 0;
    let mut no_bias = 0;
    let mut no_zone = 0;
    let mut exhausted = 0;
    let mut rejected = 0;
    let mut no_candles = 0;
    for s in &report.sessions {
        match s.outcome {
            SessionOutcome::Emitted => emitted += 1,
            SessionOutcome::NoBias => no_bias += 1,
            SessionOutcome::NoZone => no_zone += 1,
            SessionOutcome::WindowExhausted => exhausted += 1,
            SessionOutcome::Rejected { .. } => rejected += 1,
            SessionOutcome::NoCandles => no_candles += 1,
        }
    }
    println!(
        "Sessions: {} emitted, {} no bias, {} no zone, {} exhausted, {} rejected, {} without candles",
        emitted, no_bias, no_zone, exhausted, rejected, no_candles
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_backtest_with_input() {
        let cli = Cli::try_parse_from([
            "killzone",
            "backtest",
            "--input",
            "data/XAUUSD_M15.csv",
            "--no-artifacts",
        ])
        .unwrap();
        let Commands::Backtest { source, no_artifacts, .. } = cli.command else {
            panic!("expected backtest");
        };
        assert!(no_artifacts);
        let config = source.resolve().unwrap();
        assert_eq!(config.run.symbol, "XAUUSD");
    }

    #[test]
    fn config_and_input_conflict() {
        let parsed = Cli::try_parse_from([
            "killzone", "scan", "--config", "run.toml", "--input", "a.csv",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn source_requires_some_data() {
        let cli = Cli::try_parse_from(["killzone", "scan"]).unwrap();
        let Commands::Scan { source, .. } = cli.command else {
            panic!("expected scan");
        };
        assert!(source.resolve().is_err());
    }
}
