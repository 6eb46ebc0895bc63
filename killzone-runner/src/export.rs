//! Report export: JSON, CSV, and Markdown artifacts.
//!
//! Provides three export formats for run reports:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: setup list and trade tape for external analysis tools
//! - **Markdown**: human-readable summary with per-session and per-setup breakdowns
//!
//! Persisted reports carry a `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use killzone_core::domain::{SimulatedTrade, TradeOutcome, TradeSetup};
use killzone_core::pipeline::SessionOutcome;

use crate::runner::{RunReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `RunReport` to pretty JSON.
pub fn export_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize RunReport to JSON")
}

/// Deserialize a `RunReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunReport> {
    let report: RunReport =
        serde_json::from_str(json).context("failed to deserialize RunReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export setups as CSV.
///
/// Columns: symbol, day, session, setup, kind, side, confirmation_time, entry,
/// stop, target, risk, r_multiple, risk_pct, zone_low, zone_high, window_complete
pub fn export_setups_csv(setups: &[TradeSetup]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "day",
        "session",
        "setup",
        "kind",
        "side",
        "confirmation_time",
        "entry",
        "stop",
        "target",
        "risk",
        "r_multiple",
        "risk_pct",
        "zone_low",
        "zone_high",
        "window_complete",
    ])?;

    for s in setups {
        wtr.write_record([
            s.symbol.as_str(),
            &s.day.to_string(),
            &s.session,
            s.kind.label(),
            &format!("{:?}", s.kind),
            s.direction.label(),
            &s.confirmation_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            &format!("{:.5}", s.entry),
            &format!("{:.5}", s.stop),
            &format!("{:.5}", s.target),
            &format!("{:.5}", s.risk()),
            &format!("{:.2}", s.r_multiple),
            &format!("{:.2}", s.risk_pct),
            &format!("{:.5}", s.zone.low),
            &format!("{:.5}", s.zone.high),
            if s.window_complete { "true" } else { "false" },
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the trade tape as CSV.
///
/// Columns: symbol, day, session, setup, side, entry, stop, target, outcome,
/// exit_time, bars_held, realized_r, mfe_r, mae_r
pub fn export_trades_csv(trades: &[SimulatedTrade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "day",
        "session",
        "setup",
        "side",
        "entry",
        "stop",
        "target",
        "outcome",
        "exit_time",
        "bars_held",
        "realized_r",
        "mfe_r",
        "mae_r",
    ])?;

    for t in trades {
        let s = &t.setup;
        wtr.write_record([
            s.symbol.as_str(),
            &s.day.to_string(),
            &s.session,
            s.kind.label(),
            s.direction.label(),
            &format!("{:.5}", s.entry),
            &format!("{:.5}", s.stop),
            &format!("{:.5}", s.target),
            outcome_label(t.outcome),
            &t.exit_time
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            &t.bars_held.to_string(),
            &t.realized_r().map(|r| format!("{r:.2}")).unwrap_or_default(),
            &format!("{:.2}", t.mfe_r),
            &format!("{:.2}", t.mae_r),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn outcome_label(outcome: TradeOutcome) -> &'static str {
    match outcome {
        TradeOutcome::Open => "OPEN",
        TradeOutcome::HitTarget => "HIT_TARGET",
        TradeOutcome::HitStop => "HIT_STOP",
    }
}

// ─── Markdown ───────────────────────────────────────────────────────

/// Render a human-readable summary of one run.
pub fn render_markdown(report: &RunReport) -> String {
    let stats = &report.stats;
    let mut md = format!(
        "# {} run report\n\n\
- Source: `{}`\n\
- Run ID: `{}`\n\
- Candles: {} over {} days\n",
        report.symbol, report.source, report.run_id, report.candle_count, report.day_count
    );
    if report.has_synthetic {
        md.push_str("- **Synthetic data**: results are not from market prices\n");
    }

    md.push_str(&format!(
        "\n## Statistics\n\n\
| Metric | Value |\n\
|--------|-------|\n\
| Setups found | {} |\n\
| Completed trades | {} |\n\
| Wins | {} |\n\
| Losses | {} |\n\
| Open | {} |\n\
| Win rate | {:.2}% |\n\
| Total R | {:+.2} |\n",
        stats.setups_found,
        stats.completed_trades,
        stats.wins,
        stats.losses,
        stats.open_trades,
        stats.winrate_pct,
        stats.total_r
    ));

    if !stats.by_session.is_empty() {
        md.push_str("\n## By session\n\n");
        md.push_str("| Session | Setups | Wins | Losses | Total R |\n");
        md.push_str("|---------|--------|------|--------|---------|\n");
        for (name, b) in &stats.by_session {
            md.push_str(&format!(
                "| {name} | {} | {} | {} | {:+.2} |\n",
                b.setups, b.wins, b.losses, b.total_r
            ));
        }

        md.push_str("\n## By setup\n\n");
        md.push_str("| Setup | Setups | Wins | Losses | Total R |\n");
        md.push_str("|-------|--------|------|--------|---------|\n");
        for (kind, b) in &stats.by_kind {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {:+.2} |\n",
                kind.label(),
                b.setups,
                b.wins,
                b.losses,
                b.total_r
            ));
        }
    }

    let count = |pred: fn(&SessionOutcome) -> bool| {
        report.sessions.iter().filter(|s| pred(&s.outcome)).count()
    };
    md.push_str("\n## Session outcomes\n\n");
    md.push_str("| Outcome | Sessions |\n");
    md.push_str("|---------|----------|\n");
    let rows = [
        ("Emitted", count(|o| matches!(o, SessionOutcome::Emitted))),
        ("No bias", count(|o| matches!(o, SessionOutcome::NoBias))),
        ("No zone", count(|o| matches!(o, SessionOutcome::NoZone))),
        (
            "Window exhausted",
            count(|o| matches!(o, SessionOutcome::WindowExhausted)),
        ),
        (
            "Rejected",
            count(|o| matches!(o, SessionOutcome::Rejected { .. })),
        ),
        ("No candles", count(|o| matches!(o, SessionOutcome::NoCandles))),
    ];
    for (label, n) in rows {
        md.push_str(&format!("| {label} | {n} |\n"));
    }

    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one run.
///
/// Creates `{label}_{run_id prefix}/` under `output_dir` containing
/// `report.json`, `setups.csv`, `trades.csv`, and `summary.md`.
/// The label is the input's file stem, so two timeframes of one symbol get
/// separate directories. Returns the path to the created directory.
pub fn save_artifacts(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    let prefix: String = report.run_id.chars().take(12).collect();
    let run_dir = output_dir.join(format!("{}_{}", report.label(), prefix));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let write = |name: &str, body: String| -> Result<()> {
        let path = run_dir.join(name);
        std::fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))
    };
    write("report.json", export_json(report)?)?;
    write("setups.csv", export_setups_csv(&report.setups)?)?;
    write("trades.csv", export_trades_csv(&report.trades)?)?;
    write("summary.md", render_markdown(report))?;

    Ok(run_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use killzone_core::config::StrategyConfig;
    use killzone_core::feed::CandleFeed;
    use killzone_core::pipeline::Pipeline;

    use crate::data_loader::SyntheticFeed;
    use crate::runner::run_series;

    fn sample_report() -> RunReport {
        let pipeline = Pipeline::new(StrategyConfig {
            min_dominant_move: 5.0,
            min_impulse_move: 10.0,
            ..Default::default()
        })
        .unwrap();
        let feed = SyntheticFeed::new(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(), 10);
        let series = feed.fetch("XAUUSD").unwrap();
        run_series(&pipeline, &series, "XAUUSD", "0123456789abcdef", true)
    }

    #[test]
    fn json_round_trip() {
        let report = sample_report();
        let back = import_json(&export_json(&report).unwrap()).unwrap();
        assert_eq!(report, back);
    }

    #[test]
    fn json_keeps_every_float_bit() {
        let mut report = sample_report();
        report.stats.total_r = 1.0 / 3.0;
        report.stats.winrate_pct = 100.0 * 7.0 / 13.0;
        for t in &mut report.trades {
            t.mae_r = -15.0 / 13.0;
            t.mfe_r = 2.0_f64.sqrt();
        }
        let back = import_json(&export_json(&report).unwrap()).unwrap();
        assert_eq!(back.stats.total_r.to_bits(), report.stats.total_r.to_bits());
        assert_eq!(back.stats.winrate_pct.to_bits(), report.stats.winrate_pct.to_bits());
        assert_eq!(report, back);
    }

    #[test]
    fn rejects_newer_schema() {
        let mut report = sample_report();
        report.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&report).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn csv_has_one_row_per_record() {
        let report = sample_report();
        let setups = export_setups_csv(&report.setups).unwrap();
        assert_eq!(setups.lines().count(), report.setups.len() + 1);
        assert!(setups.starts_with("symbol,day,session,setup,kind,side"));

        let trades = export_trades_csv(&report.trades).unwrap();
        assert_eq!(trades.lines().count(), report.trades.len() + 1);
    }

    #[test]
    fn markdown_mentions_totals() {
        let report = sample_report();
        let md = render_markdown(&report);
        assert!(md.contains("# XAUUSD run report"));
        assert!(md.contains(&format!("| Setups found | {} |", report.stats.setups_found)));
        assert!(md.contains("Synthetic data"));
    }

    #[test]
    fn artifacts_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();
        let run_dir = save_artifacts(&report, dir.path()).unwrap();
        assert!(run_dir.ends_with("XAUUSD_0123456789ab"));
        for name in ["report.json", "setups.csv", "trades.csv", "summary.md"] {
            assert!(run_dir.join(name).exists(), "{name}");
        }
    }

    #[test]
    fn artifacts_are_separated_by_input_label() {
        let dir = tempfile::tempdir().unwrap();
        let mut m15 = sample_report();
        m15.source = "XAUUSD_M15".into();
        let mut m5 = m15.clone();
        m5.source = "XAUUSD_M5".into();

        let a = save_artifacts(&m15, dir.path()).unwrap();
        let b = save_artifacts(&m5, dir.path()).unwrap();
        assert_ne!(a, b);
        assert!(a.ends_with("XAUUSD_M15_0123456789ab"));
        assert!(b.ends_with("XAUUSD_M5_0123456789ab"));
        let reloaded = std::fs::read_to_string(a.join("report.json")).unwrap();
        assert_eq!(import_json(&reloaded).unwrap().source, "XAUUSD_M15");
    }
}
