//! Pipeline driver: series -> days -> session scans -> setups -> simulated trades.
//!
//! Days are independent of each other. Every setup and session report carries
//! its own day and session, and output is ordered by (day, window start).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assembler::{assemble, AssemblyContext};
use crate::bias::BiasClassification;
use crate::config::{ConfigError, StrategyConfig};
use crate::day::DayContext;
use crate::domain::{CandleSeries, SimulatedTrade, TradeSetup};
use crate::scanner::{scan_session, ExhaustReason, ScanState};
use crate::session::{SessionTable, SessionWindow};
use crate::simulator::simulate_all;
use crate::stats::OutcomeStats;

/// Result of one (day, session) scan. None of these are errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionOutcome {
    NoBias,
    NoCandles,
    NoZone,
    WindowExhausted,
    Rejected { reason: String },
    Emitted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub day: NaiveDate,
    pub session: String,
    pub outcome: SessionOutcome,
    /// Terminal state of the scan.
    pub state: ScanState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    pub day: NaiveDate,
    pub candle_count: usize,
    pub bias: BiasClassification,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanOutput {
    pub setups: Vec<TradeSetup>,
    pub sessions: Vec<SessionReport>,
    pub days: Vec<DayReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestOutput {
    pub scan: ScanOutput,
    pub trades: Vec<SimulatedTrade>,
    pub stats: OutcomeStats,
}

/// A validated strategy ready to run. Only constructible from a config that
/// passed validation.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: StrategyConfig,
    table: SessionTable,
}

impl Pipeline {
    pub fn new(config: StrategyConfig) -> Result<Self, ConfigError> {
        let table = config.validate()?;
        Ok(Self { config, table })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.table
    }

    /// Classify every day and scan every session window.
    pub fn scan(&self, series: &CandleSeries) -> ScanOutput {
        let mut out = ScanOutput::default();
        let candles = series.candles();
        let last_timestamp = series.last_timestamp();

        for (day, range) in series.day_ranges() {
            let ctx = DayContext::build(day, range, candles, &self.table, &self.config);
            debug!(
                symbol = series.symbol(),
                %day,
                bias = ?ctx.bias.kind,
                direction = ?ctx.bias.direction,
                dominant_move = ctx.bias.dominant_move,
                pre_window = ctx.pre_len,
                "day classified"
            );

            for window in self.table.windows() {
                let window_complete =
                    last_timestamp.is_some_and(|last| last >= day.and_time(window.end));
                let (report, setup) =
                    self.scan_window(&ctx, window, series.symbol(), window_complete);
                debug!(%day, session = %window.name, outcome = ?report.outcome, "session scanned");
                if let Some(setup) = setup {
                    out.setups.push(setup);
                }
                out.sessions.push(report);
            }

            out.days.push(DayReport {
                day,
                candle_count: ctx.candles.len(),
                bias: ctx.bias.clone(),
            });
        }

        out
    }

    fn scan_window(
        &self,
        ctx: &DayContext<'_>,
        window: &SessionWindow,
        symbol: &str,
        window_complete: bool,
    ) -> (SessionReport, Option<TradeSetup>) {
        let state = scan_session(ctx, window, &self.config);
        let mut setup = None;

        let outcome = match state {
            ScanState::NoBias => SessionOutcome::NoBias,
            ScanState::WindowExhausted { reason } => match reason {
                ExhaustReason::NoCandles => SessionOutcome::NoCandles,
                ExhaustReason::NoZone => SessionOutcome::NoZone,
                ExhaustReason::NoRetrace | ExhaustReason::NoConfirmation => {
                    SessionOutcome::WindowExhausted
                }
            },
            ScanState::SignalEmitted { confirmation } => {
                let meta = AssemblyContext {
                    symbol,
                    session: &window.name,
                    window_complete,
                };
                match assemble(ctx, &confirmation, meta, &self.config) {
                    Ok(s) => {
                        setup = Some(s);
                        SessionOutcome::Emitted
                    }
                    Err(rejection) => SessionOutcome::Rejected {
                        reason: rejection.to_string(),
                    },
                }
            }
            // scan_session always returns a terminal state.
            _ => SessionOutcome::WindowExhausted,
        };

        let report = SessionReport {
            day: ctx.day,
            session: window.name.clone(),
            outcome,
            state,
        };
        (report, setup)
    }

    /// Scan, then simulate every setup and aggregate statistics.
    pub fn backtest(&self, series: &CandleSeries) -> BacktestOutput {
        let scan = self.scan(series);
        let trades = simulate_all(&scan.setups, series.candles(), self.config.intrabar_policy);
        let stats = OutcomeStats::compute(&trades);
        debug!(
            symbol = series.symbol(),
            setups = stats.setups_found,
            wins = stats.wins,
            losses = stats.losses,
            total_r = stats.total_r,
            "backtest complete"
        );
        BacktestOutput {
            scan,
            trades,
            stats,
        }
    }
}
