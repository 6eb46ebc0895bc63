//! Outcome statistics: pure functions over simulated trades.
//!
//! Every loss counts as exactly -1R because the stop defines the risk unit;
//! every win counts as the setup's R multiple.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{SetupKind, SimulatedTrade, TradeOutcome};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub setups: usize,
    pub wins: usize,
    pub losses: usize,
    pub total_r: f64,
}

impl Breakdown {
    fn record(&mut self, trade: &SimulatedTrade) {
        self.setups += 1;
        match trade.outcome {
            TradeOutcome::HitTarget => self.wins += 1,
            TradeOutcome::HitStop => self.losses += 1,
            TradeOutcome::Open => {}
        }
        self.total_r += trade.realized_r().unwrap_or(0.0);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeStats {
    pub setups_found: usize,
    pub completed_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub open_trades: usize,
    pub winrate_pct: f64,
    pub total_r: f64,
    pub by_session: BTreeMap<String, Breakdown>,
    pub by_kind: BTreeMap<SetupKind, Breakdown>,
}

impl OutcomeStats {
    pub fn compute(trades: &[SimulatedTrade]) -> Self {
        let mut stats = Self {
            setups_found: trades.len(),
            ..Self::default()
        };

        for trade in trades {
            match trade.outcome {
                TradeOutcome::HitTarget => stats.wins += 1,
                TradeOutcome::HitStop => stats.losses += 1,
                TradeOutcome::Open => stats.open_trades += 1,
            }
            stats.total_r += trade.realized_r().unwrap_or(0.0);
            stats
                .by_session
                .entry(trade.setup.session.clone())
                .or_default()
                .record(trade);
            stats
                .by_kind
                .entry(trade.setup.kind)
                .or_default()
                .record(trade);
        }

        stats.completed_trades = stats.wins + stats.losses;
        stats.winrate_pct = winrate_pct(stats.wins, stats.completed_trades);
        stats
    }
}

/// `wins / completed * 100`, or 0 when nothing has completed.
pub fn winrate_pct(wins: usize, completed: usize) -> f64 {
    if completed == 0 {
        return 0.0;
    }
    wins as f64 / completed as f64 * 100.0
}
