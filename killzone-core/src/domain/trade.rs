//! Simulated trades: a setup plus its walk-forward outcome.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::TradeSetup;

/// Outcome state. Transitions only `Open -> HitTarget` or `Open -> HitStop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeOutcome {
    Open,
    HitTarget,
    HitStop,
}

impl TradeOutcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Open)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedTrade {
    pub setup: TradeSetup,
    pub outcome: TradeOutcome,
    pub exit_index: Option<usize>,
    pub exit_time: Option<NaiveDateTime>,
    /// Candles walked after the confirmation candle (including the exit candle).
    pub bars_held: usize,
    /// Maximum favourable excursion, in R.
    pub mfe_r: f64,
    /// Maximum adverse excursion, in R.
    pub mae_r: f64,
}

impl SimulatedTrade {
    pub fn open(setup: TradeSetup) -> Self {
        Self {
            setup,
            outcome: TradeOutcome::Open,
            exit_index: None,
            exit_time: None,
            bars_held: 0,
            mfe_r: 0.0,
            mae_r: 0.0,
        }
    }

    /// Close the trade. Has no effect if it is already closed, so a trade
    /// can never leave a terminal state.
    pub(crate) fn close(&mut self, outcome: TradeOutcome, index: usize, time: NaiveDateTime) {
        debug_assert!(outcome.is_terminal());
        if self.outcome.is_terminal() || !outcome.is_terminal() {
            return;
        }
        self.outcome = outcome;
        self.exit_index = Some(index);
        self.exit_time = Some(time);
    }

    /// Realised result in R: `+r_multiple` on target, `-1` on stop, `None` while open.
    pub fn realized_r(&self) -> Option<f64> {
        match self.outcome {
            TradeOutcome::Open => None,
            TradeOutcome::HitTarget => Some(self.setup.r_multiple),
            TradeOutcome::HitStop => Some(-1.0),
        }
    }
}
