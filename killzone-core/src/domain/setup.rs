//! Trade setups: fully priced proposals emitted once per (day, session).

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::structure::ImbalanceZone;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1.0 for long, -1.0 for short. Multiplying a price difference by this
    /// turns it into a favourable-is-positive quantity.
    pub fn sign(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Long => "BUY",
            Self::Short => "SELL",
        }
    }
}

/// Which structural day type produced the setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SetupKind {
    /// Liquidity grab against the dominant direction, then break of structure.
    ManipulationBos,
    /// Steady displacement from the day's open, no manipulation leg.
    CleanDistribution,
}

impl SetupKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::ManipulationBos => "SETUP_1",
            Self::CleanDistribution => "SETUP_2",
        }
    }
}

/// A fully priced trade proposal.
///
/// Invariants (checked by the assembler before construction):
/// - the stop is on the loss side of entry for `direction`
/// - `|target - entry| == r_multiple * |entry - stop|`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSetup {
    pub symbol: String,
    pub session: String,
    pub day: NaiveDate,
    pub kind: SetupKind,
    pub direction: Direction,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub r_multiple: f64,
    /// Informational only; does not affect geometry.
    pub risk_pct: f64,
    pub confirmation_time: NaiveDateTime,
    /// Index of the confirmation candle in the full series.
    pub confirmation_index: usize,
    /// Imbalance zone price retraced into before confirmation.
    pub zone: ImbalanceZone,
    /// False if the data ends before the session window closed that day.
    pub window_complete: bool,
    pub notes: Vec<String>,
}

impl TradeSetup {
    /// Price distance between entry and stop (one R).
    pub fn risk(&self) -> f64 {
        (self.entry - self.stop).abs()
    }
}
