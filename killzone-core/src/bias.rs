//! Daily bias classification from the pre-window slice.
//!
//! One shot per day, never re-evaluated mid-session:
//! 1. Dominant move = last pre-window close minus first pre-window open. Below
//!    `min_dominant_move` in magnitude (or exactly flat) the day has no bias.
//! 2. Direction follows the sign of the dominant move.
//! 3. Over the last `manipulation_lookback_candles` candles, take the extreme
//!    against the direction (lowest low for longs, highest high for shorts). If
//!    it sits in the final `manipulation_recency_candles` of that lookback and
//!    price has since moved more than `min_impulse_move` away from it, the day is
//!    manipulation + break of structure; otherwise clean distribution.

use serde::{Deserialize, Serialize};

use crate::config::StrategyConfig;
use crate::domain::{Candle, Direction, SetupKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BiasKind {
    CleanDistribution,
    ManipulationBos,
    NoBias,
}

/// Why a day was classified NO_BIAS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoBiasReason {
    ShortPreWindow,
    WeakDominantMove,
}

/// Extreme probed by the manipulation test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManipulationProbe {
    pub price: f64,
    /// Position inside the lookback (0 = oldest candle of the lookback).
    pub offset: usize,
    pub lookback_len: usize,
    /// Favourable distance from the extreme to the last pre-window close.
    pub impulse: f64,
    pub recent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasClassification {
    pub kind: BiasKind,
    pub direction: Option<Direction>,
    pub dominant_move: f64,
    pub pre_window_len: usize,
    pub no_bias_reason: Option<NoBiasReason>,
    pub probe: Option<ManipulationProbe>,
}

impl BiasClassification {
    fn no_bias(reason: NoBiasReason, dominant_move: f64, pre_window_len: usize) -> Self {
        Self {
            kind: BiasKind::NoBias,
            direction: None,
            dominant_move,
            pre_window_len,
            no_bias_reason: Some(reason),
            probe: None,
        }
    }

    /// Setup kind and direction, or `None` for a no-bias day.
    pub fn tradeable(&self) -> Option<(SetupKind, Direction)> {
        let direction = self.direction?;
        match self.kind {
            BiasKind::ManipulationBos => Some((SetupKind::ManipulationBos, direction)),
            BiasKind::CleanDistribution => Some((SetupKind::CleanDistribution, direction)),
            BiasKind::NoBias => None,
        }
    }
}

/// Classify a day from its pre-window candles.
pub fn classify_bias(pre_window: &[Candle], config: &StrategyConfig) -> BiasClassification {
    let len = pre_window.len();
    let (first, last) = match (pre_window.first(), pre_window.last()) {
        (Some(f), Some(l)) if len >= config.min_pre_window_candles => (f, l),
        _ => return BiasClassification::no_bias(NoBiasReason::ShortPreWindow, 0.0, len),
    };

    let dominant_move = last.close - first.open;
    if dominant_move == 0.0 || dominant_move.abs() < config.min_dominant_move {
        return BiasClassification::no_bias(NoBiasReason::WeakDominantMove, dominant_move, len);
    }
    let direction = if dominant_move > 0.0 {
        Direction::Long
    } else {
        Direction::Short
    };

    let lookback_len = config.manipulation_lookback_candles.min(len);
    let lookback = &pre_window[len - lookback_len..];
    let probe = probe_manipulation(lookback, direction, last.close, config);

    let kind = if probe.recent && probe.impulse > config.min_impulse_move {
        BiasKind::ManipulationBos
    } else {
        BiasKind::CleanDistribution
    };

    BiasClassification {
        kind,
        direction: Some(direction),
        dominant_move,
        pre_window_len: len,
        no_bias_reason: None,
        probe: Some(probe),
    }
}

fn probe_manipulation(
    lookback: &[Candle],
    direction: Direction,
    last_close: f64,
    config: &StrategyConfig,
) -> ManipulationProbe {
    // Earliest occurrence wins on ties.
    let (offset, price) = match direction {
        Direction::Long => lookback
            .iter()
            .enumerate()
            .fold((0, f64::INFINITY), |best, (i, c)| {
                if c.low < best.1 {
                    (i, c.low)
                } else {
                    best
                }
            }),
        Direction::Short => lookback
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, c)| {
                if c.high > best.1 {
                    (i, c.high)
                } else {
                    best
                }
            }),
    };

    let lookback_len = lookback.len();
    let recent = offset >= lookback_len.saturating_sub(config.manipulation_recency_candles);
    let impulse = (last_close - price) * direction.sign();

    ManipulationProbe {
        price,
        offset,
        lookback_len,
        impulse,
        recent,
    }
}
