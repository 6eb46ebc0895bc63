//! Outcome simulator: walk a setup forward until its stop or target trades.
//!
//! The walk starts on the candle after confirmation and may run past the end
//! of the setup's day. When one candle's range covers both levels the
//! [`IntrabarPolicy`] decides which fired first; true intrabar ordering is
//! unknown, so the default assumes the stop.

use crate::config::IntrabarPolicy;
use crate::domain::{Candle, Direction, SimulatedTrade, TradeOutcome, TradeSetup};

/// Which levels a single candle reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LevelHits {
    stop: bool,
    target: bool,
}

fn level_hits(setup: &TradeSetup, candle: &Candle) -> LevelHits {
    match setup.direction {
        Direction::Long => LevelHits {
            stop: candle.low <= setup.stop,
            target: candle.high >= setup.target,
        },
        Direction::Short => LevelHits {
            stop: candle.high >= setup.stop,
            target: candle.low <= setup.target,
        },
    }
}

fn resolve(hits: LevelHits, policy: IntrabarPolicy) -> Option<TradeOutcome> {
    match (hits.stop, hits.target, policy) {
        (true, true, IntrabarPolicy::WorstCase) => Some(TradeOutcome::HitStop),
        (true, true, IntrabarPolicy::BestCase) => Some(TradeOutcome::HitTarget),
        (true, false, _) => Some(TradeOutcome::HitStop),
        (false, true, _) => Some(TradeOutcome::HitTarget),
        (false, false, _) => None,
    }
}

/// Simulate one setup against the full candle series it was found in.
pub fn simulate(setup: &TradeSetup, candles: &[Candle], policy: IntrabarPolicy) -> SimulatedTrade {
    let mut trade = SimulatedTrade::open(setup.clone());
    let risk = setup.risk();
    let sign = setup.direction.sign();
    let start = setup.confirmation_index + 1;

    for (index, candle) in candles.iter().enumerate().skip(start) {
        trade.bars_held += 1;

        let (favourable, adverse) = match setup.direction {
            Direction::Long => (candle.high, candle.low),
            Direction::Short => (candle.low, candle.high),
        };
        if risk > 0.0 {
            trade.mfe_r = trade.mfe_r.max((favourable - setup.entry) * sign / risk);
            trade.mae_r = trade.mae_r.max((setup.entry - adverse) * sign / risk);
        }

        if let Some(outcome) = resolve(level_hits(setup, candle), policy) {
            trade.close(outcome, index, candle.timestamp);
            break;
        }
    }

    trade
}

/// Simulate every setup, preserving input order.
pub fn simulate_all(
    setups: &[TradeSetup],
    candles: &[Candle],
    policy: IntrabarPolicy,
) -> Vec<SimulatedTrade> {
    setups
        .iter()
        .map(|s| simulate(s, candles, policy))
        .collect()
}
