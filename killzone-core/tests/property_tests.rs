//! Property tests for engine invariants.
//!
//! Uses proptest over random-walk 15-minute series spanning several days:
//! 1. Swing edges: nothing flagged in the first or last `swing_lookback` candles
//! 2. Zone bounds: every imbalance zone has low < high
//! 3. Setup geometry: stop on the loss side, target exactly R risk units away
//! 4. Single shot: at most one setup per (day, session)
//! 5. Earliest trigger: a closed trade exits on the first candle touching a level
//! 6. Determinism: identical inputs give identical outputs
//! 7. Win rate: recomputes from wins and completed trades

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use killzone_core::config::{EngulfRule, IntrabarPolicy, StopRule, StrategyConfig, ZoneSource};
use killzone_core::domain::{Candle, CandleSeries, Direction, TradeOutcome, TradeSetup};
use killzone_core::pipeline::Pipeline;
use killzone_core::structure::{detect_imbalances, detect_swings};

// ── Strategies (proptest) ────────────────────────────────────────────

fn build_candles(steps: &[(f64, f64, f64)]) -> Vec<Candle> {
    let base = NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut price = 1900.0;
    steps
        .iter()
        .enumerate()
        .map(|(i, &(delta, up, down))| {
            let open = price;
            let close = price + delta;
            price = close;
            Candle::new(
                base + Duration::minutes(15 * i as i64),
                open,
                open.max(close) + up,
                open.min(close) - down,
                close,
            )
        })
        .collect()
}

fn arb_candles() -> impl Strategy<Value = Vec<Candle>> {
    prop::collection::vec((-6.0..6.0_f64, 0.0..4.0_f64, 0.0..4.0_f64), 3..400)
        .prop_map(|steps| build_candles(&steps))
}

fn arb_config() -> impl Strategy<Value = StrategyConfig> {
    (
        1usize..4,
        0.0..30.0_f64,
        0.0..30.0_f64,
        1.0..5.0_f64,
        prop_oneof![Just(ZoneSource::PreWindow), Just(ZoneSource::SessionWindow)],
        prop_oneof![Just(EngulfRule::Body), Just(EngulfRule::WickClose)],
        prop_oneof![Just(StopRule::SecondSwing), Just(StopRule::EngulfExtreme)],
        any::<bool>(),
        prop_oneof![Just(IntrabarPolicy::WorstCase), Just(IntrabarPolicy::BestCase)],
    )
        .prop_map(
            |(lookback, dominant, impulse, r, zone_source, engulf_rule, stop_rule, confirmed, policy)| {
                StrategyConfig {
                    swing_lookback: lookback,
                    min_dominant_move: dominant,
                    min_impulse_move: impulse,
                    r_multiple: r,
                    zone_source,
                    engulf_rule,
                    stop_rule,
                    require_confirmed_swings: confirmed,
                    intrabar_policy: policy,
                    ..Default::default()
                }
            },
        )
}

fn touches_stop(setup: &TradeSetup, c: &Candle) -> bool {
    match setup.direction {
        Direction::Long => c.low <= setup.stop,
        Direction::Short => c.high >= setup.stop,
    }
}

fn touches_target(setup: &TradeSetup, c: &Candle) -> bool {
    match setup.direction {
        Direction::Long => c.high >= setup.target,
        Direction::Short => c.low <= setup.target,
    }
}

// ── 1-2. Structure ───────────────────────────────────────────────────

proptest! {
    /// No swing is flagged within the first or last `swing_lookback` candles.
    #[test]
    fn swings_avoid_edges(candles in arb_candles(), lookback in 1usize..6) {
        for s in detect_swings(&candles, lookback) {
            prop_assert!(s.index >= lookback);
            prop_assert!(s.index + lookback < candles.len());
        }
    }

    /// Every imbalance zone has strictly ordered bounds.
    #[test]
    fn zones_have_ordered_bounds(candles in arb_candles()) {
        for z in detect_imbalances(&candles) {
            prop_assert!(z.low < z.high);
            prop_assert!(z.index >= 1 && z.index + 1 < candles.len());
        }
    }
}

// ── 3-4. Setups ──────────────────────────────────────────────────────

proptest! {
    /// Stop on the loss side of entry, target exactly R risk units away.
    #[test]
    fn setup_geometry_holds(candles in arb_candles(), config in arb_config()) {
        let r = config.r_multiple;
        let pipeline = Pipeline::new(config).unwrap();
        let series = CandleSeries::new("SYN", candles).unwrap();
        for s in pipeline.scan(&series).setups {
            let risk = (s.entry - s.stop) * s.direction.sign();
            prop_assert!(risk > 0.0);
            let reward = (s.target - s.entry) * s.direction.sign();
            prop_assert!((reward - r * risk).abs() <= 1e-9 * reward.abs().max(1.0));
        }
    }

    /// At most one setup per (day, session) across any input.
    #[test]
    fn one_setup_per_day_and_session(candles in arb_candles(), config in arb_config()) {
        let pipeline = Pipeline::new(config).unwrap();
        let series = CandleSeries::new("SYN", candles).unwrap();
        let out = pipeline.scan(&series);
        let mut seen = HashSet::new();
        for s in &out.setups {
            prop_assert!(seen.insert((s.day, s.session.clone())));
        }
        prop_assert!(out.setups.len() <= out.sessions.len());
    }
}

// ── 5-7. Simulation and statistics ───────────────────────────────────

proptest! {
    /// A closed trade exits on the earliest post-confirmation candle touching
    /// a level; an open trade never touched either.
    #[test]
    fn exit_is_earliest_touch(candles in arb_candles(), config in arb_config()) {
        let policy = config.intrabar_policy;
        let pipeline = Pipeline::new(config).unwrap();
        let series = CandleSeries::new("SYN", candles).unwrap();
        let out = pipeline.backtest(&series);
        let candles = series.candles();

        for t in &out.trades {
            let s = &t.setup;
            let start = s.confirmation_index + 1;
            let end = t.exit_index.unwrap_or(candles.len());
            for c in &candles[start.min(end)..end] {
                prop_assert!(!touches_stop(s, c) && !touches_target(s, c));
            }
            match t.outcome {
                TradeOutcome::Open => prop_assert!(t.exit_index.is_none()),
                TradeOutcome::HitStop => {
                    let c = &candles[end];
                    prop_assert!(touches_stop(s, c));
                    if touches_target(s, c) {
                        prop_assert_eq!(policy, IntrabarPolicy::WorstCase);
                    }
                }
                TradeOutcome::HitTarget => {
                    let c = &candles[end];
                    prop_assert!(touches_target(s, c));
                    if touches_stop(s, c) {
                        prop_assert_eq!(policy, IntrabarPolicy::BestCase);
                    }
                }
            }
        }
    }

    /// Re-running on identical inputs gives identical results.
    #[test]
    fn backtest_is_deterministic(candles in arb_candles(), config in arb_config()) {
        let pipeline = Pipeline::new(config).unwrap();
        let series = CandleSeries::new("SYN", candles).unwrap();
        prop_assert_eq!(pipeline.backtest(&series), pipeline.backtest(&series));
    }

    /// Win rate is wins / completed * 100, or 0 with nothing completed.
    #[test]
    fn winrate_recomputes(candles in arb_candles(), config in arb_config()) {
        let pipeline = Pipeline::new(config).unwrap();
        let series = CandleSeries::new("SYN", candles).unwrap();
        let stats = pipeline.backtest(&series).stats;
        prop_assert_eq!(stats.completed_trades, stats.wins + stats.losses);
        prop_assert_eq!(stats.setups_found, stats.completed_trades + stats.open_trades);
        if stats.completed_trades == 0 {
            prop_assert_eq!(stats.winrate_pct, 0.0);
        } else {
            let expected = stats.wins as f64 / stats.completed_trades as f64 * 100.0;
            prop_assert!((stats.winrate_pct - expected).abs() < 1e-9);
        }
    }
}
