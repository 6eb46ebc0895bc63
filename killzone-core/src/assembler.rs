//! Signal assembler: prices a confirmation into a [`TradeSetup`].

use std::fmt;
use std::ops::RangeInclusive;

use crate::config::{StopRule, StrategyConfig};
use crate::day::DayContext;
use crate::domain::{Direction, TradeSetup};
use crate::scanner::Confirmation;
use crate::structure::SwingKind;

/// A confirmation that cannot be priced. An ordinary "no trade", not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    /// Stop on the wrong side of (or equal to) entry.
    NonPositiveRisk { entry: f64, stop: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveRisk { entry, stop } => {
                write!(f, "non-positive risk: entry {entry:.5}, stop {stop:.5}")
            }
        }
    }
}

/// Where the stop came from, for the setup notes.
#[derive(Debug, Clone, Copy, PartialEq)]
enum StopSource {
    Swing { local: usize },
    Fallback { candles: usize },
    EngulfExtreme,
}

/// Inputs that live outside the day context.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyContext<'a> {
    pub symbol: &'a str,
    pub session: &'a str,
    pub window_complete: bool,
}

pub fn assemble(
    ctx: &DayContext<'_>,
    confirmation: &Confirmation,
    meta: AssemblyContext<'_>,
    config: &StrategyConfig,
) -> Result<TradeSetup, Rejection> {
    let candle = &ctx.candles[confirmation.index];
    let direction = confirmation.direction;
    let entry = candle.close;

    let (stop, source) = match config.stop_rule {
        StopRule::SecondSwing => second_swing_stop(ctx, confirmation, config),
        StopRule::EngulfExtreme => (
            candle_extreme(ctx, confirmation.index.saturating_sub(1)..=confirmation.index, direction),
            StopSource::EngulfExtreme,
        ),
    };

    let risk = (entry - stop) * direction.sign();
    if !(risk > 0.0) {
        return Err(Rejection::NonPositiveRisk { entry, stop });
    }
    let target = entry + direction.sign() * config.r_multiple * risk;

    let time = candle.timestamp;
    let mut notes = vec![
        format!(
            "bias {} {} (dominant move {:.2})",
            confirmation.kind.label(),
            direction.label(),
            ctx.bias.dominant_move
        ),
        format!(
            "zone {:.2}-{:.2} from {}, entered {}",
            confirmation.zone.low,
            confirmation.zone.high,
            ctx.candles[confirmation.zone.index].timestamp.format("%H:%M"),
            ctx.candles[confirmation.entered_at].timestamp.format("%H:%M"),
        ),
    ];
    notes.push(match source {
        StopSource::Swing { local } => format!(
            "stop at swing {:.2} from {}",
            stop,
            ctx.candles[local].timestamp.format("%H:%M")
        ),
        StopSource::Fallback { candles } => {
            format!("stop at {candles}-candle extreme {stop:.2} (fewer than two swings)")
        }
        StopSource::EngulfExtreme => format!("stop at engulfing extreme {stop:.2}"),
    });
    if !meta.window_complete {
        notes.push("window incomplete in data".to_string());
    }

    Ok(TradeSetup {
        symbol: meta.symbol.to_string(),
        session: meta.session.to_string(),
        day: ctx.day,
        kind: confirmation.kind,
        direction,
        entry,
        stop,
        target,
        r_multiple: config.r_multiple,
        risk_pct: config.risk_per_trade_pct,
        confirmation_time: time,
        confirmation_index: ctx.global(confirmation.index),
        zone: confirmation.zone,
        window_complete: meta.window_complete,
        notes,
    })
}

/// Second-most-recent opposite swing before the confirmation candle, or the
/// extreme of up to three preceding candles when fewer than two swings qualify.
fn second_swing_stop(
    ctx: &DayContext<'_>,
    confirmation: &Confirmation,
    config: &StrategyConfig,
) -> (f64, StopSource) {
    let opposite = match confirmation.direction {
        Direction::Long => SwingKind::Low,
        Direction::Short => SwingKind::High,
    };
    let conf = confirmation.index;
    let lookahead = if config.require_confirmed_swings {
        config.swing_lookback
    } else {
        0
    };

    let second = ctx
        .swings
        .iter()
        .rev()
        .filter(|s| s.kind == opposite && s.index + lookahead < conf)
        .nth(1);
    if let Some(second) = second {
        return (second.price, StopSource::Swing { local: second.index });
    }

    let from = conf.saturating_sub(3);
    let candles = conf - from;
    if candles == 0 {
        // No predecessor that day; fall back to the confirmation candle itself.
        return (
            candle_extreme(ctx, conf..=conf, confirmation.direction),
            StopSource::Fallback { candles: 1 },
        );
    }
    (
        candle_extreme(ctx, from..=conf - 1, confirmation.direction),
        StopSource::Fallback { candles },
    )
}

/// Lowest low (long) or highest high (short) over a day-local index range.
fn candle_extreme(
    ctx: &DayContext<'_>,
    range: RangeInclusive<usize>,
    direction: Direction,
) -> f64 {
    let slice = &ctx.candles[range];
    match direction {
        Direction::Long => slice.iter().map(|c| c.low).fold(f64::INFINITY, f64::min),
        Direction::Short => slice
            .iter()
            .map(|c| c.high)
            .fold(f64::NEG_INFINITY, f64::max),
    }
}
