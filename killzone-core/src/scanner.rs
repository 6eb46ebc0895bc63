//! Confirmation scanner: the per (day, session window) state machine.
//!
//! The scan state is an explicit value threaded through each candle:
//!
//! ```text
//! NO_BIAS (terminal)
//! BIAS_SET -> ZONE_SELECTED -> AWAITING_RETRACE -> IN_ZONE -> SIGNAL_EMITTED (terminal)
//!          \-> AWAITING_ZONE (session-window zones) --^        \-> WINDOW_EXHAUSTED (terminal)
//! ```
//!
//! At most one confirmation is produced per scan; once a terminal state is
//! reached the remaining window candles are never looked at.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::{EngulfRule, StrategyConfig, ZoneSource};
use crate::day::DayContext;
use crate::domain::{Candle, Direction, SetupKind};
use crate::session::SessionWindow;
use crate::structure::{ImbalanceZone, ZoneKind};

/// Why a window ended without a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustReason {
    /// No candles fell inside the window that day.
    NoCandles,
    /// No imbalance zone matched the bias direction.
    NoZone,
    /// Price never traded back into the zone.
    NoRetrace,
    /// Price entered the zone but no engulfing candle followed.
    NoConfirmation,
}

/// A confirmed engulfing candle. `index` is day-local.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Confirmation {
    pub index: usize,
    pub kind: SetupKind,
    pub direction: Direction,
    pub zone: ImbalanceZone,
    /// Day-local index of the first candle that touched the zone.
    pub entered_at: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanState {
    NoBias,
    BiasSet {
        kind: SetupKind,
        direction: Direction,
    },
    AwaitingZone {
        kind: SetupKind,
        direction: Direction,
    },
    ZoneSelected {
        kind: SetupKind,
        direction: Direction,
        zone: ImbalanceZone,
    },
    AwaitingRetrace {
        kind: SetupKind,
        direction: Direction,
        zone: ImbalanceZone,
    },
    InZone {
        kind: SetupKind,
        direction: Direction,
        zone: ImbalanceZone,
        entered_at: usize,
    },
    SignalEmitted {
        confirmation: Confirmation,
    },
    WindowExhausted {
        reason: ExhaustReason,
    },
}

impl ScanState {
    /// Entry state for a day: `NoBias` or `BiasSet`.
    pub fn initial(ctx: &DayContext<'_>) -> Self {
        match ctx.bias.tradeable() {
            Some((kind, direction)) => Self::BiasSet { kind, direction },
            None => Self::NoBias,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::NoBias | Self::SignalEmitted { .. } | Self::WindowExhausted { .. }
        )
    }

    pub fn confirmation(&self) -> Option<&Confirmation> {
        match self {
            Self::SignalEmitted { confirmation } => Some(confirmation),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NoBias => "NO_BIAS",
            Self::BiasSet { .. } => "BIAS_SET",
            Self::AwaitingZone { .. } => "AWAITING_ZONE",
            Self::ZoneSelected { .. } => "ZONE_SELECTED",
            Self::AwaitingRetrace { .. } => "AWAITING_RETRACE",
            Self::InZone { .. } => "IN_ZONE",
            Self::SignalEmitted { .. } => "SIGNAL_EMITTED",
            Self::WindowExhausted { .. } => "WINDOW_EXHAUSTED",
        }
    }

    /// Transitions that happen before the first window candle is read.
    fn select_zone(self, ctx: &DayContext<'_>, source: ZoneSource) -> Self {
        let Self::BiasSet { kind, direction } = self else {
            return self;
        };
        match source {
            ZoneSource::PreWindow => match ctx.pre_window_zone(ZoneKind::for_direction(direction)) {
                Some(zone) => Self::ZoneSelected {
                    kind,
                    direction,
                    zone,
                },
                None => Self::WindowExhausted {
                    reason: ExhaustReason::NoZone,
                },
            },
            ZoneSource::SessionWindow => Self::AwaitingZone { kind, direction },
        }
    }

    /// Advance by one window candle (day-local index `i`, `i >= window_start`).
    fn on_candle(
        self,
        ctx: &DayContext<'_>,
        i: usize,
        window_start: usize,
        config: &StrategyConfig,
    ) -> Self {
        let candle = &ctx.candles[i];
        match self {
            Self::ZoneSelected {
                kind,
                direction,
                zone,
            } => Self::AwaitingRetrace {
                kind,
                direction,
                zone,
            }
            .on_candle(ctx, i, window_start, config),

            Self::AwaitingZone { kind, direction } => {
                match latest_window_zone(ctx, direction, i, window_start) {
                    Some(zone) => Self::AwaitingRetrace {
                        kind,
                        direction,
                        zone,
                    },
                    None => self,
                }
            }

            Self::AwaitingRetrace {
                kind,
                direction,
                zone,
            } => {
                // The zone's own third candle cannot retrace into it.
                if i > zone.completed_at() && zone.is_touched_by(candle) {
                    let next = Self::InZone {
                        kind,
                        direction,
                        zone,
                        entered_at: i,
                    };
                    trace!(day = %ctx.day, index = i, "zone touched");
                    return next.on_candle(ctx, i, window_start, config);
                }
                if config.zone_source == ZoneSource::SessionWindow {
                    if let Some(newer) = latest_window_zone(ctx, direction, i, window_start) {
                        return Self::AwaitingRetrace {
                            kind,
                            direction,
                            zone: newer,
                        };
                    }
                }
                self
            }

            Self::InZone {
                kind,
                direction,
                zone,
                entered_at,
            } => {
                let confirmed = i
                    .checked_sub(1)
                    .map(|p| is_engulfing(&ctx.candles[p], candle, direction, config))
                    .unwrap_or(false);
                if confirmed {
                    Self::SignalEmitted {
                        confirmation: Confirmation {
                            index: i,
                            kind,
                            direction,
                            zone,
                            entered_at,
                        },
                    }
                } else {
                    self
                }
            }

            Self::BiasSet { .. }
            | Self::NoBias
            | Self::SignalEmitted { .. }
            | Self::WindowExhausted { .. } => self,
        }
    }

    /// Close out a scan whose window ran out of candles.
    fn exhaust(self) -> Self {
        let reason = match self {
            Self::AwaitingZone { .. } => ExhaustReason::NoZone,
            Self::ZoneSelected { .. } | Self::AwaitingRetrace { .. } => ExhaustReason::NoRetrace,
            Self::InZone { .. } => ExhaustReason::NoConfirmation,
            _ => return self,
        };
        Self::WindowExhausted { reason }
    }
}

/// Most recent matching zone that completed inside the window at or before `i`.
fn latest_window_zone(
    ctx: &DayContext<'_>,
    direction: Direction,
    i: usize,
    window_start: usize,
) -> Option<ImbalanceZone> {
    let kind = ZoneKind::for_direction(direction);
    ctx.zones
        .iter()
        .rev()
        .find(|z| {
            z.kind == kind && z.completed_at() >= window_start && z.completed_at() <= i
        })
        .copied()
}

/// Engulfing test of `candle` against its predecessor `prev`.
///
/// The candle must close in the trade direction and its body must be at least
/// `engulf_min_ratio` times the previous body. On top of that, [`EngulfRule::Body`]
/// requires the body to contain the previous body, and [`EngulfRule::WickClose`]
/// requires a close beyond the previous wick.
pub fn is_engulfing(
    prev: &Candle,
    candle: &Candle,
    direction: Direction,
    config: &StrategyConfig,
) -> bool {
    let directional = match direction {
        Direction::Long => candle.is_bullish(),
        Direction::Short => candle.is_bearish(),
    };
    if !directional || candle.body_size() < config.engulf_min_ratio * prev.body_size() {
        return false;
    }
    match config.engulf_rule {
        EngulfRule::Body => {
            candle.body_low() <= prev.body_low() && candle.body_high() >= prev.body_high()
        }
        EngulfRule::WickClose => match direction {
            Direction::Long => candle.close > prev.high,
            Direction::Short => candle.close < prev.low,
        },
    }
}

/// Run the state machine over one session window of one day and return its
/// terminal state.
pub fn scan_session(
    ctx: &DayContext<'_>,
    window: &SessionWindow,
    config: &StrategyConfig,
) -> ScanState {
    let mut state = ScanState::initial(ctx);
    if state.is_terminal() {
        return state;
    }

    let range = ctx.window_range(window);
    if range.is_empty() {
        return ScanState::WindowExhausted {
            reason: ExhaustReason::NoCandles,
        };
    }

    state = state.select_zone(ctx, config.zone_source);
    trace!(day = %ctx.day, session = %window.name, state = state.name(), "scan start");

    for i in range.clone() {
        if state.is_terminal() {
            break;
        }
        let before = state.name();
        state = state.on_candle(ctx, i, range.start, config);
        if state.name() != before {
            trace!(day = %ctx.day, session = %window.name, index = i, from = before, to = state.name());
        }
    }

    state.exhaust()
}
