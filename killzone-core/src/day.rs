//! Day-scoped context: one calendar day's candles plus everything derived from them.
//!
//! Swings and zones are detected on the day slice alone, so every index held
//! here is day-local. `offset` converts back to a position in the full series.

use std::ops::Range;

use chrono::NaiveDate;

use crate::bias::{classify_bias, BiasClassification};
use crate::config::StrategyConfig;
use crate::domain::Candle;
use crate::session::{SessionTable, SessionWindow};
use crate::structure::{detect_imbalances, detect_swings, ImbalanceZone, SwingPoint, ZoneKind};

#[derive(Debug, Clone)]
pub struct DayContext<'a> {
    pub day: NaiveDate,
    /// Index of the day's first candle in the full series.
    pub offset: usize,
    pub candles: &'a [Candle],
    pub swings: Vec<SwingPoint>,
    pub zones: Vec<ImbalanceZone>,
    /// Number of candles before the earliest session window.
    pub pre_len: usize,
    pub bias: BiasClassification,
}

impl<'a> DayContext<'a> {
    /// Annotate and classify one day. `range` indexes into `all`.
    pub fn build(
        day: NaiveDate,
        range: Range<usize>,
        all: &'a [Candle],
        table: &SessionTable,
        config: &StrategyConfig,
    ) -> Self {
        let offset = range.start;
        let candles = &all[range];
        let earliest = table.earliest_start();
        let pre_len = candles.partition_point(|c| c.time() < earliest);
        let bias = classify_bias(&candles[..pre_len], config);

        Self {
            day,
            offset,
            candles,
            swings: detect_swings(candles, config.swing_lookback),
            zones: detect_imbalances(candles),
            pre_len,
            bias,
        }
    }

    pub fn pre_window(&self) -> &'a [Candle] {
        &self.candles[..self.pre_len]
    }

    /// Day-local index range of the candles inside `window`. Candles are time
    /// ordered, so the members of one window are contiguous.
    pub fn window_range(&self, window: &SessionWindow) -> Range<usize> {
        let inside = |c: &Candle| window.contains(c.time());
        let start = self
            .candles
            .iter()
            .position(inside)
            .unwrap_or(self.candles.len());
        let len = self.candles[start..]
            .iter()
            .take_while(|c| inside(c))
            .count();
        start..start + len
    }

    /// Position of a day-local index in the full series.
    pub fn global(&self, local: usize) -> usize {
        self.offset + local
    }

    /// Most recent zone of `kind` whose third candle is still inside the pre-window.
    pub fn pre_window_zone(&self, kind: ZoneKind) -> Option<ImbalanceZone> {
        self.zones
            .iter()
            .rev()
            .find(|z| z.kind == kind && z.completed_at() < self.pre_len)
            .copied()
    }
}
