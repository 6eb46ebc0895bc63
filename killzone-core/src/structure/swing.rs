//! Swing points: strict local extrema over a symmetric window.
//!
//! A candle at index `i` is a swing high if its high is strictly greater than
//! every other high in `[i - L, i + L]`, and a swing low if its low is strictly
//! less than every other low in that window. Ties never produce a swing, so a
//! flat top or bottom is not flagged twice. The first and last `L` candles lack
//! a full window and are never flagged.

use serde::{Deserialize, Serialize};

use crate::domain::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwingKind {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub kind: SwingKind,
    pub price: f64,
}

/// Detect all swing points, ordered by index (a high before a low at the same index).
pub fn detect_swings(candles: &[Candle], lookback: usize) -> Vec<SwingPoint> {
    let mut swings = Vec::new();
    let n = candles.len();
    if lookback == 0 || n < 2 * lookback + 1 {
        return swings;
    }

    for i in lookback..n - lookback {
        let window = (i - lookback)..=(i + lookback);
        let c = &candles[i];

        let is_high = window
            .clone()
            .filter(|&j| j != i)
            .all(|j| candles[j].high < c.high);
        if is_high {
            swings.push(SwingPoint {
                index: i,
                kind: SwingKind::High,
                price: c.high,
            });
        }

        let is_low = window
            .filter(|&j| j != i)
            .all(|j| candles[j].low > c.low);
        if is_low {
            swings.push(SwingPoint {
                index: i,
                kind: SwingKind::Low,
                price: c.low,
            });
        }
    }

    swings
}
