//! Imbalance zones (fair value gaps): three-candle price gaps.
//!
//! For the triple (prev, mid, next) centred on `i`:
//! - bullish when `next.low > prev.high`, zone `(prev.high, next.low)`
//! - bearish when `next.high < prev.low`, zone `(next.high, prev.low)`
//!
//! The zone is attributed to the middle (impulse) candle. All zones are kept,
//! overlapping or not; choosing between them is the scanner's job.

use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneKind {
    Bullish,
    Bearish,
}

impl ZoneKind {
    /// Zone kind that supports a trade in `direction`.
    pub fn for_direction(direction: Direction) -> Self {
        match direction {
            Direction::Long => Self::Bullish,
            Direction::Short => Self::Bearish,
        }
    }
}

/// Invariant: `low < high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImbalanceZone {
    pub kind: ZoneKind,
    pub low: f64,
    pub high: f64,
    /// Index of the middle candle of the triple.
    pub index: usize,
}

impl ImbalanceZone {
    /// Index of the last candle of the triple; the zone is known from here on.
    pub fn completed_at(&self) -> usize {
        self.index + 1
    }

    pub fn is_touched_by(&self, candle: &Candle) -> bool {
        candle.intersects(self.low, self.high)
    }
}

/// Detect every zone in the series, ordered by creating index.
pub fn detect_imbalances(candles: &[Candle]) -> Vec<ImbalanceZone> {
    let mut zones = Vec::new();
    if candles.len() < 3 {
        return zones;
    }

    for i in 1..candles.len() - 1 {
        let prev = &candles[i - 1];
        let next = &candles[i + 1];

        if next.low > prev.high {
            zones.push(ImbalanceZone {
                kind: ZoneKind::Bullish,
                low: prev.high,
                high: next.low,
                index: i,
            });
        }
        if next.high < prev.low {
            zones.push(ImbalanceZone {
                kind: ZoneKind::Bearish,
                low: next.high,
                high: prev.low,
                index: i,
            });
        }
    }

    zones
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn c(i: i64, o: f64, h: f64, l: f64, cl: f64) -> Candle {
        let base = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Candle::new(base + chrono::Duration::minutes(15 * i), o, h, l, cl)
    }

    #[test]
    fn bullish_gap_bounds() {
        let candles = vec![
            c(0, 1899.0, 1902.0, 1897.0, 1901.0),
            c(1, 1901.0, 1912.0, 1900.0, 1911.0),
            c(2, 1911.0, 1915.0, 1908.0, 1913.0),
        ];
        let zones = detect_imbalances(&candles);
        assert_eq!(
            zones,
            vec![ImbalanceZone {
                kind: ZoneKind::Bullish,
                low: 1902.0,
                high: 1908.0,
                index: 1
            }]
        );
    }

    #[test]
    fn bearish_gap_bounds() {
        let candles = vec![
            c(0, 1950.0, 1952.0, 1946.0, 1947.0),
            c(1, 1947.0, 1948.0, 1935.0, 1936.0),
            c(2, 1936.0, 1940.0, 1930.0, 1932.0),
        ];
        let zones = detect_imbalances(&candles);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].kind, ZoneKind::Bearish);
        assert_eq!((zones[0].low, zones[0].high), (1940.0, 1946.0));
    }

    #[test]
    fn touching_wicks_are_not_a_gap() {
        let candles = vec![
            c(0, 10.0, 11.0, 9.0, 10.5),
            c(1, 10.5, 13.0, 10.0, 12.5),
            c(2, 12.5, 14.0, 11.0, 13.5),
        ];
        assert!(detect_imbalances(&candles).is_empty());
    }

    #[test]
    fn consecutive_zones_are_all_kept() {
        let candles = vec![
            c(0, 10.0, 11.0, 9.0, 10.8),
            c(1, 10.8, 14.0, 10.5, 13.8),
            c(2, 13.8, 17.0, 12.0, 16.8),
            c(3, 16.8, 20.0, 15.0, 19.8),
        ];
        let zones = detect_imbalances(&candles);
        assert_eq!(zones.len(), 2);
        assert!(zones.iter().all(|z| z.low < z.high));
        assert_eq!(zones[1].completed_at(), 3);
    }
}
