//! Candle: the fundamental market data unit.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// OHLC candle for one instrument on one timeframe.
///
/// Timestamps are venue-local wall-clock time. Session windows and trading
/// days are both derived from this timestamp, so the ingestion layer is
/// responsible for converting to venue time before building a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl Candle {
    pub fn new(timestamp: NaiveDateTime, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Calendar day the candle belongs to (venue-local).
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Time of day the candle opens (venue-local).
    pub fn time(&self) -> NaiveTime {
        self.timestamp.time()
    }

    pub fn body_low(&self) -> f64 {
        self.open.min(self.close)
    }

    pub fn body_high(&self) -> f64 {
        self.open.max(self.close)
    }

    pub fn body_size(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// True if the candle's [low, high] range touches the closed interval [lo, hi].
    pub fn intersects(&self, lo: f64, hi: f64) -> bool {
        self.low <= hi && self.high >= lo
    }

    /// Returns true if any OHLC field is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Candle {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(3, 15, 0)
            .unwrap();
        Candle::new(ts, 1950.0, 1956.0, 1946.0, 1948.0)
    }

    #[test]
    fn body_bounds_follow_direction() {
        let c = sample();
        assert!(c.is_bearish());
        assert_eq!(c.body_low(), 1948.0);
        assert_eq!(c.body_high(), 1950.0);
        assert_eq!(c.body_size(), 2.0);
    }

    #[test]
    fn intersects_is_inclusive_at_edges() {
        let c = sample();
        assert!(c.intersects(1956.0, 1960.0));
        assert!(c.intersects(1940.0, 1946.0));
        assert!(!c.intersects(1956.5, 1960.0));
        assert!(!c.intersects(1930.0, 1945.9));
    }

    #[test]
    fn detects_non_finite() {
        let mut c = sample();
        assert!(!c.has_non_finite());
        c.low = f64::NAN;
        assert!(c.has_non_finite());
    }

    #[test]
    fn volume_is_optional_in_json() {
        let json = r#"{"timestamp":"2024-03-05T03:15:00","open":1.0,"high":2.0,"low":0.5,"close":1.5}"#;
        let c: Candle = serde_json::from_str(json).unwrap();
        assert_eq!(c.volume, None);
        assert_eq!(c.time(), NaiveTime::from_hms_opt(3, 15, 0).unwrap());
    }
}
