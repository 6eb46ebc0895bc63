//! Validated, immutable candle series for one instrument and timeframe.

use std::ops::Range;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

use super::Candle;

/// Fatal data problems. Any of these aborts the run for the affected series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("candle {index}: non-finite {field}")]
    NonFinite { index: usize, field: &'static str },

    #[error("candle {index}: high is below the candle body")]
    HighBelowBody { index: usize },

    #[error("candle {index}: low is above the candle body")]
    LowAboveBody { index: usize },

    #[error("candle {index}: duplicate timestamp {timestamp}")]
    DuplicateTimestamp {
        index: usize,
        timestamp: NaiveDateTime,
    },

    #[error("candle {index}: timestamp {current} is earlier than previous {previous}")]
    NonMonotonic {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },
}

/// Ordered candles for one symbol. Construction validates every candle; the
/// series cannot be mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct CandleSeries {
    symbol: String,
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(symbol: impl Into<String>, candles: Vec<Candle>) -> Result<Self, DataError> {
        validate(&candles)?;
        Ok(Self {
            symbol: symbol.into(),
            candles,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.candles.last().map(|c| c.timestamp)
    }

    /// Index ranges of each calendar day, in chronological order.
    pub fn day_ranges(&self) -> Vec<(NaiveDate, Range<usize>)> {
        let mut days = Vec::new();
        let mut start = 0;
        for i in 1..=self.candles.len() {
            let boundary = i == self.candles.len()
                || self.candles[i].date() != self.candles[start].date();
            if boundary {
                days.push((self.candles[start].date(), start..i));
                start = i;
            }
        }
        days
    }
}

fn validate(candles: &[Candle]) -> Result<(), DataError> {
    for (index, c) in candles.iter().enumerate() {
        for (field, value) in [
            ("open", c.open),
            ("high", c.high),
            ("low", c.low),
            ("close", c.close),
        ] {
            if !value.is_finite() {
                return Err(DataError::NonFinite { index, field });
            }
        }
        if let Some(v) = c.volume {
            if !v.is_finite() {
                return Err(DataError::NonFinite {
                    index,
                    field: "volume",
                });
            }
        }
        if c.high < c.body_high() {
            return Err(DataError::HighBelowBody { index });
        }
        if c.low > c.body_low() {
            return Err(DataError::LowAboveBody { index });
        }
        if index > 0 {
            let previous = candles[index - 1].timestamp;
            if c.timestamp == previous {
                return Err(DataError::DuplicateTimestamp {
                    index,
                    timestamp: c.timestamp,
                });
            }
            if c.timestamp < previous {
                return Err(DataError::NonMonotonic {
                    index,
                    previous,
                    current: c.timestamp,
                });
            }
        }
    }
    Ok(())
}
