//! Session windows: fixed time-of-day intervals in which signals may fire.
//!
//! Windows are venue-local, start inclusive, end exclusive, and never cross
//! midnight. A [`SessionTable`] is only built from windows that passed
//! validation, so classification at scan time is total and infallible.

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// One named trading window, e.g. LONDON 03:00-06:00.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub name: String,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl SessionWindow {
    pub fn new(name: impl Into<String>, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    /// Convenience constructor from hour/minute pairs. Panics on out-of-range values.
    pub fn hm(name: impl Into<String>, start: (u32, u32), end: (u32, u32)) -> Self {
        Self::new(
            name,
            NaiveTime::from_hms_opt(start.0, start.1, 0).expect("valid start time"),
            NaiveTime::from_hms_opt(end.0, end.1, 0).expect("valid end time"),
        )
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time < self.end
    }

    fn overlaps(&self, other: &SessionWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Validated, non-overlapping windows ordered by start time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionTable {
    windows: Vec<SessionWindow>,
}

impl SessionTable {
    pub fn new(mut windows: Vec<SessionWindow>) -> Result<Self, ConfigError> {
        if windows.is_empty() {
            return Err(ConfigError::NoSessionWindows);
        }
        for w in &windows {
            if w.start >= w.end {
                return Err(ConfigError::EmptyWindow {
                    name: w.name.clone(),
                });
            }
        }
        windows.sort_by_key(|w| w.start);
        for (i, a) in windows.iter().enumerate() {
            for b in &windows[i + 1..] {
                if a.name == b.name {
                    return Err(ConfigError::DuplicateWindowName {
                        name: a.name.clone(),
                    });
                }
                if a.overlaps(b) {
                    return Err(ConfigError::OverlappingWindows {
                        first: a.name.clone(),
                        second: b.name.clone(),
                    });
                }
            }
        }
        Ok(Self { windows })
    }

    pub fn windows(&self) -> &[SessionWindow] {
        &self.windows
    }

    /// The window containing `timestamp`'s time of day, if any.
    pub fn classify(&self, timestamp: NaiveDateTime) -> Option<&SessionWindow> {
        let time = timestamp.time();
        self.windows.iter().find(|w| w.contains(time))
    }

    /// Start of the earliest window; candles before it form the pre-window slice.
    pub fn earliest_start(&self) -> NaiveTime {
        self.windows[0].start
    }
}

/// Serde adapter for `HH:MM` time-of-day strings (seconds accepted on input).
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|e| serde::de::Error::custom(format!("invalid time '{raw}': {e}")))
    }
}
