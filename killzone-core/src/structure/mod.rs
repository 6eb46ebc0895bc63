//! Structural annotation of a candle slice: swing points and imbalance zones.
//!
//! Both are pure functions of the candles they are given and are recomputed
//! per day; nothing here is stored independently of the series.

pub mod imbalance;
pub mod swing;

pub use imbalance::{detect_imbalances, ImbalanceZone, ZoneKind};
pub use swing::{detect_swings, SwingKind, SwingPoint};
