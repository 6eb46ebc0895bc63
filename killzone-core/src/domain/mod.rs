//! Domain types for killzone

pub mod candle;
pub mod series;
pub mod setup;
pub mod trade;

pub use candle::Candle;
pub use series::{CandleSeries, DataError};
pub use setup::{Direction, SetupKind, TradeSetup};
pub use trade::{SimulatedTrade, TradeOutcome};
