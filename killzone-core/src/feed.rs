//! Candle feed trait: the boundary between candle acquisition and the engine.
//!
//! Implementations handle the specifics of a source (files, synthetic data,
//! an in-memory fixture). The engine only ever sees a validated
//! [`CandleSeries`], so it carries no hidden connection state.

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::{Candle, CandleSeries, DataError};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("invalid candle data for {symbol}: {source}")]
    Invalid {
        symbol: String,
        #[source]
        source: DataError,
    },

    #[error("{feed} feed error: {message}")]
    Source { feed: String, message: String },
}

/// Supplier of validated candle series.
pub trait CandleFeed: Send + Sync {
    /// Human-readable name of this feed.
    fn name(&self) -> &str;

    /// Fetch the full series for a symbol.
    fn fetch(&self, symbol: &str) -> Result<CandleSeries, FeedError>;

    /// Whether the candles are generated rather than observed. Reports on
    /// synthetic data are tagged.
    fn is_synthetic(&self) -> bool {
        false
    }
}

/// Fixture feed holding raw candles per symbol; validation happens on fetch.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFeed {
    series: HashMap<String, Vec<Candle>>,
}

impl InMemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: impl Into<String>, candles: Vec<Candle>) -> Self {
        self.insert(symbol, candles);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<String>, candles: Vec<Candle>) {
        self.series.insert(symbol.into(), candles);
    }

    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.series.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }
}

impl CandleFeed for InMemoryFeed {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self, symbol: &str) -> Result<CandleSeries, FeedError> {
        let candles = self
            .series
            .get(symbol)
            .ok_or_else(|| FeedError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
        CandleSeries::new(symbol, candles.clone()).map_err(|source| FeedError::Invalid {
            symbol: symbol.to_string(),
            source,
        })
    }
}
