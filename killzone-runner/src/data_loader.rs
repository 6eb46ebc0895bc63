//! Candle loading for the runner.
//!
//! Two feeds implement the core `CandleFeed` boundary:
//! - [`CsvFeed`]: one `{SYMBOL}.csv` file per symbol in a directory
//! - [`SyntheticFeed`]: a deterministic random walk seeded from the symbol name
//!
//! CSV input is strict: header `timestamp,open,high,low,close[,volume]`, one
//! of a few fixed timestamp layouts, venue-local time. Anything else is a
//! [`LoadError`]; column guessing and encoding detection are out of scope.
//!
//! Synthetic data is a developer-only debug mode. Results produced on it are
//! tagged `has_synthetic`.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use killzone_core::domain::{Candle, CandleSeries, DataError};
use killzone_core::feed::{CandleFeed, FeedError};

/// Timestamp layouts accepted in the `timestamp` column, tried in order.
pub const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y.%m.%d %H:%M",
];

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: CSV error: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}, row {row}: {message}")]
    Row {
        path: PathBuf,
        row: usize,
        message: String,
    },

    #[error("{path}: no candles")]
    Empty { path: PathBuf },

    #[error("{path}: {source}")]
    Data {
        path: PathBuf,
        #[source]
        source: DataError,
    },
}

/// CSV row as it appears on disk.
#[derive(Debug, Deserialize, Serialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Read and validate a candle CSV.
pub fn load_csv(path: &Path, symbol: &str) -> Result<CandleSeries, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(std::io::BufReader::new(file));

    let mut candles = Vec::new();
    for (i, record) in reader.deserialize::<CsvRow>().enumerate() {
        // Row 1 is the header.
        let row = i + 2;
        let record = record.map_err(|e| LoadError::Row {
            path: path.to_path_buf(),
            row,
            message: e.to_string(),
        })?;
        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| LoadError::Row {
            path: path.to_path_buf(),
            row,
            message: format!("unrecognised timestamp '{}'", record.timestamp),
        })?;
        let mut candle = Candle::new(timestamp, record.open, record.high, record.low, record.close);
        candle.volume = record.volume;
        candles.push(candle);
    }

    if candles.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    debug!(path = %path.display(), candles = candles.len(), "loaded csv");

    CandleSeries::new(symbol, candles).map_err(|source| LoadError::Data {
        path: path.to_path_buf(),
        source,
    })
}

/// Write candles in the same layout [`load_csv`] reads.
pub fn write_csv(path: &Path, candles: &[Candle]) -> Result<(), LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for c in candles {
        writer
            .serialize(CsvRow {
                timestamp: c.timestamp.format(TIMESTAMP_FORMATS[0]).to_string(),
                open: c.open,
                high: c.high,
                low: c.low,
                close: c.close,
                volume: c.volume,
            })
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Symbol implied by a file name: the stem up to the first `_` (`XAUUSD_M15.csv` -> `XAUUSD`).
pub fn symbol_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let symbol = stem.split('_').next().unwrap_or(stem);
    (!symbol.is_empty()).then(|| symbol.to_string())
}

/// Label for runs on a file: its full stem (`XAUUSD_M15.csv` -> `XAUUSD_M15`).
pub fn source_label(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    (!stem.is_empty()).then(|| stem.to_string())
}

// ─── CSV feed ───────────────────────────────────────────────────────

/// Reads `{dir}/{SYMBOL}.csv`.
#[derive(Debug, Clone)]
pub struct CsvFeed {
    dir: PathBuf,
}

impl CsvFeed {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

impl CandleFeed for CsvFeed {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, symbol: &str) -> Result<CandleSeries, FeedError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(FeedError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        load_csv(&path, symbol).map_err(|e| match e {
            LoadError::Data { source, .. } => FeedError::Invalid {
                symbol: symbol.to_string(),
                source,
            },
            other => FeedError::Source {
                feed: "csv".to_string(),
                message: other.to_string(),
            },
        })
    }
}

// ─── Synthetic feed ─────────────────────────────────────────────────

/// Deterministic intraday random walk, weekdays only, around the clock.
#[derive(Debug, Clone)]
pub struct SyntheticFeed {
    pub start: NaiveDate,
    pub days: usize,
    pub bar_minutes: u32,
}

impl SyntheticFeed {
    pub fn new(start: NaiveDate, days: usize) -> Self {
        Self {
            start,
            days,
            bar_minutes: 15,
        }
    }
}

impl CandleFeed for SyntheticFeed {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str) -> Result<CandleSeries, FeedError> {
        let candles = generate_synthetic_candles(symbol, self.start, self.days, self.bar_minutes);
        CandleSeries::new(symbol, candles).map_err(|source| FeedError::Invalid {
            symbol: symbol.to_string(),
            source,
        })
    }

    fn is_synthetic(&self) -> bool {
        true
    }
}

/// Generate `days` weekdays of candles starting at `start`.
///
/// Seeded from the BLAKE3 hash of the symbol, so the same symbol always
/// produces the same series. Volatility is higher between 03:00 and 12:00 so
/// the default session windows see directional moves.
pub fn generate_synthetic_candles(
    symbol: &str,
    start: NaiveDate,
    days: usize,
    bar_minutes: u32,
) -> Vec<Candle> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let bar_minutes = bar_minutes.clamp(1, 24 * 60);
    let bars_per_day = (24 * 60 / bar_minutes) as i64;
    let active_start = NaiveTime::from_hms_opt(3, 0, 0).unwrap_or_default();
    let active_end = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default();
    let round = |x: f64| (x * 100.0).round() / 100.0;

    let mut candles = Vec::with_capacity(days * bars_per_day as usize);
    let mut price = round(rng.gen_range(1000.0..3000.0));
    let mut day = start;
    let mut produced = 0;

    while produced < days {
        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            day += Duration::days(1);
            continue;
        }
        // Per-day drift gives each day a dominant direction.
        let drift: f64 = rng.gen_range(-1.2..1.2);
        let midnight = day.and_time(NaiveTime::MIN);

        for bar in 0..bars_per_day {
            let timestamp = midnight + Duration::minutes(bar * bar_minutes as i64);
            let time = timestamp.time();
            let vol = if time >= active_start && time < active_end {
                4.0
            } else {
                1.5
            };
            let open = price;
            let close = round(open + drift + rng.gen_range(-1.0..1.0) * vol);
            let high = round(open.max(close) + rng.gen_range(0.0..1.0) * vol);
            let low = round(open.min(close) - rng.gen_range(0.0..1.0) * vol);
            let volume = rng.gen_range(100.0..5000.0_f64).round();
            candles.push(Candle::new(timestamp, open, high, low, close).with_volume(volume));
            price = close;
        }

        produced += 1;
        day += Duration::days(1);
    }

    candles
}
