//! Market data feed contract (§4.1).
//!
//! Grounded on the shape of the teacher's retired `DataProvider` trait
//! (`name`/`fetch`/`is_available`) and the Python original's
//! `IDataProvider` ABC, collapsed to the single synchronous `get_bars`
//! surface spec.md §4.1 asks for plus a `CompositeFeed` fallback wrapper
//! supplementing the primary/secondary vendor failover the original's
//! `DataManager` performed.

use thiserror::Error;

use crate::domain::{Bar, Interval};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("no data available for {symbol} at {interval:?}")]
    NoData { symbol: String, interval: Interval },
    #[error("feed source unreachable: {0}")]
    Unavailable(String),
    #[error("bar validation failed: {0}")]
    InvalidBar(#[from] crate::domain::BarError),
}

/// A source of historical bars for a single symbol/interval pair.
///
/// Implementations MUST return bars in ascending timestamp order with no
/// duplicate timestamps; the engine driver does not re-sort or de-dup.
pub trait DataFeed: Send + Sync {
    fn name(&self) -> &str;

    /// All available bars for `symbol` at `interval`. `None` bounds mean
    /// "unbounded in that direction".
    fn get_bars(
        &self,
        symbol: &str,
        interval: Interval,
        from: Option<chrono::DateTime<chrono::Utc>>,
        to: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<Vec<Bar>, DataError>;

    /// Whether this feed currently has any data for `symbol`.
    fn is_available(&self, symbol: &str) -> bool;
}

/// An in-memory feed backed by a fixed, pre-loaded bar vector per symbol.
/// The primary feed implementation for deterministic backtests — bars are
/// supplied once (e.g. parsed from CSV by the runner) and replayed as-is.
#[derive(Debug, Default)]
pub struct FixedFeed {
    name: String,
    bars: std::collections::BTreeMap<String, Vec<Bar>>,
}

impl FixedFeed {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bars: std::collections::BTreeMap::new(),
        }
    }

    /// Inserts (or replaces) the bar series for `symbol`. Caller is
    /// responsible for timestamp ordering; `get_bars` does not sort.
    pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<Bar>) {
        self.bars.insert(symbol.into(), bars);
    }
}

impl DataFeed for FixedFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_bars(
        &self,
        symbol: &str,
        _interval: Interval,
        from: Option<chrono::DateTime<chrono::Utc>>,
        to: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<Vec<Bar>, DataError> {
        let series = self.bars.get(symbol).ok_or_else(|| DataError::NoData {
            symbol: symbol.to_string(),
            interval: _interval,
        })?;
        let filtered: Vec<Bar> = series
            .iter()
            .filter(|b| from.is_none_or(|f| b.timestamp >= f))
            .filter(|b| to.is_none_or(|t| b.timestamp <= t))
            .cloned()
            .collect();
        Ok(filtered)
    }

    fn is_available(&self, symbol: &str) -> bool {
        self.bars.contains_key(symbol)
    }
}

/// Tries each feed in order, falling through to the next on `NoData` or
/// `Unavailable`. Mirrors the original's primary/secondary vendor failover,
/// generalized beyond any one vendor.
pub struct CompositeFeed {
    feeds: Vec<Box<dyn DataFeed>>,
}

impl CompositeFeed {
    pub fn new(feeds: Vec<Box<dyn DataFeed>>) -> Self {
        Self { feeds }
    }
}

impl DataFeed for CompositeFeed {
    fn name(&self) -> &str {
        "composite"
    }

    fn get_bars(
        &self,
        symbol: &str,
        interval: Interval,
        from: Option<chrono::DateTime<chrono::Utc>>,
        to: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<Vec<Bar>, DataError> {
        let mut last_err = None;
        for feed in &self.feeds {
            match feed.get_bars(symbol, interval, from, to) {
                Ok(bars) if !bars.is_empty() => return Ok(bars),
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(feed = feed.name(), symbol, error = %e, "feed failed, trying next");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or(DataError::NoData {
            symbol: symbol.to_string(),
            interval,
        }))
    }

    fn is_available(&self, symbol: &str) -> bool {
        self.feeds.iter().any(|f| f.is_available(symbol))
    }
}
