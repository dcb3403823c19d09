//! Bar — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the supported bar intervals a `DataFeed` may be queried at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Interval {
    /// Approximate bars per trading year, used to annualize per-bar statistics.
    ///
    /// FX trades around the clock five days a week; this uses 252 trading
    /// days as the daily anchor, matching the convention equities use, since
    /// spec.md's metrics section anchors annualization the same way.
    pub fn bars_per_year(self) -> f64 {
        match self {
            Interval::D1 => 252.0,
            Interval::H4 => 252.0 * 6.0,
            Interval::H1 => 252.0 * 24.0,
            Interval::M30 => 252.0 * 24.0 * 2.0,
            Interval::M15 => 252.0 * 24.0 * 4.0,
            Interval::M5 => 252.0 * 24.0 * 12.0,
            Interval::M1 => 252.0 * 24.0 * 60.0,
        }
    }
}

/// OHLCV bar for a single symbol at a single timestamp, normalized to UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Violations of the Bar invariant from §3: `low <= min(open,close) <= max(open,close) <= high`.
#[derive(Debug, Error, PartialEq)]
pub enum BarError {
    #[error("bar for {symbol} at {timestamp} has a NaN OHLC field")]
    NonFinite {
        symbol: String,
        timestamp: DateTime<Utc>,
    },
    #[error("bar for {symbol} at {timestamp} violates low <= open,close <= high (low={low}, open={open}, close={close}, high={high})")]
    OutOfOrder {
        symbol: String,
        timestamp: DateTime<Utc>,
        low: f64,
        open: f64,
        close: f64,
        high: f64,
    },
}

impl Bar {
    /// True if any OHLC field is non-finite (NaN or infinite).
    ///
    /// A void bar signals "no trade at this timestamp" rather than a failure —
    /// §7 treats it as data-unavailable, not as an error to propagate.
    pub fn is_void(&self) -> bool {
        !self.open.is_finite()
            || !self.high.is_finite()
            || !self.low.is_finite()
            || !self.close.is_finite()
    }

    /// Validates the OHLC ordering invariant from §3. Does not check `is_void`
    /// bars — those are a distinct, expected condition, not a malformed bar.
    pub fn validate(&self) -> Result<(), BarError> {
        if self.is_void() {
            return Err(BarError::NonFinite {
                symbol: self.symbol.clone(),
                timestamp: self.timestamp,
            });
        }
        let lo = self.open.min(self.close);
        let hi = self.open.max(self.close);
        if self.low <= lo && hi <= self.high && lo <= hi {
            Ok(())
        } else {
            Err(BarError::OutOfOrder {
                symbol: self.symbol.clone(),
                timestamp: self.timestamp,
                low: self.low,
                open: self.open,
                close: self.close,
                high: self.high,
            })
        }
    }
}
