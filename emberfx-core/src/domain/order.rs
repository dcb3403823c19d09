//! Order — the intent the engine hands to a broker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directional side: `+1` long/buy, `-1` short/sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    /// Decode a signal in {-1, 0, +1} into a side; `0` has no side.
    pub fn from_signal(signal: i8) -> Option<Side> {
        match signal {
            1 => Some(Side::Long),
            -1 => Some(Side::Short),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    #[error("order quantity must be > 0, got {0}")]
    NonPositiveQuantity(f64),
}

/// An order intent: {symbol, side, quantity, optional SL/TP, created_at}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        symbol: impl Into<String>,
        side: Side,
        quantity: f64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if !(quantity > 0.0) {
            return Err(OrderError::NonPositiveQuantity(quantity));
        }
        Ok(Self {
            symbol: symbol.into(),
            side,
            quantity,
            stop_loss: None,
            take_profit: None,
            created_at,
        })
    }

    pub fn with_stop_loss(mut self, stop_loss: Option<f64>) -> Self {
        self.stop_loss = stop_loss;
        self
    }

    pub fn with_take_profit(mut self, take_profit: Option<f64>) -> Self {
        self.take_profit = take_profit;
        self
    }
}
