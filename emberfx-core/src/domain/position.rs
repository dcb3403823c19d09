//! Position — an open holding in a single symbol, owned exclusively by the
//! trade manager (§4.4) once created by the engine driver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::order::Side;

#[derive(Debug, Error, PartialEq)]
pub enum PositionError {
    #[error("partial close of {requested} exceeds remaining quantity {remaining}")]
    ExceedsRemaining { requested: f64, remaining: f64 },
    #[error("partial close quantity must be > 0, got {0}")]
    NonPositive(f64),
}

/// An open position in a single symbol. Mutated only by the trade manager
/// (§4.4); the engine driver owns the map of open positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: Side,
    pub original_quantity: f64,
    pub entry_price: f64,
    pub current_price: f64,
    /// The stop distance fixed at entry — `|entry_price - initial_stop|` —
    /// used as the risk unit for breakeven/trailing thresholds. Frozen at
    /// creation; `stop_loss` itself may move, but this does not.
    pub initial_risk: f64,
    pub stop_loss: Option<f64>,
    pub take_profit_1: Option<f64>,
    pub take_profit_2: Option<f64>,
    pub take_profit_3: Option<f64>,
    pub breakeven_triggered: bool,
    pub trailing_stop: Option<f64>,
    /// Ordered sequence of executed partial-close quantities (original-quantity units).
    pub partial_closes: Vec<f64>,
    /// Realized P&L booked so far from partial closes (excludes the final leg).
    pub realized_pnl_to_date: f64,
    pub strategy_name: String,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        symbol: impl Into<String>,
        side: Side,
        quantity: f64,
        entry_price: f64,
        stop_loss: Option<f64>,
        take_profit_1: Option<f64>,
        strategy_name: impl Into<String>,
        opened_at: DateTime<Utc>,
    ) -> Self {
        let initial_risk = stop_loss.map_or(0.0, |sl| (entry_price - sl).abs());
        let (take_profit_2, take_profit_3) = take_profit_1
            .map(|tp1| {
                let reward = tp1 - entry_price;
                (
                    Some(entry_price + 1.5 * reward),
                    Some(entry_price + 2.0 * reward),
                )
            })
            .unwrap_or((None, None));
        Self {
            symbol: symbol.into(),
            side,
            original_quantity: quantity,
            entry_price,
            current_price: entry_price,
            initial_risk,
            stop_loss,
            take_profit_1,
            take_profit_2,
            take_profit_3,
            breakeven_triggered: false,
            trailing_stop: None,
            partial_closes: Vec::new(),
            realized_pnl_to_date: 0.0,
            strategy_name: strategy_name.into(),
            opened_at,
        }
    }

    /// `original_quantity - sum(partial_closes)`.
    pub fn remaining_quantity(&self) -> f64 {
        self.original_quantity - self.partial_closes.iter().sum::<f64>()
    }

    /// Number of take-profit rungs already executed (0..=3).
    pub fn partials_done(&self) -> usize {
        self.partial_closes.len()
    }

    /// Records a partial close, enforcing `0 < quantity <= remaining_quantity`.
    pub fn record_partial_close(&mut self, quantity: f64) -> Result<(), PositionError> {
        if !(quantity > 0.0) {
            return Err(PositionError::NonPositive(quantity));
        }
        let remaining = self.remaining_quantity();
        if quantity > remaining + f64::EPSILON {
            return Err(PositionError::ExceedsRemaining {
                requested: quantity,
                remaining,
            });
        }
        self.partial_closes.push(quantity);
        Ok(())
    }

    /// Marks the position to a new price and recomputes unrealized P&L.
    pub fn mark(&mut self, price: f64) -> f64 {
        self.current_price = price;
        self.unrealized_pnl()
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.side.sign() * self.remaining_quantity() * (self.current_price - self.entry_price)
    }

    /// True once profit reaches at least 1x the initial risk and breakeven hasn't fired.
    pub fn is_breakeven_eligible(&self) -> bool {
        if self.breakeven_triggered || self.initial_risk <= 0.0 {
            return false;
        }
        let profit_distance = self.side.sign() * (self.current_price - self.entry_price);
        profit_distance >= self.initial_risk
    }

    /// True once profit reaches at least 1.5x the initial risk — the trailing-stop gate.
    pub fn should_trail_stop(&self) -> bool {
        if self.stop_loss.is_none() || self.initial_risk <= 0.0 {
            return false;
        }
        let profit_distance = self.side.sign() * (self.current_price - self.entry_price);
        profit_distance >= 1.5 * self.initial_risk
    }
}
