//! Portfolio — balance/equity bookkeeping and closed-trade history (§4.5).
//!
//! Derived statistics (win rate, Sharpe, profit factor, ...) are pure
//! functions of this history computed in `emberfx-runner::metrics`; the
//! portfolio itself only ever appends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::trade::Trade;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquitySample {
    pub timestamp: DateTime<Utc>,
    pub balance: f64,
    pub equity: f64,
}

/// Aggregate portfolio state: balance, equity/balance history, peak equity,
/// running max drawdown, and an append-only list of closed trades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub initial_balance: f64,
    pub balance: f64,
    pub equity_history: Vec<EquitySample>,
    /// Monotone non-decreasing from `initial_balance` — never re-seeded from
    /// the first observed equity sample (see SPEC_FULL.md §2 open-question
    /// resolution).
    pub peak_equity: f64,
    pub max_drawdown: f64,
    pub trades: Vec<Trade>,
}

impl Portfolio {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            initial_balance,
            balance: initial_balance,
            equity_history: Vec::new(),
            peak_equity: initial_balance,
            max_drawdown: 0.0,
            trades: Vec::new(),
        }
    }

    /// Appends one equity sample for the bar, updates peak equity (only on
    /// upticks) and the running max drawdown.
    pub fn update_equity(&mut self, unrealized_pnl: f64, timestamp: DateTime<Utc>) {
        let equity = self.balance + unrealized_pnl;
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        let drawdown = if self.peak_equity > 0.0 {
            (self.peak_equity - equity) / self.peak_equity
        } else {
            0.0
        };
        if drawdown > self.max_drawdown {
            self.max_drawdown = drawdown;
        }
        self.equity_history.push(EquitySample {
            timestamp,
            balance: self.balance,
            equity,
        });
    }

    /// Current drawdown fraction from peak, or 0 if peak is non-positive.
    pub fn current_drawdown(&self, unrealized_pnl: f64) -> f64 {
        if self.peak_equity <= 0.0 {
            return 0.0;
        }
        let equity = self.balance + unrealized_pnl;
        ((self.peak_equity - equity) / self.peak_equity).max(0.0)
    }

    /// Books realized P&L into cash balance and appends the trade record.
    pub fn record_trade(&mut self, pnl: f64, trade: Trade) {
        self.balance += pnl;
        self.trades.push(trade);
    }

    /// Books a partial-close's realized P&L into cash balance without a
    /// trade record — the trade itself is only recorded once the position
    /// fully closes (`record_trade`).
    pub fn credit(&mut self, pnl: f64) {
        self.balance += pnl;
    }

    pub fn realized_pnl(&self) -> f64 {
        self.balance - self.initial_balance
    }

    pub fn equity(&self) -> f64 {
        self.equity_history
            .last()
            .map(|s| s.equity)
            .unwrap_or(self.balance)
    }
}
