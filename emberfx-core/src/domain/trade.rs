//! Trade — an immutable record of a fully-closed position (§3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::order::Side;

/// Why a position was fully closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClosureReason {
    SignalFlip,
    StopLoss,
    TakeProfit1,
    TakeProfit2,
    TakeProfit3,
    Manual,
    EngineStop,
}

impl std::fmt::Display for ClosureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ClosureReason::SignalFlip => "signal_flip",
            ClosureReason::StopLoss => "stop_loss",
            ClosureReason::TakeProfit1 => "take_profit_1",
            ClosureReason::TakeProfit2 => "take_profit_2",
            ClosureReason::TakeProfit3 => "take_profit_3",
            ClosureReason::Manual => "manual",
            ClosureReason::EngineStop => "engine_stop",
        };
        f.write_str(s)
    }
}

/// An immutable record of a fully-closed position. Never mutated once appended
/// to the portfolio's trade history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub side: Side,
    pub original_quantity: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub realized_pnl: f64,
    pub strategy_name: String,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    pub breakeven_triggered: bool,
    pub partial_close_history: Vec<f64>,
    pub closure_reason: ClosureReason,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.realized_pnl > 0.0
    }

    /// Realized P&L as a fraction of the entry notional.
    pub fn return_pct(&self) -> f64 {
        let entry_notional = self.entry_price * self.original_quantity;
        if entry_notional == 0.0 {
            return 0.0;
        }
        self.realized_pnl / entry_notional
    }
}
