//! Trade manager (§4.4) — the position lifecycle state machine.
//!
//! Grounded on the Python original's `TradeManager` (`core/trade_manager.py`)
//! for the shape of the partial-close ladder and breakeven/trailing
//! mechanics, but spec.md's §4.4 fixes a different within-bar check order
//! than the original: **stop-loss first, then the take-profit ladder, then
//! breakeven/trail updates for next bar** — this prevents a bar that
//! pierces both the stop and a TP from paying out the TP. This module
//! implements spec.md's order, not the original's (breakeven -> trailing ->
//! TP -> stop), per the task's redesign-flag precedence rule. See
//! DESIGN.md for the full resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ClosureReason, Order, Position, Side, Trade};

/// Fractions of the ORIGINAL quantity closed at TP1/TP2/TP3 respectively.
/// Sums to 1.0; if a future configuration changes this and the sum is <1,
/// the residual is carried with trailing stop active (§9 open question); if
/// >1, the last partial is clamped to the remaining quantity.
pub const TP_LADDER_FRACTIONS: [f64; 3] = [0.3, 0.4, 0.3];

/// One outcome of managing a position for a single bar.
#[derive(Debug, Clone)]
pub enum ManageOutcome {
    /// Position remains open, possibly with partial closes booked this bar.
    StillOpen {
        partial_realized: f64,
        partials_fired: Vec<(usize, f64, f64)>, // (rung index 1..=3, qty, price)
    },
    /// Position fully closed this bar.
    Closed { trade: Trade, realized: f64 },
}

/// Creates a new position from a filled order and the strategy's SL/TP advice.
pub fn open_position(
    order: &Order,
    fill_price: f64,
    strategy_name: &str,
    opened_at: DateTime<Utc>,
) -> Position {
    Position::open(
        order.symbol.clone(),
        order.side,
        order.quantity,
        fill_price,
        order.stop_loss,
        order.take_profit,
        strategy_name,
        opened_at,
    )
}

/// Runs the fixed per-bar check order from §4.4 against an open position at
/// price `p`, timestamp `now`. Mutates `position` in place for partial
/// closes and stop/trail/breakeven updates; returns `Closed` once the
/// position's remaining quantity reaches zero.
pub fn manage(position: &mut Position, price: f64, now: DateTime<Utc>) -> ManageOutcome {
    position.mark(price);

    // 1. Stop-loss check takes priority over take-profit within the bar.
    if let Some(stop) = position.stop_loss {
        let hit = match position.side {
            Side::Long => price <= stop,
            Side::Short => price >= stop,
        };
        if hit {
            let remaining = position.remaining_quantity();
            let realized = position.side.sign() * remaining * (stop - position.entry_price);
            let total_realized = position.realized_pnl_to_date + realized;
            let trade = close_trade(position, stop, now, ClosureReason::StopLoss, total_realized);
            return ManageOutcome::Closed { trade, realized };
        }
    }

    // 2. Take-profit ladder.
    let mut partial_realized = 0.0;
    let mut partials_fired = Vec::new();
    for rung in 1..=3usize {
        let target = match rung {
            1 => position.take_profit_1,
            2 => position.take_profit_2,
            _ => position.take_profit_3,
        };
        let Some(target) = target else { break };
        if position.partials_done() != rung - 1 {
            continue;
        }
        let reached = match position.side {
            Side::Long => price >= target,
            Side::Short => price <= target,
        };
        if !reached {
            break;
        }

        let remaining = position.remaining_quantity();
        let mut qty = TP_LADDER_FRACTIONS[rung - 1] * position.original_quantity;
        if qty > remaining {
            qty = remaining; // clamp per §9 open question
        }
        if qty <= 0.0 {
            break;
        }
        let realized = position.side.sign() * qty * (target - position.entry_price);
        position
            .record_partial_close(qty)
            .expect("clamped above remaining_quantity");
        partial_realized += realized;
        partials_fired.push((rung, qty, target));

        if position.remaining_quantity() <= f64::EPSILON {
            let closure_reason = match rung {
                1 => ClosureReason::TakeProfit1,
                2 => ClosureReason::TakeProfit2,
                _ => ClosureReason::TakeProfit3,
            };
            let total_realized = position.realized_pnl_to_date + partial_realized;
            let trade = close_trade(position, target, now, closure_reason, total_realized);
            return ManageOutcome::Closed {
                trade,
                realized: partial_realized,
            };
        }
    }
    position.realized_pnl_to_date += partial_realized;

    // 3. Breakeven promotion (one-way).
    if position.is_breakeven_eligible() {
        position.stop_loss = Some(position.entry_price);
        position.breakeven_triggered = true;
    }

    // 4. Trailing stop: move favorably only, by the initial risk distance.
    if position.should_trail_stop() {
        let candidate = match position.side {
            Side::Long => price - position.initial_risk,
            Side::Short => price + position.initial_risk,
        };
        let improves = match position.side {
            Side::Long => position.stop_loss.is_none_or(|sl| candidate > sl),
            Side::Short => position.stop_loss.is_none_or(|sl| candidate < sl),
        };
        if improves {
            position.stop_loss = Some(candidate);
            position.trailing_stop = Some(candidate);
        }
    }

    ManageOutcome::StillOpen {
        partial_realized,
        partials_fired,
    }
}

/// Closes the remaining quantity at `exit_price` and produces the immutable
/// `Trade` record. `realized_total` is the FULL realized P&L for the trade
/// (including any partial closes booked earlier in its life) — the caller
/// computes it since only the caller knows whether prior partials apply.
/// Does not mutate portfolio balance — callers book the returned P&L
/// themselves.
pub fn close_trade(
    position: &Position,
    exit_price: f64,
    closed_at: DateTime<Utc>,
    reason: ClosureReason,
    realized_total: f64,
) -> Trade {
    Trade {
        symbol: position.symbol.clone(),
        side: position.side,
        original_quantity: position.original_quantity,
        entry_price: position.entry_price,
        exit_price,
        realized_pnl: realized_total,
        strategy_name: position.strategy_name.clone(),
        opened_at: position.opened_at,
        closed_at,
        breakeven_triggered: position.breakeven_triggered,
        partial_close_history: position.partial_closes.clone(),
        closure_reason: reason,
    }
}
