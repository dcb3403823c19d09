//! Engine driver (§4.7) — fixed per-bar orchestration.
//!
//! Grounded on the shape of the retired `loop_runner::run_backtest` (bars
//! converted up front, a single sequential bar loop, per-bar error
//! containment) generalized from the four-phase order/fill loop to the
//! five-step strategy/risk/trade-manager orchestration spec.md §4.7
//! defines. One `Engine` owns one `Portfolio`, one `RiskEngine`, one
//! broker handle, and the set of open positions across its bound
//! symbol/strategy pairs — no shared mutable state, matching §5's
//! single-threaded-per-instance model.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::{DateTime, Utc};

use crate::broker::Broker;
use crate::domain::{Bar, ClosureReason, Order, Portfolio, Side};
use crate::risk::RiskEngine;
use crate::strategy::{AnnotatedBar, Strategy};
use crate::trade_manager::{self, ManageOutcome};

/// Per-bar orchestration result for a single run. Bounded per §7: the
/// engine keeps going after a contained failure and reports it here
/// rather than aborting.
#[derive(Debug, Default)]
pub struct RunResult {
    /// First 100 structured error entries, keyed by bar index (§7).
    pub errors: Vec<String>,
    pub error_count: usize,
}

const MAX_REPORTED_ERRORS: usize = 100;

impl RunResult {
    fn push_error(&mut self, bar_index: usize, detail: impl std::fmt::Display) {
        self.error_count += 1;
        if self.errors.len() < MAX_REPORTED_ERRORS {
            self.errors.push(format!("bar {bar_index}: {detail}"));
        }
    }
}

/// The engine driver: one portfolio, one risk engine, one broker, a set of
/// symbol -> strategy bindings and their open positions.
pub struct Engine<B: Broker> {
    portfolio: Portfolio,
    risk: RiskEngine,
    broker: B,
    strategies: BTreeMap<String, Box<dyn Strategy>>,
    positions: BTreeMap<String, crate::domain::Position>,
    stop_requested: bool,
}

impl<B: Broker> Engine<B> {
    pub fn new(initial_balance: f64, risk: RiskEngine, broker: B) -> Self {
        Self {
            portfolio: Portfolio::new(initial_balance),
            risk,
            broker,
            strategies: BTreeMap::new(),
            positions: BTreeMap::new(),
            stop_requested: false,
        }
    }

    pub fn add_strategy(&mut self, symbol: impl Into<String>, strategy: Box<dyn Strategy>) {
        self.strategies.insert(symbol.into(), strategy);
    }

    pub fn remove_strategy(&mut self, symbol: &str) {
        self.strategies.remove(symbol);
        self.positions.remove(symbol);
    }

    /// Cooperative stop flag (§5): checked only between bars.
    pub fn stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Runs every bound symbol/strategy over its pre-fetched, time-aligned
    /// bar series. `bars_by_symbol` entries MUST share the same length and
    /// per-index timestamp; alignment itself is the caller's
    /// responsibility (the `DataFeed`/runner layer), not the engine's.
    pub fn run(&mut self, bars_by_symbol: &BTreeMap<String, Vec<Bar>>) -> RunResult {
        let mut result = RunResult::default();
        let num_bars = bars_by_symbol.values().map(|v| v.len()).min().unwrap_or(0);

        'bars: for t in 0..num_bars {
            if self.stop_requested {
                break 'bars;
            }

            // Roll the day boundary before any symbol is stepped, so the
            // first bar of a new day checks the cap against a fresh
            // `daily_pnl` and its own realized P&L accumulates into that
            // fresh day rather than being wiped by a reset afterward.
            if let Some(series) = bars_by_symbol.values().next() {
                self.risk.roll_day_boundary(series[t].timestamp);
            }

            let symbols: Vec<String> = self.strategies.keys().cloned().collect();
            let mut timestamp: Option<DateTime<Utc>> = None;

            for symbol in &symbols {
                let Some(series) = bars_by_symbol.get(symbol) else {
                    continue;
                };
                let bar = &series[t];
                if bar.is_void() {
                    result.push_error(t, format!("{symbol}: no data (void bar)"));
                    continue;
                }
                timestamp.get_or_insert(bar.timestamp);
                self.step_symbol(t, symbol, &series[..=t], &mut result);
            }

            if let Some(ts) = timestamp {
                let unrealized: f64 = self.positions.values().map(|p| p.unrealized_pnl()).sum();
                self.portfolio.update_equity(unrealized, ts);
                self.risk.update_equity(self.portfolio.equity());
            }
        }

        result
    }

    /// Steps 2-4 of §4.7 for one symbol on one bar.
    fn step_symbol(&mut self, bar_index: usize, symbol: &str, history: &[Bar], result: &mut RunResult) {
        let bar = history.last().expect("history non-empty by construction");
        let price = bar.close;
        let now = bar.timestamp;

        let Some(strategy) = self.strategies.get(symbol) else {
            return;
        };
        let strategy_name = strategy.name().to_string();

        // Step 2: indicators/signal/volatility, contained per §7 — a
        // strategy is contractually required never to panic, but the
        // engine still isolates a single bad bar rather than aborting the
        // whole run if one does.
        let (annotated, signal, volatility): (Vec<AnnotatedBar>, i8, Option<f64>) =
            match catch_unwind(AssertUnwindSafe(|| {
                let annotated = strategy.indicators(history);
                let signal = strategy.signal(&annotated);
                let volatility = strategy.volatility(&annotated);
                (annotated, signal, volatility)
            })) {
                Ok(triple) => triple,
                Err(_) => {
                    result.push_error(bar_index, format!("{symbol}: strategy step panicked, downgraded to signal=0"));
                    (Vec::new(), 0, None)
                }
            };

        // Step 3: manage any open position for this symbol.
        let mut flip_opposite = false;
        if let Some(position) = self.positions.get_mut(symbol) {
            match trade_manager::manage(position, price, now) {
                ManageOutcome::Closed { trade, realized } => {
                    self.risk.record_daily_pnl(realized);
                    self.risk.add_trade_result(trade.realized_pnl, symbol, trade.strategy_name.as_str());
                    tracing::debug!(symbol, reason = %trade.closure_reason, pnl = trade.realized_pnl, "position closed");
                    self.portfolio.record_trade(realized, trade);
                    self.positions.remove(symbol);
                }
                ManageOutcome::StillOpen { partial_realized, partials_fired } => {
                    if partial_realized != 0.0 {
                        self.portfolio.credit(partial_realized);
                        self.risk.record_daily_pnl(partial_realized);
                        for (rung, qty, px) in partials_fired {
                            tracing::debug!(symbol, rung, qty, px, "partial close");
                        }
                    }
                    let side = self.positions.get(symbol).map(|p| p.side);
                    if let Some(side) = side {
                        if let Some(sig_side) = Side::from_signal(signal) {
                            flip_opposite = sig_side == side.opposite();
                        }
                    }
                }
            }
        }

        if flip_opposite {
            if let Some(position) = self.positions.remove(symbol) {
                let remaining = position.remaining_quantity();
                let leg = position.side.sign() * remaining * (price - position.entry_price);
                let total = position.realized_pnl_to_date + leg;
                let trade = trade_manager::close_trade(&position, price, now, ClosureReason::SignalFlip, total);
                self.risk.record_daily_pnl(leg);
                self.risk.add_trade_result(trade.realized_pnl, symbol, trade.strategy_name.as_str());
                self.portfolio.record_trade(leg, trade);
            }
        }

        // Step 4: open a new position if a non-zero signal has no
        // existing position to act against.
        if signal != 0 && !self.positions.contains_key(symbol) {
            self.try_open(symbol, &strategy_name, price, now, signal, &annotated, volatility, result, bar_index);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn try_open(
        &mut self,
        symbol: &str,
        strategy_name: &str,
        price: f64,
        now: DateTime<Utc>,
        signal: i8,
        annotated: &[AnnotatedBar],
        volatility: Option<f64>,
        result: &mut RunResult,
        bar_index: usize,
    ) {
        let Some(side) = Side::from_signal(signal) else {
            return;
        };
        let balance = self.portfolio.balance;

        if self.risk.daily_cap_breached(balance) {
            tracing::info!(symbol, "new entry vetoed: daily loss cap breached");
            return;
        }
        if self.risk.drawdown_throttle_active() {
            tracing::info!(symbol, "new entry vetoed: drawdown throttle engaged");
            return;
        }

        let win_rate = self.risk.recent_win_rate(Some(symbol), Some(strategy_name));
        let notional = self.risk.position_size(symbol, strategy_name, balance, volatility, win_rate);
        if notional <= 0.0 {
            return;
        }
        let quantity = notional / price;

        let strategy = self.strategies.get(symbol).expect("checked by caller");
        let stop_loss = strategy.stop_loss(annotated, price, side);
        let take_profit = strategy.take_profit(annotated, price, side);

        let order = match Order::new(symbol, side, quantity, now) {
            Ok(order) => order.with_stop_loss(stop_loss).with_take_profit(take_profit),
            Err(e) => {
                result.push_error(bar_index, format!("{symbol}: order rejected: {e}"));
                return;
            }
        };

        match self.broker.submit_order(&order, price) {
            Ok(fill) => {
                let Some(order_id) = fill.order_id else {
                    // No order_id means the broker did not actually open anything;
                    // leave portfolio state untouched rather than guess at a position.
                    result.push_error(bar_index, format!("{symbol}: fill carried no order_id, treated as no-op"));
                    return;
                };
                let position = trade_manager::open_position(&order, fill.price, strategy_name, now);
                tracing::debug!(symbol, order_id = %order_id, side = ?side, qty = fill.quantity, price = fill.price, "position opened");
                self.positions.insert(symbol.to_string(), position);
            }
            Err(e) => {
                result.push_error(bar_index, format!("{symbol}: broker submit failed: {e}"));
            }
        }
    }
}
