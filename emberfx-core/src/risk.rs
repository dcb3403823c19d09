//! Risk engine (§4.3) — per-trade sizing, daily loss cap, drawdown throttle.
//!
//! Grounded on the sizing-algorithm shape of `sizers::atr_risk` (a `Sizer`
//! computing notional from account state) generalized to the multi-stage
//! clamp cascade spec.md defines, and cross-checked against the original
//! Python `RiskEngine`/`RiskConfig` (`core/risk_engine.py`) for exact
//! sequencing of the Kelly/volatility/drawdown clamps.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Per-trade and account-level risk configuration (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    pub base_risk_fraction: f64,
    pub max_risk_fraction: f64,
    pub daily_loss_cap_fraction: f64,
    pub max_drawdown_fraction: f64,
    pub drawdown_recovery_fraction: f64,
    pub kelly_scale: f64,
    pub volatility_target: f64,
    pub min_trade_notional: f64,
    pub max_trade_notional: f64,
    #[serde(default)]
    pub symbol_multipliers: BTreeMap<String, f64>,
    #[serde(default)]
    pub strategy_multipliers: BTreeMap<String, f64>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            base_risk_fraction: 0.02,
            max_risk_fraction: 0.05,
            daily_loss_cap_fraction: 0.05,
            max_drawdown_fraction: 0.25,
            drawdown_recovery_fraction: 0.10,
            kelly_scale: 0.25,
            volatility_target: 0.01,
            min_trade_notional: 10.0,
            max_trade_notional: 100.0,
            symbol_multipliers: BTreeMap::new(),
            strategy_multipliers: BTreeMap::new(),
        }
    }
}

/// Outcome of a single closed trade, fed back for recent-window statistics.
#[derive(Debug, Clone, Copy)]
struct TradeOutcome {
    pnl: f64,
    symbol_hash: u64,
    strategy_hash: u64,
}

fn hash_str(s: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut h = std::collections::hash_map::DefaultHasher::new();
    s.hash(&mut h);
    h.finish()
}

/// Observability snapshot of the risk engine's internal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSummary {
    pub daily_pnl: f64,
    pub peak_equity: f64,
    pub current_equity: f64,
    pub current_drawdown: f64,
    pub drawdown_throttle_active: bool,
    pub recent_trade_count: usize,
    pub recent_win_rate: Option<f64>,
}

const RECENT_TRADE_WINDOW: usize = 20;

/// Account-level risk engine: sizing, daily loss cap, drawdown throttle.
///
/// Owns a bounded recent-trade window (§3 "Ownership") and the throttle's
/// hysteresis state; mutated only by the engine driver.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    config: RiskConfig,
    peak_equity: f64,
    current_equity: f64,
    daily_pnl: f64,
    daily_boundary: Option<NaiveDate>,
    drawdown_throttle: bool,
    recent_trades: VecDeque<TradeOutcome>,
}

impl RiskEngine {
    /// `peak_equity` seeds from `initial_balance`, per spec.md's explicit
    /// resolution of the original's peak-inflation open question.
    pub fn new(config: RiskConfig, initial_balance: f64) -> Self {
        Self {
            config,
            peak_equity: initial_balance,
            current_equity: initial_balance,
            daily_pnl: 0.0,
            daily_boundary: None,
            drawdown_throttle: false,
            recent_trades: VecDeque::with_capacity(RECENT_TRADE_WINDOW),
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Position-sizing algorithm (§4.3). Returns notional currency, never
    /// NaN or negative.
    pub fn position_size(
        &self,
        symbol: &str,
        strategy: &str,
        balance: f64,
        volatility: Option<f64>,
        win_rate: Option<f64>,
    ) -> f64 {
        if !(balance > 0.0) {
            return 0.0;
        }

        let mut notional = balance * self.config.base_risk_fraction;

        let symbol_mult = self
            .config
            .symbol_multipliers
            .get(symbol)
            .copied()
            .unwrap_or(1.0);
        let strategy_mult = self
            .config
            .strategy_multipliers
            .get(strategy)
            .copied()
            .unwrap_or(1.0);
        notional *= symbol_mult * strategy_mult;

        if let Some(w) = win_rate {
            if w > 0.0 && w < 1.0 {
                let kelly = (2.0 * w - 1.0).max(0.0);
                let kelly_notional = balance * kelly * self.config.kelly_scale;
                notional = notional.min(kelly_notional);
            }
        }

        if let Some(v) = volatility {
            if v > 0.0 {
                let vol_target_notional = balance * self.config.volatility_target / v;
                notional = notional.min(vol_target_notional);
            }
        }

        if self.drawdown_throttle {
            notional *= 0.5;
        }

        let max_notional = balance * self.config.max_risk_fraction;
        notional = notional.min(max_notional);

        notional.clamp(self.config.min_trade_notional, self.config.max_trade_notional)
    }

    /// True if new entries should be refused for the remainder of the
    /// trading day (§4.3 "Daily loss cap").
    pub fn daily_cap_breached(&self, balance: f64) -> bool {
        let cap = balance * self.config.daily_loss_cap_fraction;
        self.daily_pnl < -cap
    }

    /// True while the drawdown throttle is engaged (halves sizing AND
    /// refuses new entries per §4.3).
    pub fn drawdown_throttle_active(&self) -> bool {
        self.drawdown_throttle
    }

    /// Update peak/current equity and the throttle's hysteresis state for
    /// the current bar. Must be called once per bar before `position_size`
    /// or the veto checks are consulted for that bar.
    pub fn update_equity(&mut self, equity: f64) {
        self.current_equity = equity;
        if equity > self.peak_equity {
            self.peak_equity = equity;
            self.drawdown_throttle = false;
            return;
        }
        if self.peak_equity <= 0.0 {
            return;
        }
        let drawdown = (self.peak_equity - equity) / self.peak_equity;
        if drawdown > self.config.max_drawdown_fraction {
            self.drawdown_throttle = true;
        } else if self.drawdown_throttle {
            let recovery_threshold =
                self.config.max_drawdown_fraction - self.config.drawdown_recovery_fraction;
            if drawdown < recovery_threshold {
                self.drawdown_throttle = false;
            }
        }
    }

    /// Accumulate realized P&L into the running daily total.
    pub fn record_daily_pnl(&mut self, pnl_delta: f64) {
        self.daily_pnl += pnl_delta;
    }

    /// Resets the daily P&L accumulator. The engine driver calls this when
    /// a bar's UTC date differs from the previous bar's (§4.3 "Day boundary
    /// is UTC midnight; reset explicit").
    pub fn roll_day_boundary(&mut self, bar_timestamp: DateTime<Utc>) {
        let date = bar_timestamp.date_naive();
        if self.daily_boundary != Some(date) {
            self.daily_boundary = Some(date);
            self.daily_pnl = 0.0;
        }
    }

    /// Feeds a closed trade's outcome into the bounded recent-trade window.
    pub fn add_trade_result(&mut self, pnl: f64, symbol: &str, strategy: &str) {
        if self.recent_trades.len() == RECENT_TRADE_WINDOW {
            self.recent_trades.pop_front();
        }
        self.recent_trades.push_back(TradeOutcome {
            pnl,
            symbol_hash: hash_str(symbol),
            strategy_hash: hash_str(strategy),
        });
    }

    /// Fraction of wins among recent trades, optionally filtered by symbol
    /// and/or strategy. `None` if no trades match.
    pub fn recent_win_rate(&self, symbol: Option<&str>, strategy: Option<&str>) -> Option<f64> {
        let filtered = self.filtered_recent(symbol, strategy);
        if filtered.is_empty() {
            return None;
        }
        let wins = filtered.iter().filter(|t| t.pnl > 0.0).count();
        Some(wins as f64 / filtered.len() as f64)
    }

    /// Sample standard deviation of recent P&Ls, optionally filtered by
    /// symbol. `None` with fewer than two matching trades.
    pub fn recent_pnl_volatility(&self, symbol: Option<&str>) -> Option<f64> {
        let filtered = self.filtered_recent(symbol, None);
        if filtered.len() < 2 {
            return None;
        }
        let pnls: Vec<f64> = filtered.iter().map(|t| t.pnl).collect();
        let mean = pnls.iter().sum::<f64>() / pnls.len() as f64;
        let variance =
            pnls.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / pnls.len() as f64;
        Some(variance.sqrt())
    }

    fn filtered_recent(&self, symbol: Option<&str>, strategy: Option<&str>) -> Vec<TradeOutcome> {
        self.recent_trades
            .iter()
            .copied()
            .filter(|t| symbol.is_none_or(|s| hash_str(s) == t.symbol_hash))
            .filter(|t| strategy.is_none_or(|s| hash_str(s) == t.strategy_hash))
            .collect()
    }

    /// `symbol_multiplier(symbol) * strategy_multiplier(strategy)`, exposed
    /// for logging/diagnostics (not consumed by `position_size`, which
    /// applies the two factors independently per §4.3 step 2).
    pub fn risk_multiplier(&self, symbol: &str, strategy: &str) -> f64 {
        let sm = self
            .config
            .symbol_multipliers
            .get(symbol)
            .copied()
            .unwrap_or(1.0);
        let tm = self
            .config
            .strategy_multipliers
            .get(strategy)
            .copied()
            .unwrap_or(1.0);
        sm * tm
    }

    pub fn risk_summary(&self) -> RiskSummary {
        let current_drawdown = if self.peak_equity > 0.0 {
            ((self.peak_equity - self.current_equity) / self.peak_equity).max(0.0)
        } else {
            0.0
        };
        RiskSummary {
            daily_pnl: self.daily_pnl,
            peak_equity: self.peak_equity,
            current_equity: self.current_equity,
            current_drawdown,
            drawdown_throttle_active: self.drawdown_throttle,
            recent_trade_count: self.recent_trades.len(),
            recent_win_rate: self.recent_win_rate(None, None),
        }
    }
}
