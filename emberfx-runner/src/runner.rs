//! Backtest runner — wires a `DataFeed`'s bars, the one built-in `Strategy`,
//! and a `RiskConfig` into an `Engine` run, then reduces the result into a
//! `BacktestResult` ready for export.
//!
//! Single entry point: `run_backtest()`. Grounded on the three-tier
//! `run_single_backtest`/`run_backtest_from_data`/`run_backtest_with_exec_config`
//! split, collapsed to one function since this workspace has no data-cache
//! layer or execution-preset sweep to thread through separately.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use emberfx_core::broker::PaperBroker;
use emberfx_core::domain::{Bar, Trade};
use emberfx_core::risk::RiskEngine;
use emberfx_core::strategies::AtrTrendStrategy;
use emberfx_core::strategy::Strategy;

use crate::config::{BacktestConfig, ConfigError};
use crate::metrics::PerformanceMetrics;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("no bars supplied for symbol {0}")]
    EmptyBars(String),
}

/// Current schema version for persisted `BacktestResult` artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run, ready for JSON/CSV export (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub strategy_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub initial_balance: f64,
    pub final_balance: f64,
    pub total_return: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub bar_count: usize,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<Trade>,
    pub equity_series: Vec<f64>,
    pub balance_series: Vec<f64>,
    pub timestamps: Vec<DateTime<Utc>>,
    /// First 100 contained per-bar errors (§7); `error_count` is the total.
    pub errors: Vec<String>,
    pub error_count: usize,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn build_strategy(config: &BacktestConfig) -> AtrTrendStrategy {
    let mut strategy = AtrTrendStrategy::new(8, 21, 14);
    if !config.strategy.params.is_empty() {
        strategy.set_params(config.strategy.params.clone());
    }
    strategy
}

/// Runs a single symbol/strategy backtest over `bars` (already fetched and,
/// if the caller bound multiple symbols elsewhere, pre-aligned — this
/// function only ever drives one symbol).
pub fn run_backtest(config: &BacktestConfig, bars: Vec<Bar>) -> Result<BacktestResult, RunError> {
    if bars.is_empty() {
        return Err(RunError::EmptyBars(config.symbol.clone()));
    }

    let strategy = build_strategy(config);
    let strategy_name = strategy.name().to_string();
    let risk = RiskEngine::new(config.risk.clone(), config.initial_balance);
    let broker = PaperBroker::new(config.initial_balance, config.broker);

    let mut engine = emberfx_core::engine::Engine::new(config.initial_balance, risk, broker);
    engine.add_strategy(config.symbol.clone(), Box::new(strategy));

    let mut bars_by_symbol = std::collections::BTreeMap::new();
    let bar_count = bars.len();
    bars_by_symbol.insert(config.symbol.clone(), bars);

    let run_result = engine.run(&bars_by_symbol);
    let portfolio = engine.portfolio();
    let equity_series: Vec<f64> = portfolio.equity_history.iter().map(|s| s.equity).collect();
    let balance_series: Vec<f64> = portfolio.equity_history.iter().map(|s| s.balance).collect();
    let timestamps: Vec<DateTime<Utc>> = portfolio.equity_history.iter().map(|s| s.timestamp).collect();
    let metrics = PerformanceMetrics::compute(&equity_series, &portfolio.trades, config.interval);

    let start = *timestamps.first().expect("non-empty bars guarantee at least one equity sample");
    let end = *timestamps.last().expect("non-empty bars guarantee at least one equity sample");
    let final_balance = portfolio.balance;
    let total_return = if config.initial_balance > 0.0 {
        (final_balance - config.initial_balance) / config.initial_balance
    } else {
        0.0
    };
    let winning_trades = portfolio.trades.iter().filter(|t| t.is_winner()).count();
    let losing_trades = portfolio.trades.len() - winning_trades;

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        symbol: config.symbol.clone(),
        strategy_name,
        start,
        end,
        initial_balance: config.initial_balance,
        final_balance,
        total_return,
        total_trades: portfolio.trades.len(),
        winning_trades,
        losing_trades,
        bar_count,
        metrics,
        trades: portfolio.trades.clone(),
        equity_series,
        balance_series,
        timestamps,
        errors: run_result.errors,
        error_count: run_result.error_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use emberfx_core::risk::RiskConfig;

    fn config() -> BacktestConfig {
        BacktestConfig {
            symbol: "EURUSD".to_string(),
            interval: emberfx_core::domain::Interval::H1,
            initial_balance: 10_000.0,
            strategy: crate::config::StrategyBinding {
                name: "atr_trend".to_string(),
                params: [("fast_period".to_string(), 2.0), ("slow_period".to_string(), 4.0), ("atr_period".to_string(), 3.0)]
                    .into_iter()
                    .collect(),
            },
            risk: RiskConfig::default(),
            broker: Default::default(),
        }
    }

    fn trending_bars(n: u32) -> Vec<Bar> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (1..=n)
            .map(|i| {
                let c = 1.10 + 0.002 * i as f64;
                Bar {
                    symbol: "EURUSD".to_string(),
                    timestamp: base + chrono::Duration::hours(i as i64),
                    open: c - 0.0005,
                    high: c + 0.0015,
                    low: c - 0.0015,
                    close: c,
                    volume: 1_000,
                }
            })
            .collect()
    }

    #[test]
    fn run_backtest_produces_equity_curve_matching_bar_count() {
        let result = run_backtest(&config(), trending_bars(40)).unwrap();
        assert_eq!(result.bar_count, 40);
        assert_eq!(result.equity_series.len(), 40);
        assert_eq!(result.balance_series.len(), 40);
        assert_eq!(result.timestamps.len(), 40);
        assert_eq!(result.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn run_backtest_rejects_empty_bars() {
        let err = run_backtest(&config(), vec![]).unwrap_err();
        assert!(matches!(err, RunError::EmptyBars(_)));
    }

    #[test]
    fn run_backtest_reports_trades_through_to_result() {
        let result = run_backtest(&config(), trending_bars(60)).unwrap();
        assert_eq!(result.metrics.trade_count, result.trades.len());
    }
}
