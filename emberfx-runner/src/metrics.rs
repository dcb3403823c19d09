//! Performance metrics — pure functions over an equity curve and trade list.
//!
//! Every metric is a pure function: equity curve and/or trade list in,
//! scalar out. No dependency on the engine or config; ported from the
//! original's statistics shape (annualized Sharpe/Sortino, max drawdown,
//! win rate, profit factor) and generalized from daily-bar equities to the
//! `Interval`-aware annualization spec.md's metrics section calls for,
//! since FX bars are not necessarily daily.

use serde::{Deserialize, Serialize};

use emberfx_core::domain::{Interval, Trade};

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub trade_count: usize,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub avg_losing_streak: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from an equity curve, trade list, and the bar
    /// interval the equity curve was sampled at (drives annualization).
    pub fn compute(equity_curve: &[f64], trades: &[Trade], interval: Interval) -> Self {
        let bars_per_year = interval.bars_per_year();
        Self {
            total_return: total_return(equity_curve),
            sharpe: sharpe_ratio(equity_curve, bars_per_year),
            sortino: sortino_ratio(equity_curve, bars_per_year),
            calmar: calmar_ratio(equity_curve, bars_per_year),
            max_drawdown: max_drawdown(equity_curve),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            trade_count: trades.len(),
            max_consecutive_wins: max_consecutive(trades, true),
            max_consecutive_losses: max_consecutive(trades, false),
            avg_losing_streak: avg_losing_streak(trades),
        }
    }
}

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let initial = equity_curve[0];
    let final_eq = *equity_curve.last().unwrap();
    if initial <= 0.0 {
        return 0.0;
    }
    (final_eq - initial) / initial
}

/// Per-bar returns annualized into a Sharpe ratio: mean / std * sqrt(bars_per_year).
pub fn sharpe_ratio(equity_curve: &[f64], bars_per_year: f64) -> f64 {
    let returns = bar_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(&returns);
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * bars_per_year.sqrt()
}

/// Annualized Sortino ratio: only downside deviation penalizes the denominator.
pub fn sortino_ratio(equity_curve: &[f64], bars_per_year: f64) -> f64 {
    let returns = bar_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(&returns);
    let downside_sq: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).map(|r| r * r).collect();
    if downside_sq.is_empty() {
        return 0.0;
    }
    let downside_var = downside_sq.iter().sum::<f64>() / returns.len() as f64;
    let downside_std = downside_var.sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    (mean / downside_std) * bars_per_year.sqrt()
}

/// Annualized return / |max drawdown|. 0.0 when drawdown is zero or the
/// annualized return is non-positive.
pub fn calmar_ratio(equity_curve: &[f64], bars_per_year: f64) -> f64 {
    let dd = max_drawdown(equity_curve);
    if dd >= 0.0 || equity_curve.len() < 2 {
        return 0.0;
    }
    let total = total_return(equity_curve);
    if total <= 0.0 {
        return 0.0;
    }
    let years = equity_curve.len() as f64 / bars_per_year;
    if years <= 0.0 {
        return 0.0;
    }
    let annualized = (1.0 + total).powf(1.0 / years) - 1.0;
    if annualized <= 0.0 {
        return 0.0;
    }
    annualized / dd.abs()
}

/// Maximum drawdown as a negative fraction (e.g. -0.15 = 15% drawdown).
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_curve[0];
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Gross profits / gross losses, capped at 100.0 for all-winners edge cases.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades.iter().filter(|t| t.realized_pnl > 0.0).map(|t| t.realized_pnl).sum();
    let gross_loss: f64 = trades.iter().filter(|t| t.realized_pnl < 0.0).map(|t| t.realized_pnl.abs()).sum();
    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

pub fn avg_losing_streak(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let mut streaks = Vec::new();
    let mut current = 0usize;
    for trade in trades {
        if !trade.is_winner() {
            current += 1;
        } else {
            if current > 0 {
                streaks.push(current);
            }
            current = 0;
        }
    }
    if current > 0 {
        streaks.push(current);
    }
    if streaks.is_empty() {
        return 0.0;
    }
    streaks.iter().sum::<usize>() as f64 / streaks.len() as f64
}

fn max_consecutive(trades: &[Trade], winners: bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;
    for trade in trades {
        if trade.is_winner() == winners {
            current += 1;
            if current > max_streak {
                max_streak = current;
            }
        } else {
            current = 0;
        }
    }
    max_streak
}

fn bar_returns(equity_curve: &[f64]) -> Vec<f64> {
    if equity_curve.len() < 2 {
        return Vec::new();
    }
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
