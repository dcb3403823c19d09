//! Property tests for the trade-manager and risk-engine invariants listed
//! under the business-logic specification's testable-properties section:
//! - remaining quantity stays within `(0, original_quantity]` while open,
//!   and partial closes always sum back to the quantity given up
//! - breakeven promotion never lets the stop move adversely afterward
//! - risk sizing is never NaN or negative and the Kelly term at
//!   `win_rate = 0.5` never shrinks the base size

use proptest::prelude::*;

use emberfx_core::domain::{Position, Side};
use emberfx_core::risk::{RiskConfig, RiskEngine};
use emberfx_core::trade_manager::manage;

fn arb_quantity() -> impl Strategy<Value = f64> {
    (10.0..10_000.0_f64).prop_map(|q| (q * 100.0).round() / 100.0)
}

fn arb_entry() -> impl Strategy<Value = f64> {
    (0.5..2.0_f64).prop_map(|p| (p * 10_000.0).round() / 10_000.0)
}

fn arb_risk_distance() -> impl Strategy<Value = f64> {
    (0.0005..0.05_f64).prop_map(|d| (d * 10_000.0).round() / 10_000.0)
}

fn now() -> chrono::DateTime<chrono::Utc> {
    use chrono::TimeZone;
    chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
}

proptest! {
    /// For any sequence of favorable prices fed to `manage()`, the position
    /// never reports a remaining quantity outside `[0, original_quantity]`,
    /// and the partial-close history always sums to what was given up.
    #[test]
    fn remaining_quantity_stays_in_bounds(
        qty in arb_quantity(),
        entry in arb_entry(),
        risk_distance in arb_risk_distance(),
    ) {
        let stop = entry - risk_distance;
        let tp1 = entry + risk_distance * 2.0;
        let mut pos = Position::open("EURUSD", Side::Long, qty, entry, Some(stop), Some(tp1), "atr_trend", now());

        for step in 1..=6 {
            let price = entry + risk_distance * step as f64;
            if let emberfx_core::trade_manager::ManageOutcome::Closed { .. } = manage(&mut pos, price, now()) {
                break;
            }
            prop_assert!(pos.remaining_quantity() > 0.0);
            prop_assert!(pos.remaining_quantity() <= pos.original_quantity + 1e-9);
            let closed: f64 = pos.partial_closes.iter().sum();
            prop_assert!((pos.original_quantity - pos.remaining_quantity() - closed).abs() < 1e-6);
        }
    }

    /// Once breakeven triggers, the stop-loss never becomes worse for the
    /// side than the entry price, across arbitrary subsequent favorable or
    /// retracing price paths.
    #[test]
    fn breakeven_never_moves_adversely(
        qty in arb_quantity(),
        entry in arb_entry(),
        risk_distance in arb_risk_distance(),
    ) {
        let stop = entry - risk_distance;
        let mut pos = Position::open("EURUSD", Side::Long, qty, entry, Some(stop), None, "atr_trend", now());

        manage(&mut pos, entry + risk_distance, now()); // reach 1x risk -> breakeven
        prop_assert!(pos.breakeven_triggered);
        let be_stop = pos.stop_loss.unwrap();
        prop_assert!(be_stop >= entry - 1e-9);

        // Retrace toward entry: breakeven must not un-trigger or worsen.
        manage(&mut pos, entry + risk_distance * 0.1, now());
        prop_assert!(pos.breakeven_triggered);
        prop_assert!(pos.stop_loss.unwrap() >= be_stop - 1e-9);
    }

    /// Risk sizing is never NaN/negative, and at exactly `win_rate = 0.5`
    /// the Kelly term does not shrink the size below what volatility/base
    /// sizing alone would produce.
    #[test]
    fn position_size_is_finite_and_non_negative(
        balance in 0.0..1_000_000.0_f64,
        volatility in prop::option::of(0.0001..1.0_f64),
        win_rate in prop::option::of(0.0..1.0_f64),
    ) {
        let engine = RiskEngine::new(RiskConfig::default(), balance.max(1.0));
        let size = engine.position_size("EURUSD", "atr_trend", balance, volatility, win_rate);
        prop_assert!(size.is_finite());
        prop_assert!(size >= 0.0);
    }

    #[test]
    fn kelly_at_half_win_rate_does_not_shrink_below_base(balance in 1_000.0..1_000_000.0_f64) {
        let engine = RiskEngine::new(RiskConfig::default(), balance);
        let with_half = engine.position_size("EURUSD", "atr_trend", balance, None, Some(0.5));
        let without = engine.position_size("EURUSD", "atr_trend", balance, None, None);
        prop_assert!((with_half - without).abs() < 1e-9);
    }
}
