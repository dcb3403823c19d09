//! Strategy contract (§4.2) — the pluggable decision surface the engine drives.
//!
//! Concrete strategies are black-box implementations of this trait; the
//! engine never inspects their internals. Grounded on the trait-object
//! composition style of the component traits this workspace's signal
//! generators used, generalized to the single combined contract spec.md
//! defines (indicators + signal + volatility + SL/TP in one interface,
//! rather than split into separate signal/filter components).

use std::collections::BTreeMap;

use crate::domain::{Bar, Side};

/// A bar augmented with whatever indicator columns a strategy derives from
/// history. Strategies own the shape of `indicators`; the engine only ever
/// passes it back to the same strategy that produced it.
#[derive(Debug, Clone)]
pub struct AnnotatedBar {
    pub bar: Bar,
    pub indicators: BTreeMap<String, f64>,
}

/// The contract the engine drives every bar, per §4.2.
///
/// Implementations MUST be deterministic and MUST NOT throw/panic for
/// malformed-but-finite input; on insufficient history, `signal` returns
/// `0` and `volatility`/`stop_loss`/`take_profit` return `None`.
pub trait Strategy: Send + Sync {
    /// Stable identifier, used for trade attribution and risk multipliers.
    fn name(&self) -> &str;

    /// Current parameter values, as a flat numeric map.
    fn params(&self) -> BTreeMap<String, f64>;

    /// Replace parameters wholesale. Implementations MUST reset any fitted
    /// internal state (§4.2: "effect on internal state is a reset of any
    /// model fit").
    fn set_params(&mut self, params: BTreeMap<String, f64>);

    /// Derive indicator columns. Pure: `indicators(bars) == indicators(bars)`
    /// for the same input every time. Bars with insufficient trailing
    /// history get sentinel (`NaN`/absent) indicator values, not a failure.
    fn indicators(&self, bars: &[Bar]) -> Vec<AnnotatedBar>;

    /// Directional signal evaluated on the LAST bar of `bars`. Returns `0`
    /// whenever required history is insufficient; never panics.
    fn signal(&self, bars: &[AnnotatedBar]) -> i8;

    /// Volatility estimate (typically ATR/price) for the last bar, used by
    /// the risk engine's volatility targeting. `None` means "unknown" —
    /// the risk engine then skips volatility targeting for this sizing call.
    fn volatility(&self, bars: &[AnnotatedBar]) -> Option<f64>;

    /// Advisory initial stop-loss price for a new position opened at
    /// `entry_price` on `side`. `None` leaves the position unprotected.
    fn stop_loss(&self, bars: &[AnnotatedBar], entry_price: f64, side: Side) -> Option<f64>;

    /// Advisory take-profit-1 price for a new position. `None` disables the
    /// take-profit ladder entirely for this position.
    fn take_profit(&self, bars: &[AnnotatedBar], entry_price: f64, side: Side) -> Option<f64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal strategy that always holds — used to pin down the
    /// "insufficient history / no opinion" contract in isolation from any
    /// concrete indicator math.
    struct AlwaysHold;

    impl Strategy for AlwaysHold {
        fn name(&self) -> &str {
            "always_hold"
        }
        fn params(&self) -> BTreeMap<String, f64> {
            BTreeMap::new()
        }
        fn set_params(&mut self, _params: BTreeMap<String, f64>) {}
        fn indicators(&self, bars: &[Bar]) -> Vec<AnnotatedBar> {
            bars.iter()
                .cloned()
                .map(|bar| AnnotatedBar {
                    bar,
                    indicators: BTreeMap::new(),
                })
                .collect()
        }
        fn signal(&self, _bars: &[AnnotatedBar]) -> i8 {
            0
        }
        fn volatility(&self, _bars: &[AnnotatedBar]) -> Option<f64> {
            None
        }
        fn stop_loss(&self, _bars: &[AnnotatedBar], _entry_price: f64, _side: Side) -> Option<f64> {
            None
        }
        fn take_profit(
            &self,
            _bars: &[AnnotatedBar],
            _entry_price: f64,
            _side: Side,
        ) -> Option<f64> {
            None
        }
    }

    #[test]
    fn trait_object_is_dyn_compatible() {
        let strat: Box<dyn Strategy> = Box::new(AlwaysHold);
        assert_eq!(strat.name(), "always_hold");
        assert_eq!(strat.signal(&[]), 0);
    }

    #[test]
    fn signal_generator_trait_has_no_portfolio_parameter() {
        // The trait signature is `signal(&self, bars: &[AnnotatedBar]) -> i8`.
        // If this compiles, strategies cannot see portfolio state — the
        // engine alone decides whether to act on a signal.
        fn _check_trait_object_builds(strat: &dyn Strategy, bars: &[AnnotatedBar]) -> i8 {
            strat.signal(bars)
        }
    }
}
