//! EmberFX Core — domain types, strategy contract, risk engine, trade
//! manager, broker abstraction, data feed contract, and the per-bar
//! engine driver.
//!
//! This crate contains the heart of the backtesting engine:
//! - Domain types (bars, orders, positions, trades, portfolio)
//! - The `Strategy` contract the engine drives every bar
//! - A risk engine with Kelly/volatility/drawdown sizing controls
//! - A trade manager implementing the SL/TP ladder/breakeven/trailing
//!   position state machine
//! - A broker abstraction with a deterministic paper implementation
//! - A data feed contract with an in-memory and a fallback-composite
//!   implementation
//! - The single-threaded, deterministic per-bar engine driver

pub mod broker;
pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod risk;
pub mod strategies;
pub mod strategy;
pub mod trade_manager;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: all core domain types are Send + Sync.
    ///
    /// A `Strategy` is boxed as `Box<dyn Strategy>` and held across an
    /// `Engine` run; if any of these types loses Send/Sync, that bound
    /// breaks at compile time here rather than downstream.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Order>();
        require_sync::<domain::Order>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Portfolio>();
        require_sync::<domain::Portfolio>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();

        require_send::<domain::OrderId>();
        require_sync::<domain::OrderId>();

        require_send::<risk::RiskEngine>();
        require_sync::<risk::RiskEngine>();

        require_send::<broker::PaperBroker>();
        require_sync::<broker::PaperBroker>();

        require_send::<data::FixedFeed>();
        require_sync::<data::FixedFeed>();

        require_send::<strategies::AtrTrendStrategy>();
        require_sync::<strategies::AtrTrendStrategy>();
    }

    /// Architecture contract: `Strategy::signal` does NOT accept Portfolio.
    ///
    /// The trait signature takes only `&[AnnotatedBar]` — if someone adds
    /// a portfolio parameter, the trait changes and every implementation
    /// breaks. Strategies decide direction; only the engine decides
    /// whether to act on it.
    #[test]
    fn strategy_trait_has_no_portfolio_parameter() {
        fn _check_trait_object_builds(
            strat: &dyn strategy::Strategy,
            bars: &[strategy::AnnotatedBar],
        ) -> i8 {
            strat.signal(bars)
        }
    }

    /// Architecture contract: `Broker` does NOT accept a `Position` — it
    /// only ever sees `Order`/`Fill`. Position lifecycle is owned
    /// exclusively by the trade manager, not by the execution venue.
    #[test]
    fn broker_trait_has_no_position_parameter() {
        fn _check_trait_object_builds(
            broker: &mut dyn broker::Broker,
            order: &domain::Order,
            price: f64,
        ) -> Result<broker::Fill, broker::BrokerError> {
            broker.submit_order(order, price)
        }
    }
}
