//! Paper broker — simulated fills at the requested price, commission
//! deducted from realized P&L at close.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{IdGen, Order, Side};

use super::{Broker, BrokerError, Fill};

/// Commission model applied at close: `bps * notional + fixed`.
/// Neither the Python original's `core/paper_broker.py` nor
/// `adapters/brokers/paper_broker.py` charges commission; this is a
/// supplemental cost model spec.md §4.6 requires.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaperBrokerConfig {
    pub commission_bps: f64,
    pub commission_fixed: f64,
}

impl Default for PaperBrokerConfig {
    fn default() -> Self {
        Self {
            commission_bps: 0.0,
            commission_fixed: 0.0,
        }
    }
}

impl PaperBrokerConfig {
    fn commission(&self, notional: f64) -> f64 {
        notional.abs() * self.commission_bps / 10_000.0 + self.commission_fixed
    }
}

#[derive(Debug, Clone)]
struct OpenLeg {
    side: Side,
    quantity: f64,
    entry_price: f64,
}

/// A simulated broker: fills every order in full at the price it's
/// submitted with. Tracks balance and one open leg per symbol.
pub struct PaperBroker {
    config: PaperBrokerConfig,
    balance: f64,
    positions: BTreeMap<String, OpenLeg>,
    ids: IdGen,
}

impl PaperBroker {
    pub fn new(initial_balance: f64, config: PaperBrokerConfig) -> Self {
        Self {
            config,
            balance: initial_balance,
            positions: BTreeMap::new(),
            ids: IdGen::default(),
        }
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }
}

impl Broker for PaperBroker {
    fn submit_order(&mut self, order: &Order, market_price: f64) -> Result<Fill, BrokerError> {
        self.positions.insert(
            order.symbol.clone(),
            OpenLeg {
                side: order.side,
                quantity: order.quantity,
                entry_price: market_price,
            },
        );
        Ok(Fill {
            order_id: Some(self.ids.next_order_id()),
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
            price: market_price,
        })
    }

    fn close_position(&mut self, symbol: &str, exit_price: f64) -> Result<f64, BrokerError> {
        let leg = self
            .positions
            .remove(symbol)
            .ok_or_else(|| BrokerError::NoPosition(symbol.to_string()))?;
        let gross = leg.side.sign() * leg.quantity * (exit_price - leg.entry_price);
        let notional = leg.quantity * exit_price;
        let net = gross - self.config.commission(notional);
        self.balance += net;
        Ok(net)
    }

    fn balance(&self) -> f64 {
        self.balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn order(side: Side, qty: f64) -> Order {
        Order::new("EURUSD", side, qty, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()).unwrap()
    }

    #[test]
    fn submit_then_close_books_realized_pnl() {
        let mut broker = PaperBroker::new(10_000.0, PaperBrokerConfig::default());
        broker.submit_order(&order(Side::Long, 1000.0), 1.2000).unwrap();
        let realized = broker.close_position("EURUSD", 1.2100).unwrap();
        assert!((realized - 10.0).abs() < 1e-9);
        assert!((broker.balance() - 10_010.0).abs() < 1e-9);
    }

    #[test]
    fn commission_reduces_realized_pnl() {
        let config = PaperBrokerConfig { commission_bps: 10.0, commission_fixed: 1.0 };
        let mut broker = PaperBroker::new(10_000.0, config);
        broker.submit_order(&order(Side::Long, 1000.0), 1.2000).unwrap();
        let realized = broker.close_position("EURUSD", 1.2100).unwrap();
        // gross = 10.0, notional = 1000*1.2100 = 1210, commission = 1210*0.001 + 1 = 2.21
        assert!((realized - (10.0 - 2.21)).abs() < 1e-6);
    }

    #[test]
    fn close_without_position_errors() {
        let mut broker = PaperBroker::new(10_000.0, PaperBrokerConfig::default());
        assert_eq!(
            broker.close_position("EURUSD", 1.2000),
            Err(BrokerError::NoPosition("EURUSD".to_string()))
        );
    }

    #[test]
    fn short_side_realized_pnl() {
        let mut broker = PaperBroker::new(10_000.0, PaperBrokerConfig::default());
        broker.submit_order(&order(Side::Short, 1000.0), 1.2000).unwrap();
        let realized = broker.close_position("EURUSD", 1.1900).unwrap();
        assert!((realized - 10.0).abs() < 1e-9);
    }
}
