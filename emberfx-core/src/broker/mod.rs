//! Broker abstraction (§4.6) and the paper broker used for backtesting.
//!
//! Grounded on the Python original's `IBroker` ABC
//! (`core/interfaces.py`) and its `PaperBroker` implementations
//! (`core/paper_broker.py`, `adapters/brokers/paper_broker.py`), with
//! the commission-on-close cost model spec.md §4.6 requires and the
//! original lacks.

pub mod paper;

pub use paper::{PaperBroker, PaperBrokerConfig};

use thiserror::Error;

use crate::domain::{Order, OrderId, Side};

#[derive(Debug, Error, PartialEq)]
pub enum BrokerError {
    #[error("broker is not connected")]
    NotConnected,
    #[error("no open position for {0}")]
    NoPosition(String),
    #[error("order rejected: {0}")]
    Rejected(String),
}

/// A fill for a submitted order — the broker's report of what actually
/// happened, which may differ from the requested order (slippage,
/// partial fills). The paper broker always fills in full at the
/// requested price; live brokers would not.
///
/// `order_id` is `None` when the fill did not open a new tracked order;
/// callers MUST treat that as a no-op and leave portfolio state
/// unchanged rather than infer an identity for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub order_id: Option<OrderId>,
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
}

/// The execution surface the engine driver depends on. Concrete
/// implementations (paper, live) are swappable without the engine
/// driver knowing which one it's talking to.
pub trait Broker: Send + Sync {
    fn submit_order(&mut self, order: &Order, market_price: f64) -> Result<Fill, BrokerError>;

    /// Closes the full remaining quantity of `symbol`'s open position at
    /// `exit_price`; returns the realized P&L net of commission.
    fn close_position(&mut self, symbol: &str, exit_price: f64) -> Result<f64, BrokerError>;

    fn balance(&self) -> f64;
}
