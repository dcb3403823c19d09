//! Serializable backtest configuration — TOML on disk, `BacktestConfig` in memory.
//!
//! Mirrors the shape of a `RunConfig`: one symbol/interval pair, one
//! strategy binding (name + flat numeric params, matching `Strategy::params`
//! /`set_params`), a `RiskConfig`, a `PaperBrokerConfig`, and the initial
//! balance. There is exactly one strategy implementation in this crate
//! (`atr_trend`); `strategy.name` is validated against it at load time
//! rather than threaded through a factory registry.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use emberfx_core::broker::PaperBrokerConfig;
use emberfx_core::domain::Interval;
use emberfx_core::risk::RiskConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown strategy '{0}' (only 'atr_trend' is built in)")]
    UnknownStrategy(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyBinding {
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub symbol: String,
    pub interval: Interval,
    pub initial_balance: f64,
    pub strategy: StrategyBinding,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub broker: PaperBrokerConfig,
}

impl BacktestConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: BacktestConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.strategy.name != "atr_trend" {
            return Err(ConfigError::UnknownStrategy(self.strategy.name.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_toml() -> &'static str {
        r#"
symbol = "EURUSD"
interval = "H1"
initial_balance = 10000.0

[strategy]
name = "atr_trend"
params = { fast_period = 8.0, slow_period = 21.0, atr_period = 14.0 }

[risk]
base_risk_fraction = 0.01
max_risk_fraction = 0.03
daily_loss_cap_fraction = 0.05
max_drawdown_fraction = 0.2
drawdown_recovery_fraction = 0.1
kelly_scale = 0.25
volatility_target = 0.01
min_trade_notional = 10.0
max_trade_notional = 5000.0

[broker]
commission_bps = 1.5
commission_fixed = 0.0
"#
    }

    #[test]
    fn parses_well_formed_config() {
        let config = BacktestConfig::from_toml_str(sample_toml()).unwrap();
        assert_eq!(config.symbol, "EURUSD");
        assert_eq!(config.interval, Interval::H1);
        assert_eq!(config.strategy.name, "atr_trend");
        assert_eq!(config.strategy.params.get("fast_period"), Some(&8.0));
        assert_eq!(config.risk.max_trade_notional, 5000.0);
        assert_eq!(config.broker.commission_bps, 1.5);
    }

    #[test]
    fn risk_and_broker_default_when_omitted() {
        let text = r#"
symbol = "EURUSD"
interval = "D1"
initial_balance = 5000.0

[strategy]
name = "atr_trend"
"#;
        let config = BacktestConfig::from_toml_str(text).unwrap();
        assert_eq!(config.risk.base_risk_fraction, RiskConfig::default().base_risk_fraction);
        assert_eq!(config.broker.commission_bps, 0.0);
        assert!(config.strategy.params.is_empty());
    }

    #[test]
    fn unknown_strategy_name_is_rejected() {
        let text = r#"
symbol = "EURUSD"
interval = "D1"
initial_balance = 5000.0

[strategy]
name = "bollinger_breakout"
"#;
        let err = BacktestConfig::from_toml_str(text).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownStrategy(_)));
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let err = BacktestConfig::from_toml_str("not valid toml {{{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
