//! # EmberFX Runner
//!
//! Orchestration layer on top of `emberfx-core`: TOML configuration,
//! wiring a bar series and the one built-in `Strategy` into an `Engine`
//! run, computing `PerformanceMetrics`, and exporting JSON/CSV artifacts.
//!
//! ## Components
//!
//! - `config`: `BacktestConfig` — TOML-serializable run configuration
//! - `runner`: `run_backtest()` — the single orchestration entry point
//! - `metrics`: `PerformanceMetrics` — pure functions over equity/trades
//! - `export`: JSON/CSV artifact export and import with schema versioning

pub mod config;
pub mod export;
pub mod metrics;
pub mod runner;

pub use config::{BacktestConfig, ConfigError, StrategyBinding};
pub use metrics::PerformanceMetrics;
pub use runner::{run_backtest, BacktestResult, RunError, SCHEMA_VERSION};

/// Installs a `tracing_subscriber::fmt` global subscriber, honoring
/// `RUST_LOG`. Intended for an embedding binary's `main()` — neither this
/// crate nor `emberfx-core` installs a subscriber on their own, since a
/// library that does breaks composability for whatever embeds it.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
