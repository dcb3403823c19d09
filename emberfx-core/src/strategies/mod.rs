//! Concrete `Strategy` implementations.
//!
//! Only one strategy lives here: an ATR-banded moving-average crossover,
//! carried as reference material to exercise the `Strategy` trait
//! end-to-end (tests, benches, example config). Concrete strategy
//! research — walk-forward search, robustness ladders, leaderboards — is
//! out of scope; strategies are opaque plugins behind §4.2.

pub mod atr_trend;

pub use atr_trend::AtrTrendStrategy;
