//! ATR-banded moving-average crossover.
//!
//! Grounded on the shape of the Python original's `core/strategy.py`
//! (`indicators`/`signal`/`volatility`/`stop_loss`/`take_profit` split)
//! and the workspace's own `indicators::sma`/`indicators::atr` pure
//! functions, generalized from per-column dataframe computation to a
//! bar-slice computation matching the `Strategy` trait (§4.2).
//!
//! Signal: long when the fast SMA crosses above the slow SMA, short on
//! the mirror crossover, flat otherwise. Stop-loss is placed at
//! `entry - atr_stop_mult * ATR` (mirrored for shorts); take-profit at
//! `entry + atr_tp_mult * ATR`.

use std::collections::BTreeMap;

use crate::domain::{Bar, Side};
use crate::indicators::{Atr, Sma};
use crate::strategy::{AnnotatedBar, Strategy};

const FAST_KEY: &str = "sma_fast";
const SLOW_KEY: &str = "sma_slow";
const ATR_KEY: &str = "atr";

pub struct AtrTrendStrategy {
    fast_period: usize,
    slow_period: usize,
    atr_period: usize,
    atr_stop_mult: f64,
    atr_tp_mult: f64,
}

impl AtrTrendStrategy {
    pub fn new(fast_period: usize, slow_period: usize, atr_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            atr_period,
            atr_stop_mult: 2.0,
            atr_tp_mult: 3.0,
        }
    }

    fn latest_atr(&self, bars: &[AnnotatedBar]) -> Option<f64> {
        let v = bars.last()?.indicators.get(ATR_KEY).copied()?;
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }
}

impl Strategy for AtrTrendStrategy {
    fn name(&self) -> &str {
        "atr_trend"
    }

    fn params(&self) -> BTreeMap<String, f64> {
        let mut params = BTreeMap::new();
        params.insert("fast_period".to_string(), self.fast_period as f64);
        params.insert("slow_period".to_string(), self.slow_period as f64);
        params.insert("atr_period".to_string(), self.atr_period as f64);
        params.insert("atr_stop_mult".to_string(), self.atr_stop_mult);
        params.insert("atr_tp_mult".to_string(), self.atr_tp_mult);
        params
    }

    fn set_params(&mut self, params: BTreeMap<String, f64>) {
        if let Some(&v) = params.get("fast_period") {
            self.fast_period = v as usize;
        }
        if let Some(&v) = params.get("slow_period") {
            self.slow_period = v as usize;
        }
        if let Some(&v) = params.get("atr_period") {
            self.atr_period = v as usize;
        }
        if let Some(&v) = params.get("atr_stop_mult") {
            self.atr_stop_mult = v;
        }
        if let Some(&v) = params.get("atr_tp_mult") {
            self.atr_tp_mult = v;
        }
    }

    fn indicators(&self, bars: &[Bar]) -> Vec<AnnotatedBar> {
        let fast = Sma::new(self.fast_period).compute(bars);
        let slow = Sma::new(self.slow_period).compute(bars);
        let atr = Atr::new(self.atr_period).compute(bars);
        bars.iter()
            .cloned()
            .zip(fast)
            .zip(slow)
            .zip(atr)
            .map(|(((bar, f), s), a)| {
                let mut indicators = BTreeMap::new();
                indicators.insert(FAST_KEY.to_string(), f);
                indicators.insert(SLOW_KEY.to_string(), s);
                indicators.insert(ATR_KEY.to_string(), a);
                AnnotatedBar { bar, indicators }
            })
            .collect()
    }

    fn signal(&self, bars: &[AnnotatedBar]) -> i8 {
        if bars.len() < 2 {
            return 0;
        }
        let prev = &bars[bars.len() - 2];
        let last = &bars[bars.len() - 1];
        let (Some(&pf), Some(&ps)) = (prev.indicators.get(FAST_KEY), prev.indicators.get(SLOW_KEY)) else {
            return 0;
        };
        let (Some(&lf), Some(&ls)) = (last.indicators.get(FAST_KEY), last.indicators.get(SLOW_KEY)) else {
            return 0;
        };
        if [pf, ps, lf, ls].iter().any(|v| v.is_nan()) {
            return 0;
        }
        if pf <= ps && lf > ls {
            1
        } else if pf >= ps && lf < ls {
            -1
        } else {
            0
        }
    }

    fn volatility(&self, bars: &[AnnotatedBar]) -> Option<f64> {
        let atr = self.latest_atr(bars)?;
        let price = bars.last()?.bar.close;
        if price <= 0.0 {
            return None;
        }
        Some(atr / price)
    }

    fn stop_loss(&self, bars: &[AnnotatedBar], entry_price: f64, side: Side) -> Option<f64> {
        let atr = self.latest_atr(bars)?;
        Some(entry_price - side.sign() * self.atr_stop_mult * atr)
    }

    fn take_profit(&self, bars: &[AnnotatedBar], entry_price: f64, side: Side) -> Option<f64> {
        let atr = self.latest_atr(bars)?;
        Some(entry_price + side.sign() * self.atr_tp_mult * atr)
    }
}
