//! Criterion benchmarks for EmberFX hot paths.
//!
//! Benchmarks:
//! 1. Full engine run (bar loop, strategy calls, risk sizing, trade manager)
//! 2. Indicator computation (SMA, ATR) over realistic bar counts
//! 3. Trade manager state machine (sequential `manage()` calls on an open position)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::BTreeMap;

use emberfx_core::broker::{PaperBroker, PaperBrokerConfig};
use emberfx_core::domain::{Bar, Position, Side};
use emberfx_core::engine::Engine;
use emberfx_core::indicators::{Atr, Sma};
use emberfx_core::risk::{RiskConfig, RiskEngine};
use emberfx_core::strategies::AtrTrendStrategy;
use emberfx_core::trade_manager::manage;

fn make_bars(n: usize) -> Vec<Bar> {
    use chrono::{TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 1.10 + (i as f64 * 0.01).sin() * 0.02;
            let open = close - 0.0003;
            let high = close + 0.0015;
            let low = close - 0.0015;
            Bar {
                symbol: "BENCH".to_string(),
                timestamp: base + chrono::Duration::hours(i as i64),
                open,
                high,
                low,
                close,
                volume: 1_000_000,
            }
        })
        .collect()
}

// ── 1. Full Engine Run ──────────────────────────────────────────────

fn bench_engine_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_run");

    for &bar_count in &[252, 1260, 2520] {
        group.bench_with_input(BenchmarkId::new("atr_trend", bar_count), &bar_count, |b, &n| {
            b.iter(|| {
                let risk = RiskEngine::new(RiskConfig::default(), 100_000.0);
                let broker = PaperBroker::new(100_000.0, PaperBrokerConfig::default());
                let mut engine = Engine::new(100_000.0, risk, broker);
                engine.add_strategy("BENCH", Box::new(AtrTrendStrategy::new(8, 21, 14)));

                let mut bars_by_symbol = BTreeMap::new();
                bars_by_symbol.insert("BENCH".to_string(), make_bars(n));

                black_box(engine.run(&bars_by_symbol));
            });
        });
    }

    group.finish();
}

// ── 2. Indicator Computation ─────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");

    for &bar_count in &[252, 1260, 2520] {
        let bars = make_bars(bar_count);

        group.bench_with_input(BenchmarkId::new("sma_20", bar_count), &bar_count, |b, _| {
            let sma = Sma::new(20);
            b.iter(|| black_box(sma.compute(black_box(&bars))));
        });

        group.bench_with_input(BenchmarkId::new("atr_14", bar_count), &bar_count, |b, _| {
            let atr = Atr::new(14);
            b.iter(|| black_box(atr.compute(black_box(&bars))));
        });
    }

    group.finish();
}

// ── 3. Trade Manager State Machine ───────────────────────────────────

fn bench_trade_manager(c: &mut Criterion) {
    let mut group = c.benchmark_group("trade_manager");

    group.bench_function("manage_1260_favorable_ticks", |b| {
        use chrono::{TimeZone, Utc};
        let opened_at = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();

        b.iter(|| {
            let mut pos = Position::open(
                "BENCH",
                Side::Long,
                1_000.0,
                1.1000,
                Some(1.0950),
                Some(1.1150),
                "atr_trend",
                opened_at,
            );
            for i in 0..1_260 {
                let price = 1.1000 + (i as f64) * 0.00001;
                black_box(manage(&mut pos, black_box(price), opened_at));
            }
            black_box(&pos);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_engine_run, bench_indicators, bench_trade_manager);
criterion_main!(benches);
