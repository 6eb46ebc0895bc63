//! Criterion benchmarks for killzone hot paths.
//!
//! Benchmarks:
//! 1. Structure detection (swings + imbalance zones over a long series)
//! 2. Full scan (bias, session scans, assembly)
//! 3. Scan + simulation + statistics

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use killzone_core::config::StrategyConfig;
use killzone_core::domain::{Candle, CandleSeries};
use killzone_core::pipeline::Pipeline;
use killzone_core::structure::{detect_imbalances, detect_swings};

// ── Helpers ──────────────────────────────────────────────────────────

/// Deterministic oscillating 15-minute series, `days` days long.
fn make_candles(days: usize) -> Vec<Candle> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..days * 96)
        .map(|i| {
            let x = i as f64;
            let open = 1900.0 + (x * 0.07).sin() * 40.0 + (x * 0.013).cos() * 25.0;
            let close = open + (x * 0.31).sin() * 4.0;
            let high = open.max(close) + 1.5 + (x * 0.5).sin().abs();
            let low = open.min(close) - 1.5 - (x * 0.7).cos().abs();
            Candle::new(base + Duration::minutes(15 * i as i64), open, high, low, close)
        })
        .collect()
}

fn bench_config() -> StrategyConfig {
    StrategyConfig {
        min_dominant_move: 10.0,
        min_impulse_move: 15.0,
        ..Default::default()
    }
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_structure(c: &mut Criterion) {
    let candles = make_candles(250);
    c.bench_function("structure/swings_and_zones_250d", |b| {
        b.iter(|| {
            let swings = detect_swings(black_box(&candles), 2);
            let zones = detect_imbalances(black_box(&candles));
            (swings.len(), zones.len())
        })
    });
}

fn bench_scan(c: &mut Criterion) {
    let pipeline = Pipeline::new(bench_config()).unwrap();
    let mut group = c.benchmark_group("pipeline/scan");
    for days in [20usize, 250, 1000] {
        let series = CandleSeries::new("BENCH", make_candles(days)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(days), &series, |b, s| {
            b.iter(|| pipeline.scan(black_box(s)))
        });
    }
    group.finish();
}

fn bench_backtest(c: &mut Criterion) {
    let pipeline = Pipeline::new(bench_config()).unwrap();
    let series = CandleSeries::new("BENCH", make_candles(250)).unwrap();
    c.bench_function("pipeline/backtest_250d", |b| {
        b.iter(|| pipeline.backtest(black_box(&series)))
    });
}

criterion_group!(benches, bench_structure, bench_scan, bench_backtest);
criterion_main!(benches);
