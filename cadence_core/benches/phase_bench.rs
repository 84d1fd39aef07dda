//! Micro-benchmarks for the per-step hot path: phase accumulation and the
//! moving-average update.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use cadence_core::average::{moving_average_alpha, MovingAverage};
use cadence_core::phase::{phase32_update, phase32_update_scaled};

fn bench_phase_update(c: &mut Criterion) {
    c.bench_function("phase32_update", |b| {
        let mut phase = 0u32;
        b.iter(|| {
            black_box(phase32_update(
                &mut phase,
                black_box(0.5),
                black_box(1000.0),
                true,
            ))
        });
    });

    c.bench_function("phase32_update_scaled", |b| {
        let mut phase = 0u32;
        let delta_scale = (1.0f32 / 1000.0) * 2.0f32.powi(32);
        b.iter(|| {
            black_box(phase32_update_scaled(
                &mut phase,
                black_box(2.0),
                black_box(delta_scale),
                true,
            ))
        });
    });
}

fn bench_moving_average(c: &mut Criterion) {
    c.bench_function("moving_average_update", |b| {
        let mut avg = MovingAverage::with_time_window(0.1);
        let mut x = 0.0f32;
        b.iter(|| {
            x += 0.01;
            black_box(avg.update_with_rate(black_box(x.sin()), 1000.0))
        });
    });

    c.bench_function("moving_average_alpha", |b| {
        b.iter(|| {
            black_box(moving_average_alpha(
                black_box(1000.0),
                black_box(0.1),
                black_box(512),
                false,
            ))
        });
    });
}

criterion_group!(benches, bench_phase_update, bench_moving_average);
criterion_main!(benches);
