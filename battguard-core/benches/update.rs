//! Cost of one estimator update
//!
//! The update runs inside the control-loop tick, so both the cheap cycles
//! (EKF holding) and the correction cycles matter.

use battguard_core::{
    current::MOTOR_COUNT, step, BatteryConfig, BatteryEstimator, BatteryInputs, BatteryStatus,
    EstimatorState, OcvCurve,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn config() -> BatteryConfig {
    BatteryConfig::default()
        .with_cell_voltages(3.5, 4.2)
        .with_cells(4)
        .with_capacity_mah(5000.0)
}

fn inputs(timestamp_us: u64, voltage_v: f32, armed: bool) -> BatteryInputs {
    BatteryInputs {
        timestamp_us,
        voltage_v,
        connected: true,
        throttle: 0.6,
        motor_outputs: [0.6; MOTOR_COUNT],
        armed,
        ..Default::default()
    }
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");

    // 100 Hz: a correction roughly every 50 calls
    group.bench_function("armed_100hz", |b| {
        let mut estimator = BatteryEstimator::new(config()).unwrap();
        let mut status = BatteryStatus::default();
        let mut t = 1_000_000u64;
        b.iter(|| {
            t += 10_000;
            estimator.update(black_box(&inputs(t, 15.8, true)), &mut status);
            black_box(status.remaining)
        })
    });

    // 2 Hz: every call corrects
    group.bench_function("armed_correcting", |b| {
        let mut estimator = BatteryEstimator::new(config()).unwrap();
        let mut status = BatteryStatus::default();
        let mut t = 1_000_000u64;
        b.iter(|| {
            t += 510_000;
            estimator.update(black_box(&inputs(t, 15.8, true)), &mut status);
            black_box(status.remaining)
        })
    });

    // Disarmed: OCV inversion every call
    group.bench_function("disarmed_recalibrating", |b| {
        let mut estimator = BatteryEstimator::new(config()).unwrap();
        let mut status = BatteryStatus::default();
        let mut t = 1_000_000u64;
        b.iter(|| {
            t += 10_000;
            estimator.update(black_box(&inputs(t, 16.2, false)), &mut status);
            black_box(status.discharged_mah)
        })
    });

    group.bench_function("pure_step", |b| {
        let config = config();
        let state = EstimatorState::new();
        let input = inputs(1_000_000, 15.8, true);
        b.iter(|| step(black_box(&state), &config, black_box(&input)))
    });

    group.finish();
}

fn bench_ocv_inversion(c: &mut Criterion) {
    let curve = OcvCurve::DEFAULT;
    c.bench_function("ocv_inversion", |b| {
        b.iter(|| curve.invert(black_box(3.72)))
    });
}

criterion_group!(benches, bench_update, bench_ocv_inversion);
criterion_main!(benches);
