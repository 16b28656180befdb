//! Common test utilities for integration tests
//!
//! - Flight profile generator producing estimator inputs
//! - Deterministic noise source
//! - Runner collecting the status record of every cycle

#![allow(dead_code)]

use battguard_core::{
    current::MOTOR_COUNT, time::Timestamp, BatteryConfig, BatteryEstimator, BatteryInputs,
    BatteryStatus, WarningLevel,
};

/// One second in timestamp units
pub const SECOND_US: Timestamp = 1_000_000;

/// 4S 5000 mAh pack with 0.2 / 0.1 / 0.05 warning thresholds
pub fn scenario_config() -> BatteryConfig {
    BatteryConfig::default()
        .with_cell_voltages(3.5, 4.2)
        .with_cells(4)
        .with_capacity_mah(5000.0)
        .with_thresholds(0.2, 0.1, 0.05)
}

/// Xorshift noise source
pub struct TestRng {
    state: u32,
}

impl TestRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        self.state
    }

    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / 16_777_216.0
    }

    pub fn gen_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }
}

/// Synthetic flight: pack voltage ramps linearly under constant motor load
#[derive(Debug, Clone)]
pub struct FlightProfile {
    /// First timestamp, non-zero
    pub start_us: Timestamp,
    /// Update period
    pub period_us: u64,
    /// Number of updates
    pub cycles: usize,
    /// Pack voltage at the first update (V)
    pub voltage_start: f32,
    /// Pack voltage at the last update (V)
    pub voltage_end: f32,
    /// Output applied to every motor
    pub motor_output: f32,
    /// Every n-th cycle the voltage ticks up by `uptick_v`, 0 to disable
    pub uptick_every: usize,
    /// Size of the upward ticks (V)
    pub uptick_v: f32,
    /// Peak-to-peak measurement noise (V)
    pub noise_v: f32,
    pub armed: bool,
    pub connected: bool,
}

impl Default for FlightProfile {
    fn default() -> Self {
        Self {
            start_us: SECOND_US,
            period_us: SECOND_US / 10,
            cycles: 100,
            voltage_start: 16.8,
            voltage_end: 16.8,
            motor_output: 0.5,
            uptick_every: 0,
            uptick_v: 0.0,
            noise_v: 0.0,
            armed: true,
            connected: true,
        }
    }
}

impl FlightProfile {
    /// Full-throttle discharge from `start` to `end` volts
    pub fn linear_discharge(cycles: usize, start: f32, end: f32) -> Self {
        Self {
            cycles,
            voltage_start: start,
            voltage_end: end,
            motor_output: 1.0,
            ..Self::default()
        }
    }

    /// Timestamp of cycle `i`
    pub fn timestamp(&self, i: usize) -> Timestamp {
        self.start_us + i as u64 * self.period_us
    }

    /// Generate the input of every cycle
    pub fn inputs(&self) -> Vec<BatteryInputs> {
        let mut rng = TestRng::new(0x5eed);
        let span = (self.cycles.max(2) - 1) as f32;

        (0..self.cycles)
            .map(|i| {
                let progress = i as f32 / span;
                let mut voltage =
                    self.voltage_start + (self.voltage_end - self.voltage_start) * progress;
                if self.uptick_every > 0 && i > 0 && i % self.uptick_every == 0 {
                    voltage += self.uptick_v;
                }
                if self.noise_v > 0.0 {
                    voltage += rng.gen_range(-self.noise_v / 2.0, self.noise_v / 2.0);
                }

                BatteryInputs {
                    timestamp_us: self.timestamp(i),
                    voltage_v: voltage,
                    connected: self.connected,
                    selected_source: true,
                    priority: 1,
                    throttle: self.motor_output,
                    motor_outputs: [self.motor_output; MOTOR_COUNT],
                    armed: self.armed,
                    ..Default::default()
                }
            })
            .collect()
    }
}

/// Run `inputs` through `estimator`, returning every record
pub fn run(estimator: &mut BatteryEstimator, inputs: &[BatteryInputs]) -> Vec<BatteryStatus> {
    inputs
        .iter()
        .map(|input| {
            let mut status = BatteryStatus::default();
            estimator.update(input, &mut status);
            status
        })
        .collect()
}

/// Warning levels in the order they were first reported
pub fn warning_transitions(records: &[BatteryStatus]) -> Vec<WarningLevel> {
    let mut levels = vec![WarningLevel::None];
    for record in records {
        if levels.last() != Some(&record.warning) {
            levels.push(record.warning);
        }
    }
    levels
}
