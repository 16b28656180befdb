//! Remaining-charge estimation
//!
//! ## Voltage Based
//!
//! The filtered pack voltage is placed within `[n·v_empty, n·v_full]`. The
//! empty end is lowered by the expected sag under load, from the internal
//! resistance when it is known:
//!
//! ```text
//! v_empty' = v_empty - I·R
//! ```
//!
//! and otherwise from the configured load drop scaled by throttle, assuming
//! a 10% share of the drop with motors idle and none while disarmed:
//!
//! ```text
//! v_empty' = v_empty - v_load_drop · (|thr| + 0.1) / 1.1
//! ```
//!
//! The full-to-empty span stays the same under load, since the sag applies
//! to both ends.
//!
//! ## Capacity Based
//!
//! `1 - discharged / capacity`. While disarmed the pack is resting, so the
//! discharged charge is re-derived every update from the OCV inversion of
//! the measured cell voltage, wiping out coulomb-counting drift.
//!
//! Both fractions are smoothed with a slow exponential filter and clamped to
//! [0, 1]. [`RemainingPolicy`] decides which one is reported.

use libm::fabsf;

use crate::{
    config::{BatteryConfig, RemainingPolicy},
    constants::{filters::REMAINING_FILTER_WEIGHT, limits::IDLE_LOAD_SHARE},
    coulomb::CoulombCounter,
    current::is_valid_current,
    ekf::EquivalentCircuitEkf,
    filters::blend,
    ocv::SocInversion,
};

/// Measurements the remaining estimate needs for one update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemainingInputs {
    /// Filtered pack voltage (V)
    pub filtered_voltage_v: f32,
    /// Latest measured pack voltage (V), used for the resting recalibration
    pub measured_voltage_v: f32,
    /// Estimated pack current (A), `-1` if invalid
    pub current_a: f32,
    /// Normalised collective throttle
    pub throttle: f32,
    /// Vehicle armed
    pub armed: bool,
}

/// Smoothed remaining-charge fractions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemainingEstimator {
    by_voltage: f32,
    by_capacity: f32,
    remaining: f32,
    remaining_error: f32,
}

impl Default for RemainingEstimator {
    fn default() -> Self {
        Self {
            by_voltage: 1.0,
            by_capacity: 1.0,
            remaining: 1.0,
            remaining_error: 0.0,
        }
    }
}

impl RemainingEstimator {
    /// Full battery, no uncertainty
    pub fn new() -> Self {
        Self::default()
    }

    /// Update all fractions
    ///
    /// Recalibrates `counter` while disarmed and returns the inversion used
    /// for it.
    pub fn update(
        &mut self,
        config: &BatteryConfig,
        inputs: &RemainingInputs,
        counter: &mut CoulombCounter,
        ekf: &EquivalentCircuitEkf,
    ) -> Option<SocInversion> {
        let cells = f32::from(config.n_cells);

        let sag = if config.resistance_known() {
            let current = if is_valid_current(inputs.current_a) { inputs.current_a } else { 0.0 };
            current * config.r_internal
        } else {
            config.v_load_drop * load_fraction(inputs.throttle, inputs.armed)
        };
        let empty_dynamic = config.v_empty - sag;

        let by_voltage = (inputs.filtered_voltage_v - cells * empty_dynamic)
            / (cells * config.voltage_range());
        self.by_voltage = smooth_fraction(self.by_voltage, by_voltage);

        let recalibration = if !inputs.armed && config.capacity_known() {
            let inversion = config
                .calibration
                .ocv
                .invert(inputs.measured_voltage_v / cells);
            let soc = inversion.soc_pct.clamp(0.0, 100.0);
            counter.recalibrate(config.capacity_mah * (100.0 - soc) / 100.0);
            Some(inversion)
        } else {
            None
        };

        let by_capacity = 1.0 - counter.discharged_mah() / config.capacity_mah;
        self.by_capacity = smooth_fraction(self.by_capacity, by_capacity);

        let preferred = if config.capacity_known() {
            self.by_capacity
        } else {
            self.by_voltage
        };

        self.remaining_error = 0.0;
        self.remaining = match config.remaining_policy {
            RemainingPolicy::CapacityPreferred => preferred,
            RemainingPolicy::Minimum => preferred.min(self.by_voltage),
            RemainingPolicy::Ekf => match (ekf.soc_pct(), ekf.soc_std_pct()) {
                (Some(soc), Some(std)) if soc.is_finite() && std.is_finite() => {
                    self.remaining_error = std / 100.0;
                    (soc / 100.0).clamp(0.0, 1.0)
                }
                _ => preferred,
            },
        };

        recalibration
    }

    /// Smoothed voltage based fraction
    pub fn by_voltage(&self) -> f32 {
        self.by_voltage
    }

    /// Smoothed capacity based fraction
    pub fn by_capacity(&self) -> f32 {
        self.by_capacity
    }

    /// Reported fraction
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Uncertainty of the reported fraction, 0 unless the EKF drives it
    pub fn remaining_error(&self) -> f32 {
        self.remaining_error
    }
}

/// Share of the configured load drop expected at `throttle`
pub fn load_fraction(throttle: f32, armed: bool) -> f32 {
    if armed {
        (fabsf(throttle) + IDLE_LOAD_SHARE) / (1.0 + IDLE_LOAD_SHARE)
    } else {
        0.0
    }
}

/// Smooth towards `sample`, keep the previous value if non-finite, clamp to [0, 1]
fn smooth_fraction(prev: f32, sample: f32) -> f32 {
    let next = blend(prev, sample, REMAINING_FILTER_WEIGHT);
    let value = if next.is_finite() { next } else { prev };
    value.clamp(0.0, 1.0)
}
