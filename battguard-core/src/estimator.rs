//! Battery Estimator
//!
//! ## Overview
//!
//! Ties the individual estimators together. All mutable state lives in one
//! [`EstimatorState`] value; [`step`] is the pure transition from one state
//! to the next and [`BatteryEstimator`] is a thin owner of config and state
//! for callers that prefer a mutable object.
//!
//! ## Update Order
//!
//! ```text
//! reset record ─▶ filter voltage ─▶ estimate current ─▶ filter current
//!      ─▶ coulomb count ─▶ EKF ─▶ remaining ─▶ warning ─▶ scale
//!      ─▶ populate record if V_filt > 2.1 V
//! ```
//!
//! The measured current input is accepted but not used: current is always
//! taken from the motor outputs through the configured [`CurrentModel`].
//!
//! [`CurrentModel`]: crate::current::CurrentModel

use crate::{
    config::BatteryConfig,
    constants::{
        filters::{CURRENT_FILTER_WEIGHT, VOLTAGE_FILTER_WEIGHT},
        limits::VALID_VOLTAGE_FLOOR_V,
    },
    coulomb::CoulombCounter,
    current::{is_valid_current, MOTOR_COUNT},
    ekf::{EkfEvent, EquivalentCircuitEkf},
    errors::ConfigResult,
    filters::Ema,
    remaining::{RemainingEstimator, RemainingInputs},
    scale::compute_scale,
    status::BatteryStatus,
    time::Timestamp,
    warning::{WarningLevel, WarningState},
};

/// Measurements and vehicle state for one update
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatteryInputs {
    /// Sample time (µs)
    pub timestamp_us: Timestamp,
    /// Measured pack voltage (V)
    pub voltage_v: f32,
    /// Measured pack current (A), ignored
    pub current_a: f32,
    /// Battery connected
    pub connected: bool,
    /// Battery selected as the system source
    pub selected_source: bool,
    /// Source priority
    pub priority: u8,
    /// Normalised collective throttle
    pub throttle: f32,
    /// Normalised motor outputs [0, 1]
    pub motor_outputs: [f32; MOTOR_COUNT],
    /// Vehicle armed
    pub armed: bool,
}

/// Everything the estimator carries between updates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorState {
    voltage: Ema,
    current: Ema,
    coulomb: CoulombCounter,
    ekf: EquivalentCircuitEkf,
    remaining: RemainingEstimator,
    warning: WarningState,
    scale: f32,
}

impl Default for EstimatorState {
    fn default() -> Self {
        Self {
            voltage: Ema::new(VOLTAGE_FILTER_WEIGHT),
            current: Ema::new(CURRENT_FILTER_WEIGHT),
            coulomb: CoulombCounter::new(),
            ekf: EquivalentCircuitEkf::new(),
            remaining: RemainingEstimator::new(),
            warning: WarningState::new(),
            scale: 1.0,
        }
    }
}

impl EstimatorState {
    /// Fresh state: full battery, no warning
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one update, returning the record for it
    pub fn advance(&mut self, config: &BatteryConfig, inputs: &BatteryInputs) -> BatteryStatus {
        let mut status = BatteryStatus::reset(config.n_cells);
        status.timestamp_us = inputs.timestamp_us;

        let voltage_filtered = self.voltage.update(inputs.voltage_v);

        let current = config
            .calibration
            .current
            .estimate(inputs.throttle, &inputs.motor_outputs);
        if is_valid_current(current) {
            self.current.update(current);
        }

        self.coulomb.accumulate(inputs.timestamp_us, current);

        let cells = f32::from(config.n_cells);
        let event = self.ekf.update(
            inputs.timestamp_us,
            inputs.voltage_v / cells,
            current,
            &config.calibration.circuit,
            &config.calibration.ocv,
        );
        match event {
            EkfEvent::Initialized(inversion) => {
                log_debug!("EKF initialised at {}% SOC", inversion.soc_pct);
                if !inversion.converged {
                    log_warn!("EKF seed: OCV inversion did not converge, using {}%", inversion.soc_pct);
                }
            }
            EkfEvent::Rejected => log_debug!("EKF correction produced non-finite values, dropped"),
            _ => {}
        }

        let recalibration = self.remaining.update(
            config,
            &RemainingInputs {
                filtered_voltage_v: voltage_filtered,
                measured_voltage_v: inputs.voltage_v,
                current_a: current,
                throttle: inputs.throttle,
                armed: inputs.armed,
            },
            &mut self.coulomb,
            &self.ekf,
        );
        if let Some(inversion) = recalibration {
            log_trace!("Discharged recalibrated to {} mAh", self.coulomb.discharged_mah());
            if !inversion.converged {
                log_warn!("OCV inversion did not converge, using {}%", inversion.soc_pct);
            }
        }

        let warning = self
            .warning
            .evaluate(self.remaining.remaining(), config, inputs.connected);
        self.scale = compute_scale(config, self.remaining.by_voltage());

        if voltage_filtered > VALID_VOLTAGE_FLOOR_V {
            status.voltage_v = inputs.voltage_v;
            status.voltage_filtered_v = voltage_filtered;
            status.current_a = current;
            status.current_filtered_a = self.current.value_or_sentinel();
            status.discharged_mah = self.coulomb.discharged_mah();
            status.remaining = self.remaining.remaining();
            status.remaining_error = self.remaining.remaining_error();
            status.ekf_remaining = self.ekf_remaining().unwrap_or(0.0);
            status.scale = self.scale;
            status.warning = warning;
            status.connected = inputs.connected;
            status.system_source = inputs.selected_source;
            status.priority = inputs.priority;
        }

        status
    }

    /// Filtered pack voltage (V), if any sample has been seen
    pub fn voltage_filtered(&self) -> Option<f32> {
        self.voltage.value()
    }

    /// Filtered estimated current (A), if any valid estimate has been seen
    pub fn current_filtered(&self) -> Option<f32> {
        self.current.value()
    }

    /// Discharged charge (mAh)
    pub fn discharged_mah(&self) -> f32 {
        self.coulomb.discharged_mah()
    }

    /// Smoothed voltage based remaining fraction
    pub fn remaining_voltage(&self) -> f32 {
        self.remaining.by_voltage()
    }

    /// Smoothed capacity based remaining fraction
    pub fn remaining_capacity(&self) -> f32 {
        self.remaining.by_capacity()
    }

    /// Reported remaining fraction
    pub fn remaining(&self) -> f32 {
        self.remaining.remaining()
    }

    /// EKF state of charge as a fraction in [0, 1], once initialised
    pub fn ekf_remaining(&self) -> Option<f32> {
        self.ekf
            .soc_pct()
            .filter(|soc| soc.is_finite())
            .map(|soc| (soc / 100.0).clamp(0.0, 1.0))
    }

    /// Equivalent-circuit filter
    pub fn ekf(&self) -> &EquivalentCircuitEkf {
        &self.ekf
    }

    /// Latched warning level
    pub fn warning(&self) -> WarningLevel {
        self.warning.level()
    }

    /// Thrust scale factor
    pub fn scale(&self) -> f32 {
        self.scale
    }
}

/// Pure state transition: `(state, inputs) -> (next state, record)`
pub fn step(
    state: &EstimatorState,
    config: &BatteryConfig,
    inputs: &BatteryInputs,
) -> (EstimatorState, BatteryStatus) {
    let mut next = *state;
    let status = next.advance(config, inputs);
    (next, status)
}

/// Battery estimator owning its config and state
#[derive(Debug, Clone)]
pub struct BatteryEstimator {
    config: BatteryConfig,
    state: EstimatorState,
}

impl BatteryEstimator {
    /// Create an estimator for a validated config
    pub fn new(config: BatteryConfig) -> ConfigResult<Self> {
        if let Err(e) = config.validate() {
            log_warn!("Battery config rejected: {}", e);
            return Err(e);
        }
        Ok(Self {
            config,
            state: EstimatorState::new(),
        })
    }

    /// Replace the config between updates
    ///
    /// The estimator state is kept. An invalid config is rejected and the
    /// previous one stays active.
    pub fn set_config(&mut self, config: BatteryConfig) -> ConfigResult<()> {
        if let Err(e) = config.validate() {
            log_warn!("Battery config rejected, keeping previous: {}", e);
            return Err(e);
        }
        self.config = config;
        Ok(())
    }

    /// Run one update and write the record into `status`
    pub fn update(&mut self, inputs: &BatteryInputs, status: &mut BatteryStatus) {
        *status = self.state.advance(&self.config, inputs);
    }

    /// Active config
    pub fn config(&self) -> &BatteryConfig {
        &self.config
    }

    /// Estimator state
    pub fn state(&self) -> &EstimatorState {
        &self.state
    }
}
