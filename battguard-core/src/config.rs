//! Battery configuration
//!
//! Parameters come from the autopilot's parameter store. The estimator
//! takes them as one immutable value; the caller refreshes it between
//! updates through [`crate::BatteryEstimator::set_config`], which validates
//! before swapping.

use crate::{
    calibration::CalibrationProfile,
    errors::{ConfigError, ConfigResult},
};

/// How the reported remaining fraction is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RemainingPolicy {
    /// Capacity based fraction when capacity is known, voltage based otherwise
    #[default]
    CapacityPreferred,
    /// Lower of the voltage and capacity fractions when capacity is known
    Minimum,
    /// EKF state of charge, once the filter is initialised
    ///
    /// Also reports the EKF standard deviation as `remaining_error`.
    Ekf,
}

/// Battery parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BatteryConfig {
    /// Empty cell voltage (V)
    pub v_empty: f32,
    /// Full cell voltage (V)
    pub v_full: f32,
    /// Number of cells in series
    pub n_cells: u8,
    /// Pack capacity (mAh), non-positive if unknown
    pub capacity_mah: f32,
    /// Voltage drop per cell under full load (V)
    pub v_load_drop: f32,
    /// Internal resistance per cell (Ω), negative if unknown
    pub r_internal: f32,
    /// Remaining fraction below which the LOW warning is raised
    pub low_thr: f32,
    /// Remaining fraction below which the CRITICAL warning is raised
    pub crit_thr: f32,
    /// Remaining fraction below which the EMERGENCY warning is raised
    pub emergency_thr: f32,
    /// Remaining fraction selection
    pub remaining_policy: RemainingPolicy,
    /// Fitted model constants
    pub calibration: CalibrationProfile,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            v_empty: 3.4,
            v_full: 4.2,
            n_cells: 3,
            capacity_mah: -1.0,
            v_load_drop: 0.3,
            r_internal: -1.0,
            low_thr: 0.15,
            crit_thr: 0.07,
            emergency_thr: 0.05,
            remaining_policy: RemainingPolicy::CapacityPreferred,
            calibration: CalibrationProfile::default(),
        }
    }
}

impl BatteryConfig {
    /// Set empty and full cell voltages
    pub fn with_cell_voltages(mut self, empty: f32, full: f32) -> Self {
        self.v_empty = empty;
        self.v_full = full;
        self
    }

    /// Set number of cells
    pub fn with_cells(mut self, cells: u8) -> Self {
        self.n_cells = cells;
        self
    }

    /// Set pack capacity (mAh)
    pub fn with_capacity_mah(mut self, capacity: f32) -> Self {
        self.capacity_mah = capacity;
        self
    }

    /// Set load drop per cell (V)
    pub fn with_load_drop(mut self, drop: f32) -> Self {
        self.v_load_drop = drop;
        self
    }

    /// Set internal resistance per cell (Ω), negative for unknown
    pub fn with_internal_resistance(mut self, ohms: f32) -> Self {
        self.r_internal = ohms;
        self
    }

    /// Set LOW, CRITICAL and EMERGENCY thresholds
    pub fn with_thresholds(mut self, low: f32, critical: f32, emergency: f32) -> Self {
        self.low_thr = low;
        self.crit_thr = critical;
        self.emergency_thr = emergency;
        self
    }

    /// Set remaining fraction policy
    pub fn with_remaining_policy(mut self, policy: RemainingPolicy) -> Self {
        self.remaining_policy = policy;
        self
    }

    /// Set calibration profile
    pub fn with_calibration(mut self, calibration: CalibrationProfile) -> Self {
        self.calibration = calibration;
        self
    }

    /// Number of cells
    pub fn cell_count(&self) -> u8 {
        self.n_cells
    }

    /// Empty cell voltage (V)
    pub fn empty_cell_voltage(&self) -> f32 {
        self.v_empty
    }

    /// Full cell voltage (V)
    pub fn full_cell_voltage(&self) -> f32 {
        self.v_full
    }

    /// Full minus empty cell voltage (V)
    pub fn voltage_range(&self) -> f32 {
        self.v_full - self.v_empty
    }

    /// True if capacity based estimation is possible
    pub fn capacity_known(&self) -> bool {
        self.capacity_mah > 0.0
    }

    /// True if the internal resistance parameter is set
    pub fn resistance_known(&self) -> bool {
        self.r_internal >= 0.0
    }

    /// Check the parameter set before handing it to an estimator
    pub fn validate(&self) -> ConfigResult<()> {
        let finite = [
            ("v_empty", self.v_empty),
            ("v_full", self.v_full),
            ("capacity", self.capacity_mah),
            ("v_load_drop", self.v_load_drop),
            ("r_internal", self.r_internal),
            ("low_thr", self.low_thr),
            ("crit_thr", self.crit_thr),
            ("emergency_thr", self.emergency_thr),
        ];
        for (param, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { param });
            }
        }

        if self.n_cells == 0 {
            return Err(ConfigError::InvalidCellCount { cells: self.n_cells });
        }

        if self.v_empty <= 0.0 || self.v_full <= self.v_empty {
            return Err(ConfigError::InvalidVoltageRange {
                empty: self.v_empty,
                full: self.v_full,
            });
        }

        let thresholds = [
            ("low_thr", self.low_thr),
            ("crit_thr", self.crit_thr),
            ("emergency_thr", self.emergency_thr),
        ];
        for (param, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { param, value });
            }
        }

        if self.emergency_thr > self.crit_thr {
            return Err(ConfigError::ThresholdOrder {
                lower: self.emergency_thr,
                upper: self.crit_thr,
            });
        }
        if self.crit_thr > self.low_thr {
            return Err(ConfigError::ThresholdOrder {
                lower: self.crit_thr,
                upper: self.low_thr,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = BatteryConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.capacity_known());
        assert!(!config.resistance_known());
        assert_eq!(config.cell_count(), 3);
        assert!((config.voltage_range() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn rejects_zero_cells() {
        let config = BatteryConfig::default().with_cells(0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidCellCount { cells: 0 })
        );
    }

    #[test]
    fn rejects_inverted_voltage_range() {
        let config = BatteryConfig::default().with_cell_voltages(4.2, 3.5);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidVoltageRange { .. })
        ));
    }

    #[test]
    fn rejects_bad_thresholds() {
        let config = BatteryConfig::default().with_thresholds(1.5, 0.1, 0.05);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOutOfRange { param: "low_thr", .. })
        ));

        let config = BatteryConfig::default().with_thresholds(0.2, 0.05, 0.1);
        assert_eq!(
            config.validate(),
            Err(ConfigError::ThresholdOrder { lower: 0.1, upper: 0.05 })
        );
    }

    #[test]
    fn rejects_nan() {
        let config = BatteryConfig::default().with_load_drop(f32::NAN);
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonFinite { param: "v_load_drop" })
        );
    }
}
