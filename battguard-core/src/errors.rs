//! Error Types for Battery Configuration
//!
//! ## Design Philosophy
//!
//! The estimation path itself never fails: non-finite filter results are
//! dropped, a diverging OCV inversion falls back to a fixed value and an
//! invalid current estimate simply pauses integration. Errors only exist at
//! the configuration boundary, where a bad parameter set must be rejected
//! before it reaches the estimator.
//!
//! Like the rest of the crate the error type is built for embedded targets:
//!
//! 1. **Small Size**: every variant carries at most two `f32` and a name.
//! 2. **No Heap Allocation**: parameter names are `&'static str`.
//! 3. **Copy Semantics**: errors are cheap to return and store.
//!
//! ## Handling Strategy
//!
//! ```rust
//! use battguard_core::{BatteryConfig, BatteryEstimator, ConfigError};
//!
//! let config = BatteryConfig::default().with_cells(0);
//! match BatteryEstimator::new(config) {
//!     Ok(_) => {}
//!     Err(ConfigError::InvalidCellCount { .. }) => {
//!         // keep flying on the previous parameter set
//!     }
//!     Err(_) => {}
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors - kept small for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Parameter is NaN or infinite
    #[error("Parameter {param} is not a finite number")]
    NonFinite {
        /// Name of the offending parameter
        param: &'static str,
    },

    /// Battery must have at least one cell
    #[error("Invalid cell count {cells}")]
    InvalidCellCount {
        /// Configured number of cells
        cells: u8,
    },

    /// Empty voltage must be positive and below full voltage
    #[error("Invalid cell voltage range [{empty}, {full}]")]
    InvalidVoltageRange {
        /// Empty cell voltage (V)
        empty: f32,
        /// Full cell voltage (V)
        full: f32,
    },

    /// Warning threshold outside [0, 1]
    #[error("Threshold {param} = {value} outside [0, 1]")]
    ThresholdOutOfRange {
        /// Name of the offending threshold
        param: &'static str,
        /// Configured value
        value: f32,
    },

    /// Thresholds must satisfy emergency <= critical <= low
    #[error("Warning thresholds out of order: {lower} > {upper}")]
    ThresholdOrder {
        /// The threshold that should be the smaller one
        lower: f32,
        /// The threshold that should be the larger one
        upper: f32,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NonFinite { param } =>
                defmt::write!(fmt, "Parameter {} not finite", param),
            Self::InvalidCellCount { cells } =>
                defmt::write!(fmt, "Invalid cell count {}", cells),
            Self::InvalidVoltageRange { empty, full } =>
                defmt::write!(fmt, "Invalid voltage range [{}, {}]", empty, full),
            Self::ThresholdOutOfRange { param, value } =>
                defmt::write!(fmt, "Threshold {} = {} outside [0, 1]", param, value),
            Self::ThresholdOrder { lower, upper } =>
                defmt::write!(fmt, "Thresholds out of order: {} > {}", lower, upper),
        }
    }
}
