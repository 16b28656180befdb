//! Constants for battguard
//!
//! Centralised numeric values used by the estimators. Calibration data that
//! belongs to a particular battery or propulsion set lives in
//! [`crate::calibration`] instead, so it can be swapped without touching
//! control flow.
//!
//! ## Organization
//!
//! - **Time**: unit conversions for the microsecond timer
//! - **Filters**: smoothing weights of the exponential filters
//! - **Ocv**: splice points and Newton-Raphson limits of the OCV inversion
//! - **Ekf**: cadence and noise tuning of the equivalent-circuit filter
//! - **Limits**: output clamps and validity floors

/// Time unit conversions.
pub mod time;

/// Exponential filter weights.
pub mod filters;

/// OCV curve splice points and inversion limits.
pub mod ocv;

/// Equivalent-circuit EKF tuning.
pub mod ekf;

/// Output clamps and validity floors.
pub mod limits;

pub use filters::{CURRENT_FILTER_WEIGHT, REMAINING_FILTER_WEIGHT, VOLTAGE_FILTER_WEIGHT};
pub use limits::{MAX_SCALE, MIN_SCALE, VALID_VOLTAGE_FLOOR_V};
pub use ocv::{NEWTON_MAX_ITERATIONS, NEWTON_TOLERANCE_PCT, SOC_FALLBACK_PCT};
