//! Battery state estimation for flight controllers
//!
//! Estimates remaining usable charge from noisy terminal voltage and motor
//! commands, raises graduated low-charge warnings and derives a thrust
//! compensation factor for voltage sag. There is no trusted current sensor:
//! current draw is predicted from the motor outputs.
//!
//! Key constraints:
//! - Runs inside a single control-loop tick
//! - No heap allocation, no blocking, bounded loops only
//! - `no_std` capable (all math through `libm`)
//!
//! ```no_run
//! use battguard_core::{BatteryConfig, BatteryEstimator, BatteryInputs, BatteryStatus};
//!
//! let config = BatteryConfig::default().with_cells(4).with_capacity_mah(5000.0);
//! let mut estimator = BatteryEstimator::new(config).unwrap();
//! let mut status = BatteryStatus::default();
//!
//! let inputs = BatteryInputs {
//!     timestamp_us: 1_000_000,
//!     voltage_v: 16.4,
//!     motor_outputs: [0.2; 4],
//!     connected: true,
//!     armed: true,
//!     ..Default::default()
//! };
//! estimator.update(&inputs, &mut status);
//!
//! if status.warning >= battguard_core::WarningLevel::Critical {
//!     // trigger failsafe
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod calibration;
pub mod config;
pub mod constants;
pub mod coulomb;
pub mod current;
pub mod ekf;
pub mod errors;
pub mod estimator;
pub mod filters;
pub mod matrix;
pub mod ocv;
pub mod remaining;
pub mod scale;
pub mod status;
pub mod time;
pub mod warning;

// Public API
pub use calibration::{CalibrationProfile, CircuitFit};
pub use config::{BatteryConfig, RemainingPolicy};
pub use current::{CurrentModel, CurrentSource, MotorCurrentPolynomial};
pub use ekf::EquivalentCircuitEkf;
pub use errors::{ConfigError, ConfigResult};
pub use estimator::{step, BatteryEstimator, BatteryInputs, EstimatorState};
pub use ocv::OcvCurve;
pub use status::BatteryStatus;
pub use warning::WarningLevel;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
