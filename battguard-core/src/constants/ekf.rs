//! Equivalent-Circuit EKF Tuning
//!
//! Values fitted on bench discharge logs together with the circuit
//! parameters in [`crate::calibration`].

/// Fixed correction period of the filter (s).
///
/// The filter only corrects once this much time has accumulated since the
/// previous correction, whatever rate the caller runs at.
pub const EKF_PERIOD_S: f32 = 0.5;

/// Number of RC branches approximating diffusion impedance.
pub const DIFFUSION_BRANCHES: usize = 3;

/// Size of the state vector: SOC plus one voltage per branch.
pub const EKF_STATES: usize = 1 + DIFFUSION_BRANCHES;

/// Process noise intensity on the SOC state (%²/s²).
///
/// Scaled by `Ts²` when the filter is initialised. Dominates the process
/// noise: most model error ends up in SOC.
pub const SOC_PROCESS_NOISE: f32 = 0.01;

/// Process noise on each branch voltage (V²).
pub const BRANCH_PROCESS_NOISE: f32 = 1.0e-6;

/// Measurement noise on the per-cell terminal voltage (V²).
pub const MEASUREMENT_NOISE: f32 = 0.075;

/// Initial SOC variance (%²).
///
/// Large: the OCV seed is taken under unknown load.
pub const INITIAL_SOC_VARIANCE: f32 = 1.0e2;

/// Initial variance of each branch voltage (V²).
pub const INITIAL_BRANCH_VARIANCE: f32 = 1.0e-4;
