//! OCV Curve Constants
//!
//! The analytic OCV curve contains `ln(x)`, `ln(1 - x)` and `1/x` terms and
//! diverges at both ends of the SOC range. Outside the splice points it is
//! continued as a straight line.

/// Lower splice point of the OCV curve (% SOC).
pub const SOC_SPLICE_LOW_PCT: f32 = 2.0;

/// Upper splice point of the OCV curve (% SOC).
pub const SOC_SPLICE_HIGH_PCT: f32 = 98.0;

/// Initial Newton-Raphson guess for the inversion (% SOC).
///
/// Packs are usually close to full when the inversion first runs.
pub const NEWTON_INITIAL_GUESS_PCT: f32 = 90.0;

/// Convergence tolerance on successive Newton-Raphson iterates (% SOC).
pub const NEWTON_TOLERANCE_PCT: f32 = 1.0e-2;

/// Hard cap on Newton-Raphson iterations.
///
/// Guarantees the inversion terminates inside one control-loop tick.
pub const NEWTON_MAX_ITERATIONS: u32 = 1000;

/// SOC reported when the inversion does not converge (%).
pub const SOC_FALLBACK_PCT: f32 = 50.0;
