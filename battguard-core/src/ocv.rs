//! Open-Circuit-Voltage Model
//!
//! ## Overview
//!
//! Relates state of charge to the voltage a resting cell would show. The
//! curve is a closed-form fit over SOC in percent, `x = soc / 100`:
//!
//! ```text
//! ocv(x) = E0 + K1·ln(x) + K2·ln(1 - x) - K3/x - K4·x
//! ```
//!
//! The logarithmic and reciprocal terms diverge at 0% and 100%. Below 2%
//! and above 98% the curve is continued linearly from the splice point with
//! the analytic slope there, so it stays continuous and its derivative stays
//! finite everywhere.
//!
//! ## Inversion
//!
//! [`OcvCurve::ocv_to_soc`] inverts the curve with Newton-Raphson from a 90%
//! guess. Iterations are capped; a non-converging inversion returns a fixed
//! 50% instead of an error so the caller's tick always completes.

use libm::{fabsf, logf};

use crate::constants::ocv::{
    NEWTON_INITIAL_GUESS_PCT, NEWTON_MAX_ITERATIONS, NEWTON_TOLERANCE_PCT, SOC_FALLBACK_PCT,
    SOC_SPLICE_HIGH_PCT, SOC_SPLICE_LOW_PCT,
};

/// Fitted coefficients of the per-cell OCV curve
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OcvCurve {
    /// Constant term (V)
    pub e0: f32,
    /// Weight of `ln(x)`
    pub k1: f32,
    /// Weight of `ln(1 - x)`
    pub k2: f32,
    /// Weight of `1/x` (subtracted)
    pub k3: f32,
    /// Weight of `x` (subtracted)
    pub k4: f32,
}

/// Result of an OCV inversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SocInversion {
    /// State of charge (%). [`SOC_FALLBACK_PCT`] when not converged.
    pub soc_pct: f32,
    /// Newton-Raphson iterations spent
    pub iterations: u32,
    /// False if the iteration cap was hit or an iterate went non-finite
    pub converged: bool,
}

impl Default for OcvCurve {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl OcvCurve {
    /// Curve fitted on the bench discharge logs of the reference LiPo packs
    pub const DEFAULT: Self = Self {
        e0: 2.5632,
        k1: -0.9267,
        k2: -0.0146,
        k3: 0.1400,
        k4: -1.6944,
    };

    /// Raw analytic curve, valid strictly inside (0, 100)
    pub fn model(&self, soc_pct: f32) -> f32 {
        let x = soc_pct / 100.0;
        self.e0 + self.k1 * logf(x) + self.k2 * logf(1.0 - x) - self.k3 / x - self.k4 * x
    }

    /// Analytic derivative of [`Self::model`] (V per % SOC)
    pub fn model_slope(&self, soc_pct: f32) -> f32 {
        let x = soc_pct / 100.0;
        (self.k1 / x - self.k2 / (1.0 - x) + self.k3 / (x * x) - self.k4) / 100.0
    }

    /// Per-cell open-circuit voltage at `soc_pct`
    ///
    /// Linear outside [2, 98].
    pub fn soc_to_ocv(&self, soc_pct: f32) -> f32 {
        if soc_pct > SOC_SPLICE_HIGH_PCT {
            self.model(SOC_SPLICE_HIGH_PCT) + self.slope(soc_pct) * (soc_pct - SOC_SPLICE_HIGH_PCT)
        } else if soc_pct < SOC_SPLICE_LOW_PCT {
            self.model(SOC_SPLICE_LOW_PCT) + self.slope(soc_pct) * (soc_pct - SOC_SPLICE_LOW_PCT)
        } else {
            self.model(soc_pct)
        }
    }

    /// Slope of [`Self::soc_to_ocv`] (V per % SOC)
    pub fn slope(&self, soc_pct: f32) -> f32 {
        let clamped = soc_pct.clamp(SOC_SPLICE_LOW_PCT, SOC_SPLICE_HIGH_PCT);
        self.model_slope(clamped)
    }

    /// Invert the curve, reporting convergence
    pub fn invert(&self, ocv: f32) -> SocInversion {
        let mut soc = NEWTON_INITIAL_GUESS_PCT;

        for iteration in 1..=NEWTON_MAX_ITERATIONS {
            let next = soc - (self.soc_to_ocv(soc) - ocv) / self.slope(soc);

            if !next.is_finite() {
                break;
            }

            if fabsf(next - soc) < NEWTON_TOLERANCE_PCT {
                return SocInversion {
                    soc_pct: next,
                    iterations: iteration,
                    converged: true,
                };
            }
            soc = next;
        }

        SocInversion {
            soc_pct: SOC_FALLBACK_PCT,
            iterations: NEWTON_MAX_ITERATIONS,
            converged: false,
        }
    }

    /// State of charge (%) whose open-circuit voltage is `ocv`
    ///
    /// Falls back to 50% if Newton-Raphson does not converge.
    pub fn ocv_to_soc(&self, ocv: f32) -> f32 {
        self.invert(ocv).soc_pct
    }
}
