//! Equivalent-Circuit Extended Kalman Filter
//!
//! ## Overview
//!
//! Tracks state of charge by fitting a reduced-order battery model to the
//! measured terminal voltage. The cell is an ohmic resistance in series with
//! an ideal SOC integrator and three parallel RC branches that approximate
//! the diffusion impedance:
//!
//! ```text
//!        R0      R1‖C1    R2‖C2    R3‖C3
//!   ──┬─/\/\/──┬─/\/\─┬──┬─/\/\─┬──┬─/\/\─┬──
//!  OCV(SOC)    └──||──┘  └──||──┘  └──||──┘
//! ```
//!
//! Branch `i` (1-based) follows the harmonic series of a finite diffusion
//! element:
//!
//! ```text
//! Rᵢ = 8·Rd / ((2i - 1)²·π²)        Cᵢ = Cd / 2
//! ```
//!
//! ## Model
//!
//! State `x = [SOC (%), v₁, v₂, v₃]`, input `u = -I` (discharge negative),
//! fixed step `Ts = 0.5 s`:
//!
//! ```text
//! x⁻ = A·x + B·u_held
//! A  = diag(1, e^(-Ts/R₁C₁), e^(-Ts/R₂C₂), e^(-Ts/R₃C₃))
//! B  = [100·Ts/FCC, Ts/C₁, Ts/C₂, Ts/C₃]ᵀ
//! y  = OCV(SOC) + v₁ + v₂ + v₃ + R0·u
//! H  = [dOCV/dSOC, 1, 1, 1]
//! ```
//!
//! ## Cadence
//!
//! The caller may run at any rate. Elapsed time is accumulated across calls
//! and a correction only runs once more than `Ts` has built up; between
//! corrections the latest input is held and used for the next prediction.
//! An invalid current sample pauses accumulation and clears the time
//! baseline.
//!
//! ## Numerical Stability
//!
//! - The single measurement makes the innovation covariance a scalar, so the
//!   gain is a division, never a matrix inversion
//! - Joseph form covariance update, symmetrised afterwards
//! - A correction producing any non-finite value is discarded whole

use core::f32::consts::PI;

use libm::{expf, sqrtf};

use crate::{
    calibration::CircuitFit,
    constants::ekf::{
        BRANCH_PROCESS_NOISE, DIFFUSION_BRANCHES, EKF_PERIOD_S, EKF_STATES,
        INITIAL_BRANCH_VARIANCE, INITIAL_SOC_VARIANCE, MEASUREMENT_NOISE, SOC_PROCESS_NOISE,
    },
    current::is_valid_current,
    matrix::{
        add, diagonal, identity, is_finite, make_symmetric, matvec, multiply, outer,
        quadratic_form, transpose, SquareMatrix, Vector,
    },
    ocv::{OcvCurve, SocInversion},
    time::{elapsed_s, Timestamp},
};

/// What a call to [`EquivalentCircuitEkf::update`] did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EkfEvent {
    /// Current sample invalid, nothing done
    Skipped,
    /// First valid sample: state seeded from the OCV inversion
    Initialized(SocInversion),
    /// Waiting for the next correction slot
    Held,
    /// Predict and correct ran
    Corrected,
    /// Predict and correct ran but produced non-finite values and were dropped
    Rejected,
}

/// Discretised circuit, derived once from a [`CircuitFit`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscreteCircuit {
    /// Ohmic resistance (Ω)
    pub r0: f32,
    /// Branch resistances (Ω)
    pub branch_r: [f32; DIFFUSION_BRANCHES],
    /// Branch capacitances (F)
    pub branch_c: [f32; DIFFUSION_BRANCHES],
    /// State transition matrix A
    pub transition: SquareMatrix<EKF_STATES>,
    /// Input vector B
    pub input: Vector<EKF_STATES>,
    /// Process noise Q
    pub process_noise: SquareMatrix<EKF_STATES>,
}

impl DiscreteCircuit {
    /// Discretise `fit` at the fixed filter period
    pub fn from_fit(fit: &CircuitFit) -> Self {
        let ts = EKF_PERIOD_S;
        let rd = fit.rd();
        let cd = fit.cd();

        let mut branch_r = [0.0; DIFFUSION_BRANCHES];
        let mut branch_c = [0.0; DIFFUSION_BRANCHES];
        let mut decay = [1.0; EKF_STATES];
        let mut input = [0.0; EKF_STATES];
        let mut noise = [BRANCH_PROCESS_NOISE; EKF_STATES];

        // SOC row: pure integrator
        input[0] = 100.0 * ts / fit.full_charge_capacity_c();
        noise[0] = SOC_PROCESS_NOISE * ts * ts;

        for branch in 0..DIFFUSION_BRANCHES {
            let odd = (2 * branch + 1) as f32;
            let r = 8.0 * rd / (odd * odd * PI * PI);
            let c = cd / 2.0;

            branch_r[branch] = r;
            branch_c[branch] = c;
            decay[branch + 1] = expf(-ts / (r * c));
            input[branch + 1] = ts / c;
        }

        Self {
            r0: fit.r0(),
            branch_r,
            branch_c,
            transition: diagonal(&decay),
            input,
            process_noise: diagonal(&noise),
        }
    }
}

/// Reduced-order equivalent-circuit EKF
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EquivalentCircuitEkf {
    /// Discretised model, `None` until the first valid sample
    circuit: Option<DiscreteCircuit>,
    /// [SOC %, v₁, v₂, v₃]
    state: Vector<EKF_STATES>,
    /// Estimation error covariance
    covariance: SquareMatrix<EKF_STATES>,
    /// Input of the previous call, used by the next prediction
    held_input: f32,
    /// Time accumulated since the last correction (s)
    since_correction_s: f32,
    correction_due: bool,
    /// Timestamp of the previous valid call, 0 if none
    last_timestamp: Timestamp,
    corrections: u32,
}

impl EquivalentCircuitEkf {
    /// Uninitialised filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one call of the filter
    ///
    /// `cell_voltage` is the measured per-cell terminal voltage, `current_a`
    /// the estimated pack current. `fit` is only read on the first valid
    /// sample.
    pub fn update(
        &mut self,
        timestamp: Timestamp,
        cell_voltage: f32,
        current_a: f32,
        fit: &CircuitFit,
        ocv: &OcvCurve,
    ) -> EkfEvent {
        if !is_valid_current(current_a) {
            self.last_timestamp = 0;
            return EkfEvent::Skipped;
        }

        if self.last_timestamp != 0 {
            self.since_correction_s += elapsed_s(timestamp, self.last_timestamp);
        }
        self.last_timestamp = timestamp;

        if self.since_correction_s > EKF_PERIOD_S {
            self.correction_due = true;
            self.since_correction_s = 0.0;
        }

        let input = -current_a;

        let circuit = self.circuit;
        let event = match circuit {
            None => EkfEvent::Initialized(self.initialize(cell_voltage, fit, ocv)),
            Some(circuit) if self.correction_due => {
                self.correction_due = false;
                if self.correct(&circuit, cell_voltage, input, ocv) {
                    self.corrections += 1;
                    EkfEvent::Corrected
                } else {
                    EkfEvent::Rejected
                }
            }
            Some(_) => EkfEvent::Held,
        };

        self.held_input = input;
        event
    }

    fn initialize(&mut self, cell_voltage: f32, fit: &CircuitFit, ocv: &OcvCurve) -> SocInversion {
        let inversion = ocv.invert(cell_voltage);

        self.circuit = Some(DiscreteCircuit::from_fit(fit));
        self.state = [inversion.soc_pct, 0.0, 0.0, 0.0];

        let mut variances = [INITIAL_BRANCH_VARIANCE; EKF_STATES];
        variances[0] = INITIAL_SOC_VARIANCE;
        self.covariance = diagonal(&variances);

        inversion
    }

    /// Predict with the held input, correct against `cell_voltage`
    ///
    /// Returns false and leaves the filter untouched if anything went
    /// non-finite.
    fn correct(&mut self, circuit: &DiscreteCircuit, cell_voltage: f32, input: f32, ocv: &OcvCurve) -> bool {
        // x⁻ = A·x + B·u
        let mut predicted = matvec(&circuit.transition, &self.state);
        for (x, b) in predicted.iter_mut().zip(circuit.input.iter()) {
            *x += b * self.held_input;
        }

        // P⁻ = A·P·Aᵀ + Q
        let a_p = multiply(&circuit.transition, &self.covariance);
        let predicted_cov = add(
            &multiply(&a_p, &transpose(&circuit.transition)),
            &circuit.process_noise,
        );

        // Linearise the terminal voltage around the prediction
        let h = [ocv.slope(predicted[0]), 1.0, 1.0, 1.0];
        let predicted_voltage = ocv.soc_to_ocv(predicted[0])
            + predicted[1..].iter().sum::<f32>()
            + circuit.r0 * input;

        // S = H·P⁻·Hᵀ + R, scalar
        let innovation_cov = quadratic_form(&h, &predicted_cov) + MEASUREMENT_NOISE;

        // K = P⁻·Hᵀ / S
        let mut gain = matvec(&predicted_cov, &h);
        for k in gain.iter_mut() {
            *k /= innovation_cov;
        }

        let innovation = cell_voltage - predicted_voltage;
        let mut corrected = predicted;
        for (x, k) in corrected.iter_mut().zip(gain.iter()) {
            *x += k * innovation;
        }

        // Joseph form: P = (I - K·H)·P⁻·(I - K·H)ᵀ + K·R·Kᵀ
        let mut i_kh = identity::<EKF_STATES>();
        let kh = outer(&gain, &h);
        for i in 0..EKF_STATES {
            for j in 0..EKF_STATES {
                i_kh[i][j] -= kh[i][j];
            }
        }
        let mut krk = outer(&gain, &gain);
        for row in krk.iter_mut() {
            for v in row.iter_mut() {
                *v *= MEASUREMENT_NOISE;
            }
        }
        let mut covariance = add(
            &multiply(&multiply(&i_kh, &predicted_cov), &transpose(&i_kh)),
            &krk,
        );
        make_symmetric(&mut covariance);

        if !corrected.iter().all(|v| v.is_finite()) || !is_finite(&covariance) {
            return false;
        }

        self.state = corrected;
        self.covariance = covariance;
        true
    }

    /// True once the first valid sample has seeded the state
    pub fn is_initialized(&self) -> bool {
        self.circuit.is_some()
    }

    /// Discretised circuit, once initialised
    pub fn circuit(&self) -> Option<&DiscreteCircuit> {
        self.circuit.as_ref()
    }

    /// State of charge (%), unclamped
    pub fn soc_pct(&self) -> Option<f32> {
        self.circuit.map(|_| self.state[0])
    }

    /// Standard deviation of the SOC estimate (%)
    pub fn soc_std_pct(&self) -> Option<f32> {
        self.circuit.map(|_| sqrtf(self.covariance[0][0].max(0.0)))
    }

    /// Full state vector [SOC %, v₁, v₂, v₃]
    pub fn state(&self) -> &Vector<EKF_STATES> {
        &self.state
    }

    /// Error covariance
    pub fn covariance(&self) -> &SquareMatrix<EKF_STATES> {
        &self.covariance
    }

    /// Number of corrections run so far
    pub fn corrections(&self) -> u32 {
        self.corrections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Timestamp = 1_000;
    const T0: Timestamp = 1_000_000;

    fn run(ekf: &mut EquivalentCircuitEkf, t: Timestamp, v: f32, i: f32) -> EkfEvent {
        ekf.update(t, v, i, &CircuitFit::default(), &OcvCurve::DEFAULT)
    }

    #[test]
    fn discretisation_follows_harmonic_series() {
        let fit = CircuitFit::default();
        let circuit = DiscreteCircuit::from_fit(&fit);

        assert!((circuit.branch_r[0] / circuit.branch_r[1] - 9.0).abs() < 1e-3);
        assert!((circuit.branch_r[0] / circuit.branch_r[2] - 25.0).abs() < 1e-2);
        assert_eq!(circuit.branch_c[0], fit.cd() / 2.0);

        // Integrator row, decaying branches
        assert_eq!(circuit.transition[0][0], 1.0);
        for i in 1..EKF_STATES {
            assert!(circuit.transition[i][i] > 0.0 && circuit.transition[i][i] < 1.0);
        }
        // Faster branches decay more per step
        assert!(circuit.transition[3][3] < circuit.transition[1][1]);
        assert!((circuit.input[0] - 100.0 * 0.5 / 9720.0).abs() < 1e-7);
    }

    #[test]
    fn first_valid_sample_initialises_from_ocv() {
        let mut ekf = EquivalentCircuitEkf::new();
        assert!(!ekf.is_initialized());
        assert_eq!(ekf.soc_pct(), None);

        let ocv = OcvCurve::DEFAULT.soc_to_ocv(60.0);
        let event = run(&mut ekf, T0, ocv, 5.0);

        assert!(matches!(event, EkfEvent::Initialized(inv) if inv.converged));
        assert!((ekf.soc_pct().unwrap() - 60.0).abs() < 1e-2);
        assert_eq!(ekf.soc_std_pct(), Some(10.0));
        assert_eq!(ekf.covariance()[1][1], INITIAL_BRANCH_VARIANCE);
    }

    #[test]
    fn invalid_current_skips_and_does_not_initialise() {
        let mut ekf = EquivalentCircuitEkf::new();
        assert_eq!(run(&mut ekf, T0, 3.8, -1.0), EkfEvent::Skipped);
        assert!(!ekf.is_initialized());
    }

    #[test]
    fn corrections_follow_fixed_cadence() {
        let mut ekf = EquivalentCircuitEkf::new();
        let ocv = OcvCurve::DEFAULT.soc_to_ocv(80.0);

        // 100 Hz for 10 s
        for step in 0..1000u64 {
            run(&mut ekf, T0 + step * 10 * MS, ocv, 1.0);
        }
        // Correction when strictly more than 0.5 s has accumulated: every 51 ticks
        let corrections = ekf.corrections();
        assert!((18..=20).contains(&corrections), "{}", corrections);

        // Same span at 10 Hz gives the same cadence
        let mut slow = EquivalentCircuitEkf::new();
        for step in 0..100u64 {
            run(&mut slow, T0 + step * 100 * MS, ocv, 1.0);
        }
        assert!((15..=20).contains(&slow.corrections()), "{}", slow.corrections());
    }

    #[test]
    fn invalid_current_gap_is_not_accumulated() {
        let mut ekf = EquivalentCircuitEkf::new();
        let ocv = OcvCurve::DEFAULT.soc_to_ocv(80.0);

        run(&mut ekf, T0, ocv, 1.0);
        run(&mut ekf, T0 + 100 * MS, ocv, 1.0);
        run(&mut ekf, T0 + 200 * MS, ocv, -1.0);
        // Long gap, only re-baselines
        assert_eq!(run(&mut ekf, T0 + 10_000 * MS, ocv, 1.0), EkfEvent::Held);
        assert_eq!(run(&mut ekf, T0 + 10_100 * MS, ocv, 1.0), EkfEvent::Held);
        assert_eq!(ekf.corrections(), 0);
    }

    #[test]
    fn converges_to_simulated_truth() {
        let fit = CircuitFit::default();
        let curve = OcvCurve::DEFAULT;
        let circuit = DiscreteCircuit::from_fit(&fit);
        let current = 20.0;
        let u = -current;

        // Seed from a voltage that reads 15% too full
        let mut ekf = EquivalentCircuitEkf::new();
        run(&mut ekf, T0, curve.soc_to_ocv(85.0), current);

        // Truth follows the same discrete model; 510 ms calls correct every time
        let mut truth = [70.0, 0.0, 0.0, 0.0];
        for step in 1..=400u64 {
            truth = matvec(&circuit.transition, &truth);
            for (x, b) in truth.iter_mut().zip(circuit.input.iter()) {
                *x += b * u;
            }
            let measured =
                curve.soc_to_ocv(truth[0]) + truth[1..].iter().sum::<f32>() + circuit.r0 * u;
            assert_eq!(run(&mut ekf, T0 + step * 510 * MS, measured, current), EkfEvent::Corrected);
        }

        let soc = ekf.soc_pct().unwrap();
        assert!((soc - truth[0]).abs() < 5.0, "estimate {} truth {}", soc, truth[0]);
        assert!(ekf.soc_std_pct().unwrap() < 10.0);
        assert!(ekf.state()[1] < 0.0, "branch should charge negative under discharge");
    }

    #[test]
    fn covariance_stays_symmetric_and_finite() {
        let mut ekf = EquivalentCircuitEkf::new();
        let curve = OcvCurve::DEFAULT;
        run(&mut ekf, T0, curve.soc_to_ocv(90.0), 10.0);

        for step in 1..=200u64 {
            let v = curve.soc_to_ocv(90.0 - step as f32 * 0.1);
            run(&mut ekf, T0 + step * 600 * MS, v, 10.0);
        }

        let p = ekf.covariance();
        assert!(is_finite(p));
        for i in 0..EKF_STATES {
            assert!(p[i][i] > 0.0);
            for j in 0..EKF_STATES {
                assert_eq!(p[i][j], p[j][i]);
            }
        }
    }

    #[test]
    fn non_finite_voltage_correction_is_rejected() {
        let mut ekf = EquivalentCircuitEkf::new();
        let v = OcvCurve::DEFAULT.soc_to_ocv(80.0);
        run(&mut ekf, T0, v, 1.0);
        let before = *ekf.state();

        assert_eq!(run(&mut ekf, T0 + 600 * MS, f32::NAN, 1.0), EkfEvent::Rejected);
        assert_eq!(*ekf.state(), before);
    }
}
