//! Current estimation from motor commands
//!
//! The current sensor on the power brick is not trusted, so current draw is
//! predicted from what the motors were told to do. Each normalised command
//! `m ∈ [-1, 1]` is mapped to the PWM pulse width the ESC sees,
//! `x = 800·m + 800` (µs), and a cubic fitted to bench thrust-stand data
//! gives the motor's current:
//!
//! ```text
//! i(x) = a·x³ + b·x² + c·x + d      for x > 900 µs
//! i(x) = idle current                otherwise
//! ```
//!
//! The per-motor currents are summed. An older formula that applies the
//! cubic to the collective throttle and multiplies by the motor count is
//! kept as [`CurrentSource::Throttle`].

use crate::constants::limits::INVALID_SENTINEL;

/// Number of motors on the airframe
pub const MOTOR_COUNT: usize = 4;

/// Cubic fit of per-motor current (A) against PWM pulse width (µs)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorCurrentPolynomial {
    /// Cubic coefficient
    pub a: f32,
    /// Quadratic coefficient
    pub b: f32,
    /// Linear coefficient
    pub c: f32,
    /// Constant term
    pub d: f32,
}

impl MotorCurrentPolynomial {
    /// Fit "Cx": current propulsion set, doubled-up C fit
    pub const CX: Self = Self {
        a: -6.22186e-9,
        b: 3.2145e-5,
        c: -0.0414685,
        d: 16.8119,
    };

    /// Fit "C": single-motor stand run of the same propulsion set
    pub const C: Self = Self {
        a: -3.11084e-9,
        b: 1.60724e-5,
        c: -0.0207343,
        d: 8.40601,
    };

    /// Evaluate at pulse width `x` (µs), Horner form
    #[inline]
    pub fn eval(&self, x: f32) -> f32 {
        ((self.a * x + self.b) * x + self.c) * x + self.d
    }
}

/// Which command drives the estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CurrentSource {
    /// Sum of the per-motor fits
    #[default]
    PerMotor,
    /// Collective throttle fit times motor count
    Throttle,
}

/// Current model: polynomial plus PWM mapping
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurrentModel {
    /// Formula in use
    pub source: CurrentSource,
    /// Per-motor current fit
    pub polynomial: MotorCurrentPolynomial,
    /// PWM span of the normalised command (µs)
    pub pwm_scale: f32,
    /// PWM value at zero command (µs)
    pub pwm_offset: f32,
    /// Pulse width below which the motor is treated as idle (µs)
    pub idle_pwm: f32,
    /// Current drawn by an idle motor and its ESC (A)
    pub idle_current_a: f32,
}

impl Default for CurrentModel {
    fn default() -> Self {
        Self {
            source: CurrentSource::PerMotor,
            polynomial: MotorCurrentPolynomial::CX,
            pwm_scale: 800.0,
            pwm_offset: 800.0,
            idle_pwm: 900.0,
            idle_current_a: 0.34,
        }
    }
}

impl CurrentModel {
    /// Switch formula
    pub fn with_source(mut self, source: CurrentSource) -> Self {
        self.source = source;
        self
    }

    /// Swap the current fit
    pub fn with_polynomial(mut self, polynomial: MotorCurrentPolynomial) -> Self {
        self.polynomial = polynomial;
        self
    }

    /// Pulse width for a normalised command
    #[inline]
    pub fn pwm(&self, command: f32) -> f32 {
        self.pwm_scale * command + self.pwm_offset
    }

    /// Current drawn by one motor at `command`
    pub fn motor_current(&self, command: f32) -> f32 {
        let x = self.pwm(command);
        if x > self.idle_pwm {
            self.polynomial.eval(x)
        } else {
            self.idle_current_a
        }
    }

    /// Estimated pack current (A)
    ///
    /// The measured current is deliberately not an input. A negative or
    /// NaN result means the fit was evaluated outside its range and is
    /// reported as the `-1` sentinel.
    pub fn estimate(&self, throttle: f32, motors: &[f32; MOTOR_COUNT]) -> f32 {
        let current = match self.source {
            CurrentSource::PerMotor => motors.iter().map(|&m| self.motor_current(m)).sum::<f32>(),
            CurrentSource::Throttle => {
                if throttle > 0.0 {
                    self.polynomial.eval(self.pwm(throttle)) * MOTOR_COUNT as f32
                } else {
                    0.0
                }
            }
        };

        if is_valid_current(current) {
            current
        } else {
            INVALID_SENTINEL
        }
    }
}

/// True for a usable current estimate
#[inline]
pub fn is_valid_current(current: f32) -> bool {
    current >= 0.0
}
