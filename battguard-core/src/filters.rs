//! Exponential moving average filters
//!
//! ```text
//! next = prev · w + sample · (1 - w)
//! ```
//!
//! A filter starts uninitialised and snaps to its first sample instead of
//! ramping up from zero. An update whose result is not finite is dropped
//! and the previous value kept, so a single NaN or infinite sample can
//! never poison the estimate.

use crate::constants::limits::INVALID_SENTINEL;

/// Exponential moving average with lazy initialisation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ema {
    /// Weight on the previous value
    weight: f32,
    /// Current output, `None` until the first sample
    value: Option<f32>,
}

impl Ema {
    /// Create an uninitialised filter with weight `weight` on the previous value
    pub const fn new(weight: f32) -> Self {
        Self { weight, value: None }
    }

    /// Create a filter already holding `initial`
    pub const fn with_initial(weight: f32, initial: f32) -> Self {
        Self {
            weight,
            value: Some(initial),
        }
    }

    /// Feed one sample and return the filtered value
    ///
    /// Returns the `-1` sentinel while no finite sample has been seen.
    pub fn update(&mut self, sample: f32) -> f32 {
        match self.value {
            None if sample.is_finite() => self.value = Some(sample),
            None => {}
            Some(prev) => {
                let next = blend(prev, sample, self.weight);
                if next.is_finite() {
                    self.value = Some(next);
                }
            }
        }

        self.value_or_sentinel()
    }

    /// Current filtered value, if any sample has been seen
    pub fn value(&self) -> Option<f32> {
        self.value
    }

    /// Current filtered value or the `-1` "invalid" sentinel
    pub fn value_or_sentinel(&self) -> f32 {
        self.value.unwrap_or(INVALID_SENTINEL)
    }

    /// Overwrite the filter state
    pub fn set(&mut self, value: f32) {
        self.value = Some(value);
    }

    /// Forget the filter state
    pub fn reset(&mut self) {
        self.value = None;
    }
}

/// One exponential smoothing step
#[inline]
pub fn blend(prev: f32, sample: f32, weight: f32) -> f32 {
    prev * weight + sample * (1.0 - weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::filters::{CURRENT_FILTER_WEIGHT, VOLTAGE_FILTER_WEIGHT};

    #[test]
    fn first_sample_initialises() {
        let mut ema = Ema::new(VOLTAGE_FILTER_WEIGHT);
        assert_eq!(ema.value(), None);
        assert_eq!(ema.value_or_sentinel(), INVALID_SENTINEL);

        assert_eq!(ema.update(16.8), 16.8);
        assert_eq!(ema.value(), Some(16.8));
    }

    #[test]
    fn converges_towards_step() {
        let mut ema = Ema::new(CURRENT_FILTER_WEIGHT);
        ema.update(0.0);

        let mut last = 0.0;
        for _ in 0..100 {
            let v = ema.update(10.0);
            assert!(v > last);
            last = v;
        }
        // 1 - 0.98^100 ≈ 0.867
        assert!((last - 8.67).abs() < 0.05, "got {}", last);
    }

    #[test]
    fn non_finite_sample_is_dropped() {
        let mut ema = Ema::with_initial(VOLTAGE_FILTER_WEIGHT, 12.0);
        assert_eq!(ema.update(f32::NAN), 12.0);
        assert_eq!(ema.update(f32::INFINITY), 12.0);
        assert_eq!(ema.value(), Some(12.0));
    }

    #[test]
    fn non_finite_first_sample_leaves_filter_uninitialised() {
        let mut ema = Ema::new(VOLTAGE_FILTER_WEIGHT);
        assert_eq!(ema.update(f32::NAN), INVALID_SENTINEL);
        assert_eq!(ema.value(), None);
        assert_eq!(ema.update(11.1), 11.1);
    }

    #[test]
    fn reset_forgets_state() {
        let mut ema = Ema::new(0.5);
        ema.update(4.0);
        ema.reset();
        assert_eq!(ema.update(2.0), 2.0);
    }
}
