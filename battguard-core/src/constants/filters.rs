//! Exponential Filter Weights
//!
//! Every filter here has the form `next = prev * w + sample * (1 - w)`.
//! Only the weight on the previous value is stored.

/// Weight of the previous terminal voltage estimate.
///
/// Slow filter: at a 100 Hz update rate the time constant is about 1 s,
/// enough to reject ESC switching noise and short load spikes.
pub const VOLTAGE_FILTER_WEIGHT: f32 = 0.99;

/// Weight of the previous current estimate.
///
/// At a 100 Hz update rate this low-passes over roughly 500 ms.
pub const CURRENT_FILTER_WEIGHT: f32 = 0.98;

/// Weight of the previous remaining-charge fraction.
///
/// Applied to both the voltage based and the capacity based fraction.
pub const REMAINING_FILTER_WEIGHT: f32 = 0.99;
