//! Time handling for the estimation loop
//!
//! Timestamps come from the flight controller's high resolution timer in
//! microseconds since boot. A value of 0 is reserved to mean "no prior
//! sample" by the integrators.

use crate::constants::time::MICROS_PER_SECOND;

/// Timestamp in microseconds since boot
pub type Timestamp = u64;

/// Elapsed time between two timestamps in seconds
///
/// Returns 0 if the clock went backwards.
pub fn elapsed_s(now: Timestamp, since: Timestamp) -> f32 {
    now.saturating_sub(since) as f32 / MICROS_PER_SECOND
}
