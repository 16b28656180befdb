//! Coulomb counting
//!
//! Integrates estimated current over time into discharged charge (mAh):
//!
//! ```text
//! discharged += I · dt / 3600 · 1000
//! ```
//!
//! The first sample only sets the time baseline. An invalid current sample
//! clears the baseline, so the gap it leaves is never integrated: the next
//! valid sample starts a fresh baseline instead of contributing one large
//! `dt`.

use crate::{
    constants::time::{MAH_PER_AH, SECONDS_PER_HOUR},
    current::is_valid_current,
    time::{elapsed_s, Timestamp},
};

/// Discharged-charge accumulator
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoulombCounter {
    /// Discharged charge (mAh)
    discharged_mah: f32,
    /// Timestamp of the previous valid sample, 0 if none
    last_timestamp: Timestamp,
}

impl CoulombCounter {
    /// Empty counter
    pub const fn new() -> Self {
        Self {
            discharged_mah: 0.0,
            last_timestamp: 0,
        }
    }

    /// Integrate `current_a` up to `timestamp`
    pub fn accumulate(&mut self, timestamp: Timestamp, current_a: f32) {
        if !is_valid_current(current_a) {
            self.last_timestamp = 0;
            return;
        }

        if self.last_timestamp != 0 {
            let dt = elapsed_s(timestamp, self.last_timestamp);
            self.discharged_mah += current_a * dt / SECONDS_PER_HOUR * MAH_PER_AH;
        }
        self.last_timestamp = timestamp;
    }

    /// Discharged charge (mAh)
    pub fn discharged_mah(&self) -> f32 {
        self.discharged_mah
    }

    /// Overwrite the accumulated charge, keeping the time baseline
    pub fn recalibrate(&mut self, discharged_mah: f32) {
        self.discharged_mah = discharged_mah;
    }
}
