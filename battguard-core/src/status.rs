//! Battery status record
//!
//! Written in place once per update. A record still in its reset state
//! (see [`BatteryStatus::reset`]) means the estimator has no plausible
//! voltage yet and nothing in it should be acted on.

use crate::{constants::limits::INVALID_SENTINEL, time::Timestamp, warning::WarningLevel};

/// Output of one estimator update
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatteryStatus {
    /// Update timestamp (µs)
    pub timestamp_us: Timestamp,
    /// Measured pack voltage (V)
    pub voltage_v: f32,
    /// Filtered pack voltage (V)
    pub voltage_filtered_v: f32,
    /// Estimated pack current (A), `-1` if invalid
    pub current_a: f32,
    /// Filtered estimated current (A), `-1` if invalid
    pub current_filtered_a: f32,
    /// Discharged charge (mAh)
    pub discharged_mah: f32,
    /// Remaining fraction [0, 1]
    pub remaining: f32,
    /// Uncertainty of `remaining`, 0 if not estimated
    pub remaining_error: f32,
    /// EKF state of charge as a fraction [0, 1], 0 until the EKF runs
    pub ekf_remaining: f32,
    /// Thrust scale factor [1.0, 1.3]
    pub scale: f32,
    /// Low-charge warning
    pub warning: WarningLevel,
    /// Battery connected
    pub connected: bool,
    /// This battery is the one the system runs on
    pub system_source: bool,
    /// Source priority
    pub priority: u8,
    /// Number of cells in series
    pub cell_count: u8,
}

impl Default for BatteryStatus {
    fn default() -> Self {
        Self::reset(0)
    }
}

impl BatteryStatus {
    /// "Not ready" record for a pack of `cell_count` cells
    pub fn reset(cell_count: u8) -> Self {
        Self {
            timestamp_us: 0,
            voltage_v: 0.0,
            voltage_filtered_v: 0.0,
            current_a: INVALID_SENTINEL,
            current_filtered_a: 0.0,
            discharged_mah: 0.0,
            remaining: 1.0,
            remaining_error: 0.0,
            ekf_remaining: 0.0,
            scale: 1.0,
            warning: WarningLevel::None,
            connected: false,
            system_source: false,
            priority: 0,
            cell_count,
        }
    }

    /// True once measurement fields have been populated
    pub fn is_valid(&self) -> bool {
        self.voltage_filtered_v > 0.0
    }
}
