//! Thrust scale for voltage sag
//!
//! The smoothed voltage based remaining fraction is mapped back to an
//! unloaded cell voltage, and thrust is boosted by how far that sits below
//! full:
//!
//! ```text
//! v_bat = v_empty + (v_full - v_empty) · remaining_voltage
//! scale = v_full / v_bat            in [1.0, 1.3]
//! ```

use crate::{
    config::BatteryConfig,
    constants::limits::{MAX_SCALE, MIN_SCALE},
};

/// Thrust scale factor for `remaining_voltage`
pub fn compute_scale(config: &BatteryConfig, remaining_voltage: f32) -> f32 {
    let cell_voltage = config.v_empty + config.voltage_range() * remaining_voltage;
    let scale = config.v_full / cell_voltage;

    if !scale.is_finite() || scale < MIN_SCALE {
        MIN_SCALE
    } else if scale > MAX_SCALE {
        MAX_SCALE
    } else {
        scale
    }
}
