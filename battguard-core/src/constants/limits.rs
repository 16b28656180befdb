//! Output Limits

/// Filtered pack voltage below which no status is reported (V).
///
/// Below this the voltage reading is not a battery: the record stays in
/// its reset state.
pub const VALID_VOLTAGE_FLOOR_V: f32 = 2.1;

/// Lower bound of the thrust scale factor.
pub const MIN_SCALE: f32 = 1.0;

/// Upper bound of the thrust scale factor.
///
/// At most 30% compensation.
pub const MAX_SCALE: f32 = 1.3;

/// Idle share of the load-drop heuristic.
///
/// With motors idle the voltage is assumed to sag by this fraction of the
/// configured load drop: `thr = (|throttle| + 0.1) / 1.1`.
pub const IDLE_LOAD_SHARE: f32 = 0.1;

/// Sentinel for "not initialised / invalid" filter and current values.
pub const INVALID_SENTINEL: f32 = -1.0;
