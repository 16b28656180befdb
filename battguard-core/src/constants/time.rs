//! Time Constants

/// Microseconds per second.
pub const MICROS_PER_SECOND: f32 = 1.0e6;

/// Seconds per hour, used to turn amp-seconds into amp-hours.
pub const SECONDS_PER_HOUR: f32 = 3600.0;

/// Milliamp-hours per amp-hour.
pub const MAH_PER_AH: f32 = 1000.0;

/// Coulombs (amp-seconds) per milliamp-hour.
pub const COULOMBS_PER_MAH: f32 = SECONDS_PER_HOUR / MAH_PER_AH;
