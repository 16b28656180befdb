//! Graduated low-charge warnings
//!
//! The level is latched: once raised it stays at least as severe for the
//! life of the estimator, even if the remaining fraction recovers after the
//! load comes off. Only a fresh estimator starts from [`WarningLevel::None`].

use crate::config::BatteryConfig;

/// Low-charge warning level, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WarningLevel {
    /// No warning
    #[default]
    None,
    /// Below the low threshold
    Low,
    /// Below the critical threshold
    Critical,
    /// Below the emergency threshold
    Emergency,
}

impl WarningLevel {
    /// Uppercase name, as shown to the pilot
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Low => "LOW",
            Self::Critical => "CRITICAL",
            Self::Emergency => "EMERGENCY",
        }
    }

    /// Level implied by `remaining` alone
    pub fn from_remaining(remaining: f32, config: &BatteryConfig) -> Self {
        if remaining < config.emergency_thr {
            Self::Emergency
        } else if remaining < config.crit_thr {
            Self::Critical
        } else if remaining < config.low_thr {
            Self::Low
        } else {
            Self::None
        }
    }
}

impl core::fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for WarningLevel {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.as_str())
    }
}

/// Latched warning state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WarningState {
    level: WarningLevel,
}

impl WarningState {
    /// No warning raised yet
    pub const fn new() -> Self {
        Self {
            level: WarningLevel::None,
        }
    }

    /// Re-evaluate against `remaining`
    ///
    /// Nothing changes while the battery is disconnected.
    pub fn evaluate(&mut self, remaining: f32, config: &BatteryConfig, connected: bool) -> WarningLevel {
        if !connected {
            return self.level;
        }

        let level = WarningLevel::from_remaining(remaining, config).max(self.level);
        if level > self.level {
            log_warn!("Battery warning {} -> {} at {}", self.level, level, remaining);
            self.level = level;
        }
        self.level
    }

    /// Current level
    pub fn level(&self) -> WarningLevel {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(WarningLevel::None < WarningLevel::Low);
        assert!(WarningLevel::Low < WarningLevel::Critical);
        assert!(WarningLevel::Critical < WarningLevel::Emergency);
    }

    #[test]
    fn thresholds_are_strict() {
        let config = BatteryConfig::default();
        assert_eq!(WarningLevel::from_remaining(0.15, &config), WarningLevel::None);
        assert_eq!(WarningLevel::from_remaining(0.149, &config), WarningLevel::Low);
        assert_eq!(WarningLevel::from_remaining(0.069, &config), WarningLevel::Critical);
        assert_eq!(WarningLevel::from_remaining(0.0, &config), WarningLevel::Emergency);
    }

    #[test]
    fn level_is_latched() {
        let config = BatteryConfig::default();
        let mut state = WarningState::new();

        assert_eq!(state.evaluate(0.5, &config, true), WarningLevel::None);
        assert_eq!(state.evaluate(0.06, &config, true), WarningLevel::Critical);
        // Voltage recovers with the load off
        assert_eq!(state.evaluate(0.5, &config, true), WarningLevel::Critical);
        assert_eq!(state.evaluate(0.1, &config, true), WarningLevel::Critical);
        assert_eq!(state.evaluate(0.01, &config, true), WarningLevel::Emergency);
    }

    #[test]
    fn disconnected_battery_never_warns() {
        let config = BatteryConfig::default();
        let mut state = WarningState::new();
        assert_eq!(state.evaluate(0.0, &config, false), WarningLevel::None);
        assert_eq!(state.level(), WarningLevel::None);
    }

    #[test]
    fn display_names() {
        assert_eq!(WarningLevel::Emergency.as_str(), "EMERGENCY");
        assert_eq!(WarningLevel::default(), WarningLevel::None);
    }
}
