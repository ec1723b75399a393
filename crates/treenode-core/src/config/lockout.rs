//! Brute-force lockout configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::auth::check_window;
use crate::error::AppError;

/// Failed-login tracking and lockout thresholds.
///
/// The threshold is the last *tolerated* failure count: the failure that
/// brings the recent count above it creates the lockout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutConfig {
    /// Recent failures tolerated per (user, origin) before locking.
    #[serde(default = "default_threshold")]
    pub threshold: i64,
    /// How long a lockout lasts, in seconds.
    #[serde(default = "default_duration")]
    pub duration_seconds: i64,
    /// Look-back window for counting failures, in seconds.
    #[serde(default = "default_backtrack")]
    pub backtrack_seconds: i64,
}

impl LockoutConfig {
    /// Rejects a negative threshold and out-of-range windows.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.threshold < 0 {
            return Err(AppError::configuration(format!(
                "lockout.threshold must not be negative, got {}",
                self.threshold
            )));
        }
        check_window("lockout.duration_seconds", self.duration_seconds)?;
        check_window("lockout.backtrack_seconds", self.backtrack_seconds)
    }

    /// Lockout duration as a chrono duration.
    pub fn duration(&self) -> Duration {
        Duration::seconds(self.duration_seconds)
    }

    /// Failure look-back window as a chrono duration.
    pub fn backtrack(&self) -> Duration {
        Duration::seconds(self.backtrack_seconds)
    }
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            duration_seconds: default_duration(),
            backtrack_seconds: default_backtrack(),
        }
    }
}

fn default_threshold() -> i64 {
    5
}

fn default_duration() -> i64 {
    3600
}

fn default_backtrack() -> i64 {
    1800
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(LockoutConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = LockoutConfig {
            threshold: -1,
            ..LockoutConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LockoutConfig {
            duration_seconds: 0,
            ..LockoutConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LockoutConfig {
            backtrack_seconds: i64::MAX,
            ..LockoutConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
