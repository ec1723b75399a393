//! Background housekeeping configuration.

use serde::{Deserialize, Serialize};

/// Periodic maintenance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Interval between purges of expired revocation records, in minutes.
    #[serde(default = "default_cleanup_interval")]
    pub revocation_cleanup_interval_minutes: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            revocation_cleanup_interval_minutes: default_cleanup_interval(),
        }
    }
}

fn default_cleanup_interval() -> u64 {
    60
}
