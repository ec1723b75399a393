//! Session cookie configuration.

use serde::{Deserialize, Serialize};

/// Attributes applied to the `session` and `refresh` cookies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    /// Cookie `Domain` attribute.
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Whether to set the `Secure` attribute.
    #[serde(default = "default_true")]
    pub secure: bool,
    /// Path the refresh cookie is scoped to.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            secure: true,
            refresh_path: default_refresh_path(),
        }
    }
}

fn default_domain() -> String {
    "localhost".to_string()
}

fn default_true() -> bool {
    true
}

fn default_refresh_path() -> String {
    "/auth/refresh".to_string()
}
