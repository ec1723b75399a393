//! Token kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Distinguishes session credentials from refresh tokens.
///
/// The kind is signed into the token; each flow accepts exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived token presented on every authenticated request.
    Credential,
    /// Long-lived, single-use token exchanged for a new pair.
    Refresh,
}

impl TokenKind {
    /// Return the kind as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credential => "credential",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
