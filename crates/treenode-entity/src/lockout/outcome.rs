//! Result of recording a failed login.

use serde::{Deserialize, Serialize};

use super::record::Lockout;

/// What a single failed login caused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureOutcome {
    /// Active failures inside the backtrack window, including this one.
    pub recent_failures: i64,
    /// The lockout this failure created, if it crossed the threshold.
    pub lockout: Option<Lockout>,
    /// An earlier lockout for the pair was still in force, so none was added.
    #[serde(default)]
    pub already_locked: bool,
}

impl FailureOutcome {
    /// Whether the pair is locked after this failure.
    pub fn locked(&self) -> bool {
        self.lockout.is_some() || self.already_locked
    }
}
