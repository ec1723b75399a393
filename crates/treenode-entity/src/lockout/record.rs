//! Lockout row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Reason stored on lockouts created by the failed-login threshold.
pub const FAILED_LOGINS_REASON: &str = "failed logins";

/// A temporary login ban for a (user, origin) pair.
///
/// `active` is only cleared by an explicit unlock. A lockout whose
/// `locked_until` has passed stays active but no longer blocks logins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Lockout {
    /// Row identifier.
    pub id: Uuid,
    /// The locked account.
    pub user_id: Uuid,
    /// The locked client address.
    pub origin: String,
    /// Logins from the pair are refused until this instant.
    pub locked_until: DateTime<Utc>,
    /// Why the lockout was created.
    pub reason: String,
    /// Cleared by unlock.
    pub active: bool,
}

impl Lockout {
    /// A new active lockout.
    pub fn new(
        user_id: Uuid,
        origin: impl Into<String>,
        locked_until: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            origin: origin.into(),
            locked_until,
            reason: reason.into(),
            active: true,
        }
    }

    /// Whether this lockout blocks logins at `now`.
    pub fn is_in_force(&self, now: DateTime<Utc>) -> bool {
        self.active && self.locked_until > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_lockout_lapses_without_deactivation() {
        let now = Utc::now();
        let lockout = Lockout::new(Uuid::new_v4(), "10.0.0.1", now + Duration::hours(1), FAILED_LOGINS_REASON);

        assert!(lockout.is_in_force(now));
        assert!(!lockout.is_in_force(now + Duration::hours(1)));
        assert!(lockout.active);
    }

    #[test]
    fn test_inactive_lockout_never_blocks() {
        let now = Utc::now();
        let mut lockout = Lockout::new(Uuid::new_v4(), "10.0.0.1", now + Duration::hours(1), FAILED_LOGINS_REASON);
        lockout.active = false;
        assert!(!lockout.is_in_force(now));
    }
}
