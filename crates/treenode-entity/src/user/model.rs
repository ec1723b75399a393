//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::UserRole;

/// A registered account as stored in the `users` table.
///
/// Only hashes of one-time tokens are stored; the raw values exist solely in
/// the email that delivered them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique display name.
    pub username: String,
    /// Login email address.
    pub email: String,
    /// Argon2id password hash (PHC string).
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Role embedded in issued tokens.
    pub role: UserRole,
    /// Whether the email address has been confirmed.
    pub email_confirmed: bool,
    /// Hash of the outstanding email confirmation token.
    #[serde(skip_serializing)]
    pub email_confirm_token: Option<String>,
    /// When the outstanding confirmation token was issued.
    #[serde(skip_serializing)]
    pub email_confirm_issued_at: Option<DateTime<Utc>>,
    /// Hash of the outstanding password reset token.
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    /// When the outstanding reset token was issued.
    #[serde(skip_serializing)]
    pub password_reset_issued_at: Option<DateTime<Utc>>,
    /// Session epoch; tokens stamped with any other value are dead.
    #[serde(skip_serializing)]
    pub session_epoch: Uuid,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Builds a fresh, unconfirmed account with a new session epoch.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role,
            email_confirmed: false,
            email_confirm_token: None,
            email_confirm_issued_at: None,
            password_reset_token: None,
            password_reset_issued_at: None,
            session_epoch: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    /// Check if this user has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_are_not_serialized() {
        let mut user = User::new("alice", "alice@example.com", "$argon2id$hash", UserRole::User);
        user.password_reset_token = Some("stored-hash".to_string());

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password_reset_token").is_none());
        assert!(json.get("session_epoch").is_none());
        assert_eq!(json["email"], "alice@example.com");
    }

    #[test]
    fn test_new_users_get_distinct_epochs() {
        let a = User::new("a", "a@example.com", "h", UserRole::User);
        let b = User::new("b", "b@example.com", "h", UserRole::User);
        assert_ne!(a.session_epoch, b.session_epoch);
        assert!(!a.email_confirmed);
    }
}
