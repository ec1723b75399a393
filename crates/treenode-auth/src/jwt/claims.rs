//! Claims carried in every signed token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use treenode_entity::token::TokenKind;
use treenode_entity::user::UserRole;

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user ID.
    pub sub: Uuid,
    /// Unique token ID, the revocation key.
    pub jti: Uuid,
    /// Session epoch of the user when the token was issued.
    pub sid: Uuid,
    /// Issued-at (seconds since epoch). Zero disables the not-before check.
    #[serde(default)]
    pub iat: i64,
    /// Expiry (seconds since epoch). Zero disables the expiry check.
    #[serde(default)]
    pub exp: i64,
    /// Email address at issuance.
    pub email: String,
    /// Role at issuance.
    pub role: UserRole,
    /// Which flows accept the token.
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

impl Claims {
    /// Returns the user ID from the subject claim.
    pub fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the expiry as a timestamp, if it is set and representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.exp == 0 {
            return None;
        }
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            jti: Uuid::new_v4(),
            sid: Uuid::new_v4(),
            iat: 1_700_000_000,
            exp: 1_700_000_900,
            email: "alice@example.com".into(),
            role: UserRole::Admin,
            kind: TokenKind::Refresh,
        };

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["type"], "refresh");
        assert_eq!(json["role"], "admin");
        assert_eq!(json["exp"], 1_700_000_900);
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn test_missing_times_default_to_zero() {
        let json = format!(
            r#"{{"sub":"{0}","jti":"{0}","sid":"{0}","email":"a@b.c","role":"user","type":"credential"}}"#,
            Uuid::nil()
        );
        let claims: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(claims.exp, 0);
        assert!(claims.expires_at().is_none());
    }
}
