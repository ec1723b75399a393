//! Authentication error taxonomy.
//!
//! [`AuthError`] keeps the precise reason a check failed so that callers and
//! logs can tell them apart. Converting into [`AppError`] collapses every
//! token and credential failure to the same public response.

use thiserror::Error;
use tracing::{debug, error};

use treenode_core::error::{AppError, ErrorKind};

/// Public message for every token or credential failure.
pub const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Public message for a locked (user, origin) pair.
pub const ACCOUNT_LOCKED: &str = "account locked";

/// Result alias for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Why an authentication operation failed.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token does not have three dot-separated segments.
    #[error("malformed token")]
    MalformedToken,
    /// The signature segment does not decode or does not match.
    #[error("invalid token signature")]
    InvalidSignature,
    /// The payload does not decode or is not a claims object.
    #[error("malformed token payload")]
    MalformedPayload,
    /// The token or one-time token is past its lifetime.
    #[error("token expired")]
    Expired,
    /// The token was issued in the future.
    #[error("token not yet valid")]
    NotYetValid,
    /// The token id has been revoked.
    #[error("token revoked")]
    Revoked,
    /// The token is of the other kind.
    #[error("wrong token kind")]
    WrongKind,
    /// The token predates the user's current session epoch.
    #[error("session epoch mismatch")]
    EpochMismatch,
    /// The (user, origin) pair is locked.
    #[error("account locked")]
    LockedOut,
    /// Unknown user, wrong password, or unconfirmed email.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// The email address is already confirmed.
    #[error("email already confirmed")]
    AlreadyConfirmed,
    /// No user holds the presented one-time token.
    #[error("token not found")]
    TokenNotFound,
    /// The new password violates the password policy.
    #[error("invalid password: {0}")]
    InvalidPassword(String),
    /// The backing store failed.
    #[error("storage failure: {0}")]
    StorageFailure(AppError),
    /// Signing, hashing, or another non-storage step failed.
    #[error("internal failure: {0}")]
    Internal(AppError),
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind {
            ErrorKind::Database => Self::StorageFailure(err),
            _ => Self::Internal(err),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::LockedOut => AppError::locked(ACCOUNT_LOCKED),
            AuthError::AlreadyConfirmed => AppError::validation("email already confirmed"),
            AuthError::InvalidPassword(reason) => AppError::validation(reason),
            AuthError::StorageFailure(source) => {
                error!(kind = %source.kind, error = %source, "Auth storage failure");
                AppError::with_source(ErrorKind::Internal, "internal server error", source)
            }
            AuthError::Internal(source) => {
                error!(kind = %source.kind, error = %source, "Auth internal failure");
                AppError::with_source(ErrorKind::Internal, "internal server error", source)
            }
            other => {
                debug!(reason = %other, "Rejected credentials");
                AppError::authentication(INVALID_CREDENTIALS)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_failures_are_indistinguishable() {
        let failures = [
            AuthError::MalformedToken,
            AuthError::InvalidSignature,
            AuthError::MalformedPayload,
            AuthError::Expired,
            AuthError::NotYetValid,
            AuthError::Revoked,
            AuthError::WrongKind,
            AuthError::EpochMismatch,
            AuthError::InvalidCredentials,
        ];

        for failure in failures {
            let app: AppError = failure.into();
            assert_eq!(app.kind, ErrorKind::Authentication);
            assert_eq!(app.message, INVALID_CREDENTIALS);
        }
    }

    #[test]
    fn test_lockout_maps_to_locked() {
        let app: AppError = AuthError::LockedOut.into();
        assert_eq!(app.kind, ErrorKind::Locked);
        assert_eq!(app.message, ACCOUNT_LOCKED);
        assert_eq!(app.status_code().as_u16(), 423);
    }

    #[test]
    fn test_storage_failure_is_opaque() {
        let err = AuthError::StorageFailure(AppError::database("connection refused"));
        let app: AppError = err.into();
        assert_eq!(app.kind, ErrorKind::Internal);
        assert_eq!(app.message, "internal server error");
        assert!(!app.is_client_facing());
    }

    #[test]
    fn test_only_database_errors_are_storage_failures() {
        let storage: AuthError = AppError::database("connection refused").into();
        assert!(matches!(storage, AuthError::StorageFailure(_)));

        for source in [
            AppError::internal("signing failed"),
            AppError::not_found("User 42 not found"),
            AppError::new(ErrorKind::Serialization, "bad claims"),
        ] {
            let err: AuthError = source.into();
            assert!(matches!(err, AuthError::Internal(_)));
            let app: AppError = err.into();
            assert_eq!(app.kind, ErrorKind::Internal);
            assert_eq!(app.message, "internal server error");
        }
    }

    #[test]
    fn test_invalid_password_keeps_reason() {
        let app: AppError = AuthError::InvalidPassword("too short".into()).into();
        assert_eq!(app.kind, ErrorKind::Validation);
        assert_eq!(app.message, "too short");
    }
}
