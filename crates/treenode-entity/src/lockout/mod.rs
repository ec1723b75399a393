//! Failed-login tracking entities.

pub mod attempt;
pub mod outcome;
pub mod record;

pub use attempt::FailedLogin;
pub use outcome::FailureOutcome;
pub use record::{FAILED_LOGINS_REASON, Lockout};
