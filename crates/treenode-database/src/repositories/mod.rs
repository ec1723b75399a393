//! Repository implementations, one per table group.

pub mod lockout;
pub mod revoked_token;
pub mod user;

pub use lockout::LockoutRepository;
pub use revoked_token::RevokedTokenRepository;
pub use user::UserRepository;
