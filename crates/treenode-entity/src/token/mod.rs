//! Signed token entities.

pub mod kind;
pub mod revoked;

pub use kind::TokenKind;
pub use revoked::RevokedToken;
