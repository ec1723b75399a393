//! One-time secret tokens for email confirmation and password reset.

pub mod issuer;
pub mod token;

pub use issuer::{Redemption, SecretTokenIssuer};
pub use token::OneTimeToken;
