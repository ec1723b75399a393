//! # treenode-auth
//!
//! Authentication and session security for Treenode.
//!
//! ## Modules
//!
//! - `jwt`: HS256 token signing, decoding and verification
//! - `store`: storage contracts with PostgreSQL and in-memory backends
//! - `lockout`: failed-login tracking and temporary lockouts per (user, origin)
//! - `secret`: one-time tokens for email confirmation and password reset
//! - `password`: Argon2id hashing and password policy
//! - `session`: authenticate, login, refresh, logout, password changes, cookies
//! - `revocation`: housekeeping of expired revocation records

pub mod error;
pub mod jwt;
pub mod lockout;
pub mod password;
pub mod revocation;
pub mod secret;
pub mod session;
pub mod store;

pub use error::{AuthError, AuthResult};
pub use jwt::{Claims, IssuedToken, TokenDecoder, TokenEncoder, TokenPair};
pub use lockout::LockoutPolicy;
pub use password::{PasswordHasher, PasswordValidator};
pub use revocation::RevocationCleanup;
pub use secret::{OneTimeToken, Redemption, SecretTokenIssuer};
pub use session::{LoginResult, SessionAuthenticator};
pub use store::{LockoutStore, MemoryStore, PostgresStore, RevocationStore, UserStore};
