//! Storage contracts for authentication state.
//!
//! Components receive these as `Arc<dyn …>` so the PostgreSQL backend and
//! the in-memory backend are interchangeable.

pub mod lockout;
pub mod memory;
pub mod postgres;
pub mod revocation;
pub mod user;

pub use lockout::LockoutStore;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use revocation::RevocationStore;
pub use user::UserStore;
