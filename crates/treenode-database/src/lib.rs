//! # treenode-database
//!
//! PostgreSQL connection management and the repositories backing users,
//! token revocation, and failed-login lockouts.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
