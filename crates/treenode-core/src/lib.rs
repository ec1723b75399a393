//! # treenode-core
//!
//! Core crate for Treenode authentication. Contains configuration schemas,
//! the unified error system, and the clock abstraction used by every
//! time-window decision.
//!
//! This crate has **no** internal dependencies on other Treenode crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
