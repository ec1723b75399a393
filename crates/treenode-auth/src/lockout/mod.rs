//! Failed-login tracking and temporary lockouts.

pub mod policy;

pub use policy::LockoutPolicy;
