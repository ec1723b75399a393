//! Housekeeping for revocation records.

pub mod cleanup;

pub use cleanup::RevocationCleanup;
