//! Convenience result type alias for Treenode.

use crate::error::AppError;

/// A specialized `Result` type for Treenode operations.
pub type AppResult<T> = Result<T, AppError>;
