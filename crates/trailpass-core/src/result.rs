//! Convenience result type alias for Trailpass.

use crate::error::AppError;

/// A specialized `Result` type for Trailpass operations.
pub type AppResult<T> = Result<T, AppError>;
