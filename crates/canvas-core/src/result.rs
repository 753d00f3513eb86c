//! Convenience result type alias for the plugin runner.

use crate::error::AppError;

/// A specialized `Result` type for plugin runner operations.
pub type AppResult<T> = Result<T, AppError>;
