//! Result type alias for fieldtime operations.

use crate::error::CoreError;

/// Standard Result type for fieldtime operations.
pub type FtResult<T> = Result<T, CoreError>;
