//! Error types for the PostFX engine
//!
//! This module defines the error types used throughout the engine,
//! including GPU resource allocation, shader loading and initialization.

use std::fmt;

/// Result type for PostFX engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// PostFX engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (OpenGL, mock device, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, shader, data upload, etc.)
    InvalidResource(String),

    /// Initialization failed (engine, shader registry, host targets)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR message and build an `Error::BackendError` from it
///
/// # Example
///
/// ```no_run
/// # use postfx_engine::engine_err;
/// let err = engine_err!("postfx::ShaderRegistry", "Shader '{}' not found", "blur");
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::postfx::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return early with an `Error::BackendError`
///
/// # Example
///
/// ```no_run
/// # use postfx_engine::engine_bail;
/// fn check(count: u32) -> postfx_engine::postfx::Result<()> {
///     if count == 0 {
///         engine_bail!("postfx::Group", "Group has {} passes", count);
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
