//! Error types for pool operations

use core::fmt;

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors that can occur when building or operating a worker pool
///
/// Capacity rejection on `append`/`append_p` is deliberately *not* an error:
/// it is a boolean return, and the retry/drop policy belongs to the caller.
/// Per-request read/write failures are likewise reported through the request
/// flags, never through this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Invalid pool configuration (zero workers, zero queue depth, ...)
    InvalidConfig(&'static str),

    /// Failed to spawn a worker thread
    SpawnFailed,

    /// An underlying OS primitive failed (errno / pthread error code)
    Platform(i32),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            PoolError::SpawnFailed => write!(f, "failed to spawn worker thread"),
            PoolError::Platform(code) => write!(f, "platform error: {}", code),
        }
    }
}

impl std::error::Error for PoolError {}
