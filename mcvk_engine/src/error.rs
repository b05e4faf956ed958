//! Error types for the mcvk engine
//!
//! Every fallible operation of the engine returns [`Result`]. Two classes of
//! failure exist: recoverable ones, which the caller may log and continue
//! past, and unrecoverable ones, which abort startup or the frame loop and
//! are turned into a process exit by the top-level driver.

use std::fmt;

/// Result type for mcvk engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// mcvk engine errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend call failed in a way the caller can survive (logged, operation skipped)
    BackendError(String),

    /// Startup could not complete (no accelerator, device/pipeline creation failed...)
    InitializationFailed(String),

    /// Runtime failure that stops the frame loop (acquire, record or submit failed)
    Unrecoverable(String),

    /// Resource used out of its valid range or state
    InvalidResource(String),

    /// Two accelerators could not be ranked against each other
    ComparisonFailed(String),
}

impl Error {
    /// Whether this error must stop the application
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, Error::InitializationFailed(_) | Error::Unrecoverable(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::Unrecoverable(msg) => write!(f, "Unrecoverable error: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::ComparisonFailed(msg) => write!(f, "Comparison failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
