//! Error types for the skipfilter engine.

use std::fmt;

/// The result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for skipfilter operations.
///
/// Engine operations themselves (`add`, `remove`, `len`, `match_any`, `walk`)
/// are total and never fail; errors are produced by configuration validation.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An invalid argument was provided.
    InvalidArgument(String),
}

impl Error {
    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
