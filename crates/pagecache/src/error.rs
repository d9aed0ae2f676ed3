//! Error types for pagecache

use std::fmt;

/// Result type alias for pagecache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Capacity must be at least one entry
    InvalidCapacity(usize),

    /// Entry store and order index disagree (reported by `check_invariants`)
    Invariant(String),
}

impl Error {
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        Error::Invariant(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCapacity(cap) => {
                write!(f, "Invalid capacity: {} (must be at least 1)", cap)
            }
            Error::Invariant(msg) => write!(f, "Invariant violated: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
