//! Error types for M3C2 computations.
//!
//! Configuration problems fail fast before any per-point work begins.
//! Per-point failures (too few neighbors, empty cylinder) are *not* errors;
//! they are recorded in the corresponding [`crate::CorePointResult`].

use thiserror::Error;

/// Result type alias for M3C2 operations.
pub type M3c2Result<T> = Result<T, M3c2Error>;

/// Errors that can occur during an M3C2 computation.
#[derive(Debug, Error)]
pub enum M3c2Error {
    /// A required input cloud is empty.
    #[error("{0} cloud is empty")]
    EmptyCloud(&'static str),

    /// Invalid computation parameters.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// I/O error while loading or saving a cloud.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed record in a point cloud file.
    #[error("malformed record at line {line}: {reason}")]
    Parse {
        /// 1-based line number of the offending record.
        line: usize,
        /// Description of what failed to parse.
        reason: String,
    },
}

impl M3c2Error {
    /// Creates an invalid-params error.
    #[must_use]
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::InvalidParams(details.into())
    }
}
