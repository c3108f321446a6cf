//! Errors specific to BMT operations

use thiserror::Error;

/// Result type for BMT operations
pub type Result<T> = std::result::Result<T, BmtError>;

/// Errors specific to BMT hashing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BmtError {
    /// More data was written than a single chunk can hold
    #[error("invalid input: {size} bytes exceeds the chunk limit of {limit} bytes")]
    InvalidInput {
        /// Number of bytes offered
        size: usize,
        /// Maximum number of bytes accepted
        limit: usize,
    },
}

impl BmtError {
    /// Create a new invalid input error
    pub fn invalid_input(size: usize, limit: usize) -> Self {
        Self::InvalidInput { size, limit }
    }
}
