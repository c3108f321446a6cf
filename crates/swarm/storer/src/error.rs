//! Chunk store error types.

use vertex_swarm_postage::PostageError;
use vertex_swarm_primitives::{ChunkAddress, ChunkError};

/// Result type for chunk store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors from chunk store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Chunk not found.
    #[error("chunk not found: {0}")]
    NotFound(ChunkAddress),

    /// The caller gave up on the operation.
    #[error("operation canceled")]
    Canceled,

    /// Invalid chunk data.
    #[error("invalid chunk: {0}")]
    InvalidChunk(#[from] ChunkError),

    /// The chunk could not be stamped.
    #[error("postage error: {0}")]
    Postage(#[from] PostageError),

    /// Failure in the storage backend.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether this is a miss rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
