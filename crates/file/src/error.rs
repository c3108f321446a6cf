//! File error types.

use tokio::task::JoinError;
use vertex_swarm_encryption::EncryptionError;
use vertex_swarm_postage::PostageError;
use vertex_swarm_primitives::{ChunkAddress, ChunkError, ReferenceError};
use vertex_swarm_storer::StoreError;

/// Result type for feeding and joining.
pub type Result<T> = std::result::Result<T, FileError>;

/// Errors from feeding content into chunks or joining it back.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// Reading the input failed.
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),

    /// A chunk could not be built or failed verification.
    #[error(transparent)]
    Chunk(#[from] ChunkError),

    /// A chunk could not be encrypted or decrypted.
    #[error(transparent)]
    Encryption(#[from] EncryptionError),

    /// A chunk could not be stamped.
    #[error(transparent)]
    Postage(#[from] PostageError),

    /// The chunk store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An intermediate chunk holds a malformed reference.
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    /// An intermediate chunk does not describe a valid subtree.
    #[error("invalid intermediate chunk {address}: {reason}")]
    InvalidTree {
        /// The offending chunk.
        address: ChunkAddress,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A subtree joined to a different length than its span.
    #[error("span mismatch at {address}: expected {expected} bytes, got {got}")]
    SpanMismatch {
        /// Root of the subtree.
        address: ChunkAddress,
        /// Span recorded in the chunk.
        expected: u64,
        /// Bytes actually joined.
        got: u64,
    },

    /// A chunk task finished without filling its slot.
    #[error("chunk {0} was never produced")]
    MissingChunk(usize),

    /// The concurrency gate was closed.
    #[error("feeder gate closed")]
    GateClosed,

    /// A chunk task panicked or was aborted.
    #[error("chunk task failed: {0}")]
    Task(#[from] JoinError),
}
