use thiserror::Error;
use vertex_swarm_primitives::ChunkError;

/// Result type for encryption operations
pub type Result<T> = std::result::Result<T, EncryptionError>;

/// Errors raised while encrypting or decrypting chunks
#[derive(Error, Debug)]
pub enum EncryptionError {
    /// Input longer than the padded output, or an output buffer of the wrong size
    #[error("invalid input: {size} bytes, expected at most {limit}")]
    InvalidInput {
        /// Number of bytes offered
        size: usize,
        /// Maximum number of bytes accepted
        limit: usize,
    },

    /// The transformed chunk could not be built
    #[error(transparent)]
    Chunk(#[from] ChunkError),
}
