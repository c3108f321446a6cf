use alloy_primitives::Address;
use thiserror::Error;

/// Result type for postage operations
pub type Result<T> = std::result::Result<T, PostageError>;

/// Errors raised by batches, issuers and stampers
#[derive(Debug, Error)]
pub enum PostageError {
    /// An immutable batch has no free slot left in the bucket
    #[error("batch overflow: bucket {bucket} is full ({limit} slots)")]
    BatchOverflow {
        /// The full bucket
        bucket: u32,
        /// Slots per bucket
        limit: u64,
    },

    /// Depth out of range
    #[error("invalid depth: {0}")]
    InvalidDepth(u8),

    /// Bucket depth out of range or larger than the depth
    #[error("invalid bucket depth: {0}")]
    InvalidBucketDepth(u8),

    /// A batch cannot be sized for zero bytes
    #[error("size is too small for batch")]
    SizeTooSmall,

    /// The signer is not the batch owner
    #[error("signer {got} does not own the batch (owner {expected})")]
    OwnerMismatch {
        /// Batch owner
        expected: Address,
        /// Signer address
        got: Address,
    },

    /// A stamp does not validate against its batch or chunk
    #[error("invalid stamp: {0}")]
    InvalidStamp(&'static str),

    /// Wrong number of bytes for a serialized value
    #[error("incorrect size, received {0} bytes, expected {1} bytes")]
    IncorrectSize(usize, usize),

    /// Malformed signature bytes
    #[error("signature error: {0}")]
    Signature(#[from] alloy_primitives::SignatureError),

    /// The signer failed
    #[error("signer error: {0}")]
    Signer(#[from] alloy_signer::Error),
}
