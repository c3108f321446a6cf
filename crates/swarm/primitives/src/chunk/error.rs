//! Errors specific to chunk operations

use std::fmt::Debug;
use thiserror::Error;

use crate::BmtError;

/// Result type specific to chunk operations
pub type Result<T> = std::result::Result<T, ChunkError>;

/// Errors specific to chunk operations
#[derive(Error, Debug)]
pub enum ChunkError {
    /// A chunk or one of its fields has the wrong size
    #[error("size error: {context} (size: {size}, limit: {limit})")]
    Size {
        /// Context description
        context: &'static str,
        /// Actual size
        size: usize,
        /// Size limit
        limit: usize,
    },

    /// A chunk does not hash to the address it was requested under
    #[error("verification failed: {context} (expected: {expected}, got: {got})")]
    Verification {
        /// Context description
        context: &'static str,
        /// Expected value
        expected: String,
        /// Actual value
        got: String,
    },

    /// A chunk signed by the replica owner whose id does not match its payload
    #[error("invalid dispersed replica")]
    InvalidReplica,

    /// Malformed signature bytes
    #[error("invalid signature: {0}")]
    Signature(#[from] alloy_primitives::SignatureError),

    /// The signer failed to produce a signature
    #[error("signer error: {0}")]
    Signer(#[from] alloy_signer::Error),

    /// BMT hashing failed
    #[error(transparent)]
    Bmt(#[from] BmtError),
}

impl ChunkError {
    /// Create a new size error
    pub fn size(context: &'static str, size: usize, limit: usize) -> Self {
        Self::Size {
            context,
            size,
            limit,
        }
    }

    /// Create a new verification error
    pub fn verification<T: Debug, U: Debug>(context: &'static str, expected: T, got: U) -> Self {
        Self::Verification {
            context,
            expected: format!("{expected:?}"),
            got: format!("{got:?}"),
        }
    }
}
