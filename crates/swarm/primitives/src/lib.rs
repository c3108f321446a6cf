//! Core primitive types for Swarm content addressing.
//!
//! This crate provides the chunk model and the hashing primitives every other
//! vertex client crate builds on.
//!
//! # Types
//!
//! ## Hashing
//! - [`bmt_hash`], [`BmtHasher`] - Binary Merkle Tree content addressing
//! - [`ChunkAddress`] - Address of a chunk (32-byte Keccak-256 hash)
//!
//! ## Chunks
//! - [`AnyChunk`] - Sum type over the supported chunk kinds
//! - [`ContentChunk`] - Content-addressed chunk (`BMT(span, data)`)
//! - [`SingleOwnerChunk`] - Chunk addressed by `H(id ++ owner)`
//!
//! ## References
//! - [`EncryptionKey`] - 32-byte symmetric chunk key
//! - [`ChunkReference`] - Root reference of a split, optionally carrying a key
//!
//! ## Redundancy
//! - [`RedundancyLevel`] - Replica schedule selector

pub mod bmt;
pub mod chunk;
mod redundancy;
mod reference;

pub use alloy_primitives::{Address, B256, Keccak256, keccak256};
pub use bmt::{BmtError, BmtHasher, bmt_hash};
pub use chunk::{
    AnyChunk, ChunkError, ContentChunk, DISPERSED_REPLICA_OWNER, DISPERSED_REPLICA_OWNER_PK,
    SingleOwnerChunk,
};
pub use redundancy::RedundancyLevel;
pub use reference::{ChunkReference, EncryptionKey, ReferenceError};

/// Constants used throughout the crate
pub mod constants {
    pub use crate::bmt::constants::*;

    /// Maximum payload size of a chunk in bytes
    pub const CHUNK_SIZE: usize = BMT_MAX_DATA_LENGTH;

    /// Size of the little-endian length prefix of a chunk
    pub const SPAN_SIZE: usize = 8;

    /// Size of a chunk encryption key in bytes
    pub const ENCRYPTION_KEY_SIZE: usize = 32;

    /// Size of a reference to an unencrypted chunk
    pub const REFERENCE_SIZE: usize = HASH_SIZE;

    /// Size of a reference to an encrypted chunk (`address ++ key`)
    pub const ENCRYPTED_REFERENCE_SIZE: usize = HASH_SIZE + ENCRYPTION_KEY_SIZE;

    /// Size of a single-owner chunk identifier
    pub const ID_SIZE: usize = 32;

    /// Size of a recoverable secp256k1 signature
    pub const SIGNATURE_SIZE: usize = 65;
}

/// A 256-bit chunk address.
///
/// Equality is byte equality and the ordering is lexicographic, which gives the
/// deterministic order used for set operations over addresses.
pub type ChunkAddress = B256;

/// The 8-byte little-endian length prefix of a chunk.
pub type Span = [u8; constants::SPAN_SIZE];

/// Encodes a length as a chunk span.
pub const fn span_from_len(len: u64) -> Span {
    len.to_le_bytes()
}

/// Decodes a chunk span into a length.
pub const fn span_to_len(span: &Span) -> u64 {
    u64::from_le_bytes(*span)
}
