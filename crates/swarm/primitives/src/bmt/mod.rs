//! Binary Merkle Tree (BMT) hashing for content addressing.
//!
//! A chunk address is the Keccak-256 hash of the span concatenated with the
//! root of a binary tree over the 32-byte segments of the (zero padded)
//! payload.

pub mod constants;
pub mod error;
mod hasher;

#[cfg(test)]
mod reference;

pub use constants::*;
pub use error::{BmtError, Result};
pub use hasher::{BmtHasher, bmt_hash};
