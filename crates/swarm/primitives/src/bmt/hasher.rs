//! Binary Merkle Tree hasher.

use alloy_primitives::{B256, Keccak256, keccak256};
use once_cell::sync::Lazy;

use super::constants::*;
use super::error::{BmtError, Result};
use crate::{ChunkAddress, Span, span_from_len, span_to_len};

/// Subtrees at least this long are split across the rayon pool.
const PARALLEL_THRESHOLD: usize = 1024;

/// Roots of all-zero subtrees, indexed by level (level 0 is a zero segment).
///
/// Padding past the end of the written data is never hashed twice: any subtree
/// that starts beyond the data resolves to the matching entry here.
static ZERO_HASHES: Lazy<[[u8; HASH_SIZE]; BMT_DEPTH + 1]> = Lazy::new(|| {
    let mut zero_hashes = [[0u8; HASH_SIZE]; BMT_DEPTH + 1];
    for level in 1..=BMT_DEPTH {
        let below = zero_hashes[level - 1];
        let mut pair = [0u8; SEGMENT_PAIR_LENGTH];
        pair[..HASH_SIZE].copy_from_slice(&below);
        pair[HASH_SIZE..].copy_from_slice(&below);
        zero_hashes[level] = *keccak256(pair);
    }
    zero_hashes
});

/// Computes the BMT address of a chunk from its span and payload.
///
/// The payload is split into 32-byte segments, zero padded to
/// [`BMT_BRANCHES`] leaves and reduced pairwise with Keccak-256. The address is
/// `keccak256(span ++ root)`.
///
/// Fails with [`BmtError::InvalidInput`] if `data` is longer than
/// [`BMT_MAX_DATA_LENGTH`].
pub fn bmt_hash(span: &Span, data: &[u8]) -> Result<ChunkAddress> {
    if data.len() > BMT_MAX_DATA_LENGTH {
        return Err(BmtError::invalid_input(data.len(), BMT_MAX_DATA_LENGTH));
    }

    Ok(finalize(span, &bmt_root(data)))
}

/// Returns the un-prefixed root of the tree over `data`.
fn bmt_root(data: &[u8]) -> [u8; HASH_SIZE] {
    hash_subtree(data, 0, BMT_MAX_DATA_LENGTH)
}

fn finalize(span: &Span, root: &[u8; HASH_SIZE]) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(span);
    hasher.update(root);
    hasher.finalize()
}

/// Hashes the subtree covering `length` bytes of the padded buffer starting at
/// `offset`. `length` is always a power of two multiple of the segment size.
fn hash_subtree(data: &[u8], offset: usize, length: usize) -> [u8; HASH_SIZE] {
    if offset >= data.len() {
        let level = (length / SEGMENT_SIZE).trailing_zeros() as usize;
        return ZERO_HASHES[level];
    }

    let mut pair = [0u8; SEGMENT_PAIR_LENGTH];

    if length == SEGMENT_PAIR_LENGTH {
        let end = data.len().min(offset + length);
        pair[..end - offset].copy_from_slice(&data[offset..end]);
        return *keccak256(pair);
    }

    let half = length / 2;
    let (left, right) = if length > PARALLEL_THRESHOLD {
        rayon::join(
            || hash_subtree(data, offset, half),
            || hash_subtree(data, offset + half, half),
        )
    } else {
        (
            hash_subtree(data, offset, half),
            hash_subtree(data, offset + half, half),
        )
    };

    pair[..HASH_SIZE].copy_from_slice(&left);
    pair[HASH_SIZE..].copy_from_slice(&right);
    *keccak256(pair)
}

/// Incremental BMT hasher for a single chunk.
///
/// Data is buffered up to [`BMT_MAX_DATA_LENGTH`] bytes; the tree is computed
/// when the hasher is summed. A hasher is cheap to reset and intended to be
/// owned by one task at a time.
#[derive(Debug, Clone)]
pub struct BmtHasher {
    span: Span,
    buffer: Vec<u8>,
}

impl Default for BmtHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl BmtHasher {
    /// Create a new hasher with an empty buffer and a zero span.
    pub fn new() -> Self {
        Self {
            span: [0u8; 8],
            buffer: Vec::with_capacity(BMT_MAX_DATA_LENGTH),
        }
    }

    /// Set the span from a length.
    pub fn set_span(&mut self, span: u64) {
        self.span = span_from_len(span);
    }

    /// Set the raw span bytes, e.g. an encrypted span.
    pub fn set_span_bytes(&mut self, span: Span) {
        self.span = span;
    }

    /// Get the current span as a length.
    pub fn span(&self) -> u64 {
        span_to_len(&self.span)
    }

    /// Number of payload bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether no payload has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Append payload bytes.
    ///
    /// The write is rejected as a whole if it would take the payload past the
    /// chunk limit.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        let total = self.buffer.len() + data.len();
        if total > BMT_MAX_DATA_LENGTH {
            return Err(BmtError::invalid_input(total, BMT_MAX_DATA_LENGTH));
        }

        self.buffer.extend_from_slice(data);
        Ok(data.len())
    }

    /// Compute the chunk address of the buffered payload.
    pub fn sum(&self) -> ChunkAddress {
        finalize(&self.span, &bmt_root(&self.buffer))
    }

    /// Compute the chunk address and reset the hasher for reuse.
    pub fn finalize_reset(&mut self) -> ChunkAddress {
        let address = self.sum();
        self.reset();
        address
    }

    /// Clear the payload and span.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.span = [0u8; 8];
    }
}
