//! Straightforward level-by-level BMT used to cross-check the optimised hasher.

use alloy_primitives::{B256, keccak256};

use super::constants::*;
use crate::Span;

/// Hashes a full, zero padded buffer one level at a time.
pub(super) fn reference_hash(span: &Span, data: &[u8]) -> B256 {
    let mut level = vec![0u8; BMT_MAX_DATA_LENGTH];
    level[..data.len()].copy_from_slice(data);

    while level.len() > HASH_SIZE {
        level = level
            .chunks(SEGMENT_PAIR_LENGTH)
            .flat_map(|pair| keccak256(pair).0)
            .collect();
    }

    let mut prefixed = span.to_vec();
    prefixed.extend_from_slice(&level);
    keccak256(prefixed)
}
