//! Chunk level encryption.
//!
//! The span and the payload of a chunk are encrypted under the same key with
//! disjoint counter ranges: the payload starts at block 0 and is padded to a
//! full chunk, the span starts [`SPAN_INIT_COUNTER`] blocks in.

use vertex_swarm_primitives::constants::{CHUNK_SIZE, ENCRYPTION_KEY_SIZE, SPAN_SIZE};
use vertex_swarm_primitives::{ContentChunk, EncryptionKey, Span, span_to_len};

use crate::error::Result;
use crate::transform::Encryption;

/// Counter of the first span keystream block.
pub const SPAN_INIT_COUNTER: u32 = (CHUNK_SIZE / ENCRYPTION_KEY_SIZE) as u32;

/// Output of [`encrypt`].
#[derive(Debug, Clone)]
pub struct EncryptedParts {
    /// The key used, generated if none was supplied
    pub key: EncryptionKey,
    /// Encrypted span
    pub span: Span,
    /// Encrypted payload, padded to a full chunk
    pub data: Vec<u8>,
}

fn span_encryption(key: &EncryptionKey) -> Encryption<'_> {
    Encryption::new(key, 0, SPAN_INIT_COUNTER)
}

fn data_encryption(key: &EncryptionKey) -> Encryption<'_> {
    Encryption::new(key, CHUNK_SIZE, 0)
}

/// Encrypt a span and payload, using `key` or a fresh random key.
pub fn encrypt(span: &Span, data: &[u8], key: Option<EncryptionKey>) -> Result<EncryptedParts> {
    let key = key.unwrap_or_else(EncryptionKey::random);

    let mut encrypted_span = [0u8; SPAN_SIZE];
    encrypted_span.copy_from_slice(&span_encryption(&key).encrypt(span)?);
    let data = data_encryption(&key).encrypt(data)?;

    Ok(EncryptedParts {
        key,
        span: encrypted_span,
        data,
    })
}

/// Encrypt a chunk, returning the key and the encrypted chunk.
pub fn encrypt_chunk(
    chunk: &ContentChunk,
    key: Option<EncryptionKey>,
) -> Result<(EncryptionKey, ContentChunk)> {
    let parts = encrypt(&chunk.span_bytes(), chunk.data(), key)?;
    let encrypted = ContentChunk::with_span_bytes(parts.span, parts.data)?;
    Ok((parts.key, encrypted))
}

/// Decrypt an encrypted chunk.
///
/// The payload length is recovered from the decrypted span; intermediate
/// chunks hold one `reference_size` entry per child.
pub fn decrypt_chunk(
    chunk: &ContentChunk,
    key: &EncryptionKey,
    reference_size: usize,
) -> Result<ContentChunk> {
    let mut span = [0u8; SPAN_SIZE];
    span.copy_from_slice(&span_encryption(key).decrypt(&chunk.span_bytes())?);

    let length = data_length(span_to_len(&span), reference_size);
    let mut data = vec![0u8; length];
    crate::decrypt(chunk.data(), key, 0, &mut data)?;

    Ok(ContentChunk::with_span_bytes(span, data)?)
}

/// Payload length of a chunk with the given span.
///
/// Leaves hold `span` bytes. A parent holds one reference per child subtree;
/// the child count is found by repeatedly dividing the span by the chunk size.
pub fn data_length(span: u64, reference_size: usize) -> usize {
    let chunk_size = CHUNK_SIZE as u64;
    let mut length = span;
    while length > chunk_size {
        length = length.div_ceil(chunk_size) * reference_size as u64;
    }
    length as usize
}
