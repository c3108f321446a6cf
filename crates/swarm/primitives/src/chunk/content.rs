//! Content-addressed chunks.
//!
//! A content chunk is an 8-byte little-endian span followed by at most
//! [`CHUNK_SIZE`] bytes of payload. Its address is `BMT(span, data)` and is
//! computed once, when the chunk is built.

use bytes::{BufMut, Bytes, BytesMut};

use super::error::{ChunkError, Result};
use crate::constants::{CHUNK_SIZE, SPAN_SIZE};
use crate::{ChunkAddress, Span, bmt_hash, span_from_len, span_to_len};

/// A content-addressed chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChunk {
    span: Span,
    data: Bytes,
    address: ChunkAddress,
}

impl ContentChunk {
    /// Create a leaf chunk whose span is the payload length.
    pub fn new(data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        Self::with_span(data.len() as u64, data)
    }

    /// Create a chunk with an explicit span, as used by intermediate chunks
    /// whose span covers the whole subtree.
    pub fn with_span(span: u64, data: impl Into<Bytes>) -> Result<Self> {
        Self::with_span_bytes(span_from_len(span), data)
    }

    /// Create a chunk from raw span bytes. Encrypted chunks carry a span that
    /// is not a meaningful length.
    pub fn with_span_bytes(span: Span, data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        if data.len() > CHUNK_SIZE {
            return Err(ChunkError::size(
                "data exceeds maximum chunk size",
                data.len(),
                CHUNK_SIZE,
            ));
        }

        let address = bmt_hash(&span, &data)?;
        Ok(Self {
            span,
            data,
            address,
        })
    }

    /// Parse the wire form `span ++ data`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (span, data) = bytes
            .split_first_chunk::<SPAN_SIZE>()
            .ok_or_else(|| ChunkError::size("missing span", bytes.len(), SPAN_SIZE))?;
        Self::with_span_bytes(*span, Bytes::copy_from_slice(data))
    }

    /// Serialize to the wire form `span ++ data`.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.size());
        buf.put_slice(&self.span);
        buf.put_slice(&self.data);
        buf.freeze()
    }

    /// The chunk address.
    pub fn address(&self) -> ChunkAddress {
        self.address
    }

    /// The span as a length.
    pub fn span(&self) -> u64 {
        span_to_len(&self.span)
    }

    /// The raw span bytes.
    pub fn span_bytes(&self) -> Span {
        self.span
    }

    /// The payload.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Size of the wire form.
    pub fn size(&self) -> usize {
        SPAN_SIZE + self.data.len()
    }

    /// Check the chunk against the address it was requested under.
    pub fn verify(&self, expected: ChunkAddress) -> Result<()> {
        if self.address != expected {
            return Err(ChunkError::verification(
                "address mismatch",
                expected,
                self.address,
            ));
        }
        Ok(())
    }
}

impl From<ContentChunk> for Bytes {
    fn from(chunk: ContentChunk) -> Self {
        chunk.to_bytes()
    }
}

impl TryFrom<&[u8]> for ContentChunk {
    type Error = ChunkError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;
    use proptest::prelude::*;

    #[test]
    fn test_new_uses_length_as_span() {
        let chunk = ContentChunk::new(vec![1u8, 2, 3]).unwrap();
        assert_eq!(chunk.span(), 3);
        assert_eq!(chunk.size(), 11);
        assert_eq!(
            chunk.address(),
            b256!("ca6357a08e317d15ec560fef34e4c45f8f19f01c372aa70f1da72bfa7f1a4338")
        );
    }

    #[test]
    fn test_oversized_rejected() {
        let result = ContentChunk::new(vec![0u8; CHUNK_SIZE + 1]);
        assert!(matches!(result, Err(ChunkError::Size { .. })));
    }

    #[test]
    fn test_from_bytes_requires_span() {
        assert!(matches!(
            ContentChunk::from_bytes(&[0u8; 7]),
            Err(ChunkError::Size { .. })
        ));

        let empty = ContentChunk::from_bytes(&[0u8; 8]).unwrap();
        assert_eq!(empty.span(), 0);
        assert!(empty.data().is_empty());
    }

    #[test]
    fn test_verify_detects_mismatch() {
        let chunk = ContentChunk::new(b"foo".to_vec()).unwrap();
        assert!(chunk.verify(chunk.address()).is_ok());
        assert!(matches!(
            chunk.verify(ChunkAddress::ZERO),
            Err(ChunkError::Verification { .. })
        ));
    }

    proptest! {
        #[test]
        fn proptest_wire_form(
            span in any::<u64>(),
            data in prop::collection::vec(any::<u8>(), 0..=CHUNK_SIZE),
        ) {
            let chunk = ContentChunk::with_span(span, data).unwrap();
            let decoded = ContentChunk::from_bytes(&chunk.to_bytes()).unwrap();
            prop_assert_eq!(decoded, chunk);
        }
    }
}
