//! Chunk types.
//!
//! Chunks are the unit of storage and retrieval. Every chunk kind knows its
//! own address and how to check itself against a requested address.

mod content;
pub mod error;
mod single_owner;

pub use content::ContentChunk;
pub use error::{ChunkError, Result as ChunkResult};
pub use single_owner::{DISPERSED_REPLICA_OWNER, DISPERSED_REPLICA_OWNER_PK, SingleOwnerChunk};

use bytes::Bytes;

use crate::ChunkAddress;

/// Any chunk that can be stored or retrieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyChunk {
    /// Content-addressed chunk
    Content(ContentChunk),
    /// Single-owner chunk
    SingleOwner(SingleOwnerChunk),
}

impl AnyChunk {
    /// The chunk address.
    pub fn address(&self) -> ChunkAddress {
        match self {
            Self::Content(chunk) => chunk.address(),
            Self::SingleOwner(chunk) => chunk.address(),
        }
    }

    /// Check the chunk against the address it was requested under.
    pub fn verify(&self, expected: ChunkAddress) -> ChunkResult<()> {
        match self {
            Self::Content(chunk) => chunk.verify(expected),
            Self::SingleOwner(chunk) => chunk.verify(expected),
        }
    }

    /// The content chunk carried by this chunk.
    pub fn content(&self) -> &ContentChunk {
        match self {
            Self::Content(chunk) => chunk,
            Self::SingleOwner(chunk) => chunk.inner(),
        }
    }

    /// Unwrap into the carried content chunk.
    pub fn into_content(self) -> ContentChunk {
        match self {
            Self::Content(chunk) => chunk,
            Self::SingleOwner(chunk) => chunk.into_inner(),
        }
    }

    /// Size of the wire form.
    pub fn size(&self) -> usize {
        match self {
            Self::Content(chunk) => chunk.size(),
            Self::SingleOwner(chunk) => chunk.size(),
        }
    }

    /// Serialize the chunk.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Self::Content(chunk) => chunk.to_bytes(),
            Self::SingleOwner(chunk) => chunk.to_bytes(),
        }
    }
}

impl From<ContentChunk> for AnyChunk {
    fn from(chunk: ContentChunk) -> Self {
        Self::Content(chunk)
    }
}

impl From<SingleOwnerChunk> for AnyChunk {
    fn from(chunk: SingleOwnerChunk) -> Self {
        Self::SingleOwner(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_content_of_replica_is_original() {
        let original = ContentChunk::new(b"payload".to_vec()).unwrap();
        let replica = SingleOwnerChunk::new_dispersed_replica(0x10, original.clone())
            .await
            .unwrap();

        let any = AnyChunk::from(replica);
        assert_ne!(any.address(), original.address());
        assert_eq!(any.content(), &original);
        assert_eq!(any.into_content(), original);
    }
}
