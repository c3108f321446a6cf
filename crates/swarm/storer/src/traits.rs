//! Chunk storage backend trait.
//!
//! The [`ChunkStore`] trait abstracts over where chunks live: a local
//! database, a remote node, or memory for testing. Stores compose as
//! decorators, e.g. a replica-resolving store over a network store.

use async_trait::async_trait;
use std::sync::Arc;
use vertex_swarm_postage::PostageStamp;
use vertex_swarm_primitives::{AnyChunk, ChunkAddress};

use crate::StoreResult;

/// Chunk storage backend trait.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Get a chunk.
    ///
    /// Fails with [`StoreError::NotFound`](crate::StoreError::NotFound) if the
    /// chunk doesn't exist.
    async fn get(&self, address: &ChunkAddress) -> StoreResult<AnyChunk>;

    /// Store a chunk with an optional postage stamp.
    ///
    /// Returns `true` if the chunk was newly stored and `false` if it was
    /// already present.
    async fn put(&self, chunk: AnyChunk, stamp: Option<PostageStamp>) -> StoreResult<bool>;

    /// Check if a chunk exists.
    async fn exists(&self, address: &ChunkAddress) -> StoreResult<bool>;
}

#[async_trait]
impl<T: ChunkStore + ?Sized> ChunkStore for Arc<T> {
    async fn get(&self, address: &ChunkAddress) -> StoreResult<AnyChunk> {
        (**self).get(address).await
    }

    async fn put(&self, chunk: AnyChunk, stamp: Option<PostageStamp>) -> StoreResult<bool> {
        (**self).put(chunk, stamp).await
    }

    async fn exists(&self, address: &ChunkAddress) -> StoreResult<bool> {
        (**self).exists(address).await
    }
}
