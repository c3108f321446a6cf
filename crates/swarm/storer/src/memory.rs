//! In-memory chunk store.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::trace;
use vertex_swarm_postage::PostageStamp;
use vertex_swarm_primitives::{AnyChunk, ChunkAddress};

use crate::{ChunkStore, StoreError, StoreResult};

#[derive(Debug, Clone)]
struct StoredChunk {
    chunk: AnyChunk,
    stamp: Option<PostageStamp>,
}

/// Chunk store backed by a hash map.
///
/// The first write of an address wins; later writes are no-ops.
#[derive(Debug, Default)]
pub struct MemoryChunkStore {
    chunks: RwLock<HashMap<ChunkAddress, StoredChunk>>,
}

impl MemoryChunkStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.chunks.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.chunks.read().is_empty()
    }

    /// The stamp a chunk was stored with.
    pub fn stamp(&self, address: &ChunkAddress) -> Option<PostageStamp> {
        self.chunks
            .read()
            .get(address)
            .and_then(|stored| stored.stamp.clone())
    }

    /// Addresses of all stored chunks, in ascending order.
    pub fn addresses(&self) -> Vec<ChunkAddress> {
        let mut addresses: Vec<_> = self.chunks.read().keys().copied().collect();
        addresses.sort_unstable();
        addresses
    }

    /// Remove a chunk, returning whether it was present.
    pub fn remove(&self, address: &ChunkAddress) -> bool {
        self.chunks.write().remove(address).is_some()
    }
}

#[async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn get(&self, address: &ChunkAddress) -> StoreResult<AnyChunk> {
        self.chunks
            .read()
            .get(address)
            .map(|stored| stored.chunk.clone())
            .ok_or(StoreError::NotFound(*address))
    }

    async fn put(&self, chunk: AnyChunk, stamp: Option<PostageStamp>) -> StoreResult<bool> {
        let address = chunk.address();
        let mut chunks = self.chunks.write();
        if chunks.contains_key(&address) {
            return Ok(false);
        }

        trace!(%address, stamped = stamp.is_some(), "stored chunk");
        chunks.insert(address, StoredChunk { chunk, stamp });
        Ok(true)
    }

    async fn exists(&self, address: &ChunkAddress) -> StoreResult<bool> {
        Ok(self.chunks.read().contains_key(address))
    }
}
