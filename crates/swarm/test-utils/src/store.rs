//! Instrumented chunk store.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;
use vertex_swarm_postage::PostageStamp;
use vertex_swarm_primitives::{AnyChunk, ChunkAddress};
use vertex_swarm_storer::{ChunkStore, MemoryChunkStore, StoreError, StoreResult};

/// One recorded `get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedGet {
    /// When the lookup started, on the tokio clock.
    pub at: Instant,
    /// The requested address.
    pub address: ChunkAddress,
}

/// Chunk store wrapper that records every `get`.
///
/// Hidden addresses answer `NotFound` while staying in the inner store, which
/// simulates an unreachable original. An optional latency delays each `get`.
#[derive(Debug, Default)]
pub struct RecordingStore<S = MemoryChunkStore> {
    inner: S,
    hidden: Mutex<HashSet<ChunkAddress>>,
    gets: Mutex<Vec<RecordedGet>>,
    latency: Option<Duration>,
}

impl<S: ChunkStore> RecordingStore<S> {
    /// Wrap `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            hidden: Mutex::default(),
            gets: Mutex::default(),
            latency: None,
        }
    }

    /// Delay every `get` by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Answer `NotFound` for `address` from now on.
    pub fn hide(&self, address: ChunkAddress) {
        self.hidden.lock().insert(address);
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// All lookups so far, in order.
    pub fn gets(&self) -> Vec<RecordedGet> {
        self.gets.lock().clone()
    }

    /// Number of lookups so far.
    pub fn get_count(&self) -> usize {
        self.gets.lock().len()
    }

    /// Number of lookups that started within `window` of `start`.
    pub fn gets_within(&self, start: Instant, window: Duration) -> usize {
        self.gets
            .lock()
            .iter()
            .filter(|get| get.at.duration_since(start) <= window)
            .count()
    }
}

#[async_trait]
impl<S: ChunkStore> ChunkStore for RecordingStore<S> {
    async fn get(&self, address: &ChunkAddress) -> StoreResult<AnyChunk> {
        self.gets.lock().push(RecordedGet {
            at: Instant::now(),
            address: *address,
        });
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.hidden.lock().contains(address) {
            return Err(StoreError::NotFound(*address));
        }
        self.inner.get(address).await
    }

    async fn put(&self, chunk: AnyChunk, stamp: Option<PostageStamp>) -> StoreResult<bool> {
        self.inner.put(chunk, stamp).await
    }

    async fn exists(&self, address: &ChunkAddress) -> StoreResult<bool> {
        if self.hidden.lock().contains(address) {
            return Ok(false);
        }
        self.inner.exists(address).await
    }
}
