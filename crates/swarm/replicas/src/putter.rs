//! Write-time replication.

use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::debug;
use vertex_swarm_postage::{PostageStamp, Stamper};
use vertex_swarm_primitives::{
    AnyChunk, ChunkAddress, ContentChunk, RedundancyLevel, SingleOwnerChunk,
};
use vertex_swarm_storer::{ChunkStore, StoreResult};

use crate::generator::ReplicaGenerator;

/// Chunk store decorator that writes the dispersed replicas of every content
/// chunk next to the chunk itself.
///
/// Replicas are stamped separately when a stamper is configured, since each
/// replica lives at its own address.
pub struct ReplicaPutter<S> {
    inner: S,
    level: RedundancyLevel,
    stamper: Option<Arc<dyn Stamper>>,
}

impl<S: ChunkStore> ReplicaPutter<S> {
    /// Replicate puts into `inner` at `level`.
    pub fn new(inner: S, level: RedundancyLevel) -> Self {
        Self {
            inner,
            level,
            stamper: None,
        }
    }

    /// Stamp replicas with `stamper`.
    pub fn with_stamper(mut self, stamper: Arc<dyn Stamper>) -> Self {
        self.stamper = Some(stamper);
        self
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Store the replicas of `chunk`, returning how many were newly stored.
    pub async fn put_replicas(&self, chunk: &ContentChunk) -> StoreResult<usize> {
        let replicas = ReplicaGenerator::new(chunk.address(), self.level).replicas();
        let puts = replicas.into_iter().map(|replica| async move {
            let soc = SingleOwnerChunk::new_dispersed_replica(replica.id_prefix(), chunk.clone())
                .await?;
            let stamp = match &self.stamper {
                Some(stamper) => Some(stamper.stamp(&replica.address).await?),
                None => None,
            };
            self.inner.put(soc.into(), stamp).await
        });

        let stored = try_join_all(puts).await?.into_iter().filter(|&new| new).count();
        debug!(address = %chunk.address(), level = %self.level, stored, "stored replicas");
        Ok(stored)
    }
}

#[async_trait]
impl<S: ChunkStore> ChunkStore for ReplicaPutter<S> {
    async fn get(&self, address: &ChunkAddress) -> StoreResult<AnyChunk> {
        self.inner.get(address).await
    }

    async fn put(&self, chunk: AnyChunk, stamp: Option<PostageStamp>) -> StoreResult<bool> {
        let content = match &chunk {
            AnyChunk::Content(content) if self.level != RedundancyLevel::None => {
                Some(content.clone())
            }
            _ => None,
        };

        let stored = self.inner.put(chunk, stamp).await?;
        if let Some(content) = content {
            self.put_replicas(&content).await?;
        }
        Ok(stored)
    }

    async fn exists(&self, address: &ChunkAddress) -> StoreResult<bool> {
        self.inner.exists(address).await
    }
}
