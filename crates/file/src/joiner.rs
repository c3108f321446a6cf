//! Reassembly of fed content.

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt, TryStreamExt, stream};
use std::sync::Arc;
use tracing::trace;
use vertex_swarm_encryption::{data_length, decrypt_chunk};
use vertex_swarm_primitives::constants::CHUNK_SIZE;
use vertex_swarm_primitives::{ChunkAddress, ChunkReference, ContentChunk, EncryptionKey};
use vertex_swarm_storer::ChunkStore;

use crate::args::default_concurrency;
use crate::error::{FileError, Result};

/// Shape of the tree below a root reference.
#[derive(Debug, Clone, Copy)]
struct Layout {
    reference_size: usize,
    shared_key: Option<EncryptionKey>,
}

impl Layout {
    fn of(reference: &ChunkReference) -> Self {
        Self {
            reference_size: reference.child_reference_size(),
            shared_key: reference
                .encryption_key()
                .filter(|_| !reference.is_recursive())
                .copied(),
        }
    }

    /// Child references held by an intermediate chunk.
    fn children(&self, chunk: &ContentChunk) -> Result<Vec<(ChunkAddress, Option<EncryptionKey>)>> {
        let data = chunk.data();
        if data.len() != data_length(chunk.span(), self.reference_size) {
            return Err(FileError::InvalidTree {
                address: chunk.address(),
                reason: "reference count does not match span",
            });
        }

        data.chunks(self.reference_size)
            .map(|entry| {
                let child = ChunkReference::from_bytes(entry)?;
                let key = child.encryption_key().copied().or(self.shared_key);
                Ok((child.address(), key))
            })
            .collect()
    }
}

/// Reads content back from a root reference through any chunk store.
///
/// Sibling subtrees are fetched concurrently, up to `concurrency` per
/// intermediate chunk. Encrypted trees are decrypted on the way.
pub struct Joiner<S> {
    store: Arc<S>,
    concurrency: usize,
}

impl<S: ChunkStore> Joiner<S> {
    /// A joiner over `store`.
    pub fn new(store: S) -> Self {
        Self::from_shared(Arc::new(store))
    }

    /// A joiner over a shared store.
    pub fn from_shared(store: Arc<S>) -> Self {
        Self {
            store,
            concurrency: default_concurrency(),
        }
    }

    /// Set how many siblings are fetched at once. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Total content length under `reference`, read from the root chunk.
    pub async fn size(&self, reference: &ChunkReference) -> Result<u64> {
        let layout = Layout::of(reference);
        let root = self
            .chunk(reference.address(), reference.encryption_key().copied(), layout)
            .await?;
        Ok(root.span())
    }

    /// The content under `reference`.
    pub async fn join(&self, reference: &ChunkReference) -> Result<Bytes> {
        let layout = Layout::of(reference);
        let data = self
            .subtree(reference.address(), reference.encryption_key().copied(), layout)
            .await?;
        Ok(data.into())
    }

    fn subtree(
        &self,
        address: ChunkAddress,
        key: Option<EncryptionKey>,
        layout: Layout,
    ) -> BoxFuture<'_, Result<Vec<u8>>> {
        async move {
            let chunk = self.chunk(address, key, layout).await?;
            let span = chunk.span();

            if span <= CHUNK_SIZE as u64 {
                if chunk.data().len() as u64 != span {
                    return Err(FileError::SpanMismatch {
                        address,
                        expected: span,
                        got: chunk.data().len() as u64,
                    });
                }
                return Ok(chunk.data().to_vec());
            }

            let children = layout.children(&chunk)?;
            trace!(%address, span, children = children.len(), "joining intermediate chunk");

            let parts: Vec<Vec<u8>> = stream::iter(children)
                .map(|(child, key)| self.subtree(child, key, layout))
                .buffered(self.concurrency)
                .try_collect()
                .await?;

            let data = parts.concat();
            if data.len() as u64 != span {
                return Err(FileError::SpanMismatch {
                    address,
                    expected: span,
                    got: data.len() as u64,
                });
            }
            Ok(data)
        }
        .boxed()
    }

    /// Fetch, verify and decrypt one chunk.
    async fn chunk(
        &self,
        address: ChunkAddress,
        key: Option<EncryptionKey>,
        layout: Layout,
    ) -> Result<ContentChunk> {
        let chunk = self.store.get(&address).await?;
        chunk.verify(address)?;
        let chunk = chunk.into_content();

        match key {
            Some(key) => Ok(decrypt_chunk(&chunk, &key, layout.reference_size)?),
            None => Ok(chunk),
        }
    }
}
