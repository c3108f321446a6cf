//! Streaming chunker.

use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;
use vertex_swarm_postage::Stamper;
use vertex_swarm_primitives::constants::CHUNK_SIZE;
use vertex_swarm_primitives::{ChunkReference, EncryptionKey};
use vertex_swarm_storer::ChunkStore;

use crate::args::{EncryptionKind, FeederArgs, default_concurrency};
use crate::error::Result;
use crate::pipeline::{ChunkTasks, Keys, Pipeline, Slots};
use crate::trie;

/// Encryption applied by a [`ChunkFeeder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EncryptionMode {
    /// Plain chunks with 32-byte references.
    #[default]
    None,
    /// Every chunk encrypted under one key, random unless given. The tree
    /// has the same 64-byte reference layout as [`Self::Recursive`].
    Shared(Option<EncryptionKey>),
    /// Every chunk encrypted under its own random key. Intermediate chunks
    /// hold 64-byte `address ++ key` references.
    Recursive,
}

impl From<EncryptionKind> for EncryptionMode {
    fn from(kind: EncryptionKind) -> Self {
        match kind {
            EncryptionKind::None => Self::None,
            EncryptionKind::Shared => Self::Shared(None),
            EncryptionKind::Recursive => Self::Recursive,
        }
    }
}

impl EncryptionMode {
    fn keys(self) -> Keys {
        match self {
            Self::None => Keys::Plain,
            Self::Shared(key) => Keys::Shared(key.unwrap_or_else(EncryptionKey::random)),
            Self::Recursive => Keys::PerChunk,
        }
    }
}

/// Splits a byte stream into chunks and stores them, returning the root.
///
/// Leaves are read in order and handed to background tasks, at most
/// `concurrency` at a time. The feeder waits for a free slot before reading
/// on. The root reference depends only on the input bytes (and keys), never
/// on the order in which chunks finish.
pub struct ChunkFeeder<S> {
    store: Arc<S>,
    concurrency: usize,
    encryption: EncryptionMode,
    stamper: Option<Arc<dyn Stamper>>,
}

impl<S: ChunkStore + 'static> ChunkFeeder<S> {
    /// A plain feeder over `store` with one slot per logical CPU.
    pub fn new(store: S) -> Self {
        Self::from_shared(Arc::new(store))
    }

    /// A plain feeder over a shared store.
    pub fn from_shared(store: Arc<S>) -> Self {
        Self {
            store,
            concurrency: default_concurrency(),
            encryption: EncryptionMode::None,
            stamper: None,
        }
    }

    /// A feeder configured by `args`.
    pub fn from_args(store: S, args: &FeederArgs) -> Self {
        Self::new(store)
            .with_concurrency(args.concurrency)
            .with_encryption(args.encryption.into())
    }

    /// Set the number of chunks processed at once. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the encryption mode.
    pub fn with_encryption(mut self, encryption: EncryptionMode) -> Self {
        self.encryption = encryption;
        self
    }

    /// Stamp every chunk before it is stored.
    pub fn with_stamper(mut self, stamper: Arc<dyn Stamper>) -> Self {
        self.stamper = Some(stamper);
        self
    }

    /// The target store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Chunk, store and reference everything `reader` yields.
    ///
    /// Empty input produces a single empty chunk.
    pub async fn feed<R: AsyncRead + Unpin>(&self, mut reader: R) -> Result<ChunkReference> {
        let pipeline = Pipeline::new(
            self.store.clone(),
            self.stamper.clone(),
            self.encryption.keys(),
            self.concurrency,
        );

        let mut tasks = ChunkTasks::new();
        let mut leaves = Slots::default();
        let mut total = 0u64;

        loop {
            let mut buf = Vec::with_capacity(CHUNK_SIZE);
            (&mut reader).take(CHUNK_SIZE as u64).read_to_end(&mut buf).await?;

            let len = buf.len();
            if len == 0 && total > 0 {
                break;
            }
            total += len as u64;

            let index = leaves.reserve();
            pipeline.submit(&mut tasks, index, len as u64, buf.into()).await?;
            leaves.fill_ready(&mut tasks)?;

            if len < CHUNK_SIZE {
                break;
            }
        }

        leaves.fill_all(&mut tasks).await?;
        let leaves = leaves.into_entries()?;
        debug!(bytes = total, leaves = leaves.len(), "read input");

        let root = trie::build_root(&pipeline, leaves).await?;
        let reference = pipeline.reference(&root);
        debug!(address = %reference.address(), bytes = total, "fed content");
        Ok(reference)
    }

    /// Chunk, store and reference an in-memory buffer.
    pub async fn feed_bytes(&self, data: &[u8]) -> Result<ChunkReference> {
        self.feed(data).await
    }
}
