//! Per-chunk processing shared by the leaf and intermediate levels.

use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::trace;
use vertex_swarm_encryption::encrypt_chunk;
use vertex_swarm_postage::Stamper;
use vertex_swarm_primitives::constants::{CHUNK_SIZE, ENCRYPTED_REFERENCE_SIZE, REFERENCE_SIZE};
use vertex_swarm_primitives::{ChunkAddress, ChunkReference, ContentChunk, EncryptionKey};
use vertex_swarm_storer::ChunkStore;

use crate::error::{FileError, Result};

/// How chunk keys are chosen for one upload.
///
/// Encrypted trees always carry `address ++ key` child references, so a
/// 64-byte root reference describes the whole tree.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Keys {
    Plain,
    Shared(EncryptionKey),
    PerChunk,
}

/// A processed chunk as seen by its parent.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Entry {
    pub(crate) address: ChunkAddress,
    pub(crate) key: Option<EncryptionKey>,
    pub(crate) span: u64,
}

pub(crate) type ChunkTasks = JoinSet<(usize, Result<Entry>)>;

/// Encrypts, stamps and stores chunks, at most `gate` permits at a time.
pub(crate) struct Pipeline<S> {
    store: Arc<S>,
    stamper: Option<Arc<dyn Stamper>>,
    keys: Keys,
    gate: Arc<Semaphore>,
}

impl<S> Clone for Pipeline<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            stamper: self.stamper.clone(),
            keys: self.keys,
            gate: self.gate.clone(),
        }
    }
}

impl<S: ChunkStore + 'static> Pipeline<S> {
    pub(crate) fn new(
        store: Arc<S>,
        stamper: Option<Arc<dyn Stamper>>,
        keys: Keys,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            stamper,
            keys,
            gate: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Number of children an intermediate chunk holds.
    pub(crate) fn branches(&self) -> usize {
        CHUNK_SIZE / self.reference_size()
    }

    fn reference_size(&self) -> usize {
        match self.keys {
            Keys::Plain => REFERENCE_SIZE,
            Keys::Shared(_) | Keys::PerChunk => ENCRYPTED_REFERENCE_SIZE,
        }
    }

    /// The reference to `entry`, inside its parent chunk or as the root.
    pub(crate) fn reference(&self, entry: &Entry) -> ChunkReference {
        match entry.key {
            Some(key) => ChunkReference::encrypted(entry.address, key, true),
            None => ChunkReference::new(entry.address),
        }
    }

    /// Wait for a gate permit, then process the chunk in the background.
    ///
    /// Only the caller waits on the gate; the result lands in `tasks` tagged
    /// with `index`.
    pub(crate) async fn submit(
        &self,
        tasks: &mut ChunkTasks,
        index: usize,
        span: u64,
        data: Bytes,
    ) -> Result<()> {
        let permit = self
            .gate
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| FileError::GateClosed)?;

        let pipeline = self.clone();
        tasks.spawn(async move {
            let result = pipeline.process(span, data).await;
            drop(permit);
            (index, result)
        });
        Ok(())
    }

    async fn process(&self, span: u64, data: Bytes) -> Result<Entry> {
        let chunk = ContentChunk::with_span(span, data)?;
        let (chunk, key) = match self.keys {
            Keys::Plain => (chunk, None),
            Keys::Shared(key) => {
                let (key, encrypted) = encrypt_chunk(&chunk, Some(key))?;
                (encrypted, Some(key))
            }
            Keys::PerChunk => {
                let (key, encrypted) = encrypt_chunk(&chunk, None)?;
                (encrypted, Some(key))
            }
        };

        let address = chunk.address();
        let stamp = match &self.stamper {
            Some(stamper) => Some(stamper.stamp(&address).await?),
            None => None,
        };
        self.store.put(chunk.into(), stamp).await?;

        metrics::counter!("file_chunks_processed_total").increment(1);
        trace!(%address, span, "processed chunk");
        Ok(Entry { address, key, span })
    }
}

/// Write-once result slots of one level, in input order.
#[derive(Debug, Default)]
pub(crate) struct Slots {
    entries: Vec<Option<Entry>>,
}

impl Slots {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Reserve the next slot, returning its index.
    pub(crate) fn reserve(&mut self) -> usize {
        self.entries.push(None);
        self.entries.len() - 1
    }

    /// Append an entry that needs no processing.
    pub(crate) fn push(&mut self, entry: Entry) {
        self.entries.push(Some(entry));
    }

    /// Record a finished task, propagating its failure.
    pub(crate) fn fill(
        &mut self,
        joined: std::result::Result<(usize, Result<Entry>), JoinError>,
    ) -> Result<()> {
        let (index, result) = joined?;
        let entry = result?;
        let slot = self
            .entries
            .get_mut(index)
            .ok_or(FileError::MissingChunk(index))?;
        *slot = Some(entry);
        Ok(())
    }

    /// Drain every task of `tasks` into the slots.
    pub(crate) async fn fill_all(&mut self, tasks: &mut ChunkTasks) -> Result<()> {
        while let Some(joined) = tasks.join_next().await {
            self.fill(joined)?;
        }
        Ok(())
    }

    /// Drain the tasks of `tasks` that are already done.
    pub(crate) fn fill_ready(&mut self, tasks: &mut ChunkTasks) -> Result<()> {
        while let Some(joined) = tasks.try_join_next() {
            self.fill(joined)?;
        }
        Ok(())
    }

    pub(crate) fn into_entries(self) -> Result<Vec<Entry>> {
        self.entries
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(FileError::MissingChunk(index)))
            .collect()
    }
}
