//! Records of issued stamps.

use dashmap::{DashMap, mapref::entry::Entry};
use vertex_swarm_primitives::ChunkAddress;

use crate::batch::BatchId;
use crate::error::Result;
use crate::stamp::StampIndex;

/// The slot a chunk holds in a batch and when it was last stamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StampRecord {
    /// Slot in the batch
    pub index: StampIndex,
    /// Unix time of the latest stamp in nanoseconds
    pub timestamp: u64,
}

/// Persists one [`StampRecord`] per `(batch, chunk)` pair.
///
/// Stamping a chunk twice with the same batch must reuse its slot, so the
/// lookup and the insert of a new record happen atomically.
pub trait StampStore: Send + Sync {
    /// Refresh the timestamp of an existing record, or call `issue` for a
    /// fresh slot and record it.
    fn get_or_issue<F>(
        &self,
        batch_id: &BatchId,
        address: &ChunkAddress,
        timestamp: u64,
        issue: F,
    ) -> Result<StampRecord>
    where
        F: FnOnce() -> Result<StampIndex>;

    /// The record for a pair, if any.
    fn get(&self, batch_id: &BatchId, address: &ChunkAddress) -> Option<StampRecord>;

    /// Number of records.
    fn len(&self) -> usize;

    /// Whether the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory [`StampStore`].
#[derive(Debug, Default)]
pub struct MemoryStampStore {
    records: DashMap<(BatchId, ChunkAddress), StampRecord>,
}

impl MemoryStampStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StampStore for MemoryStampStore {
    fn get_or_issue<F>(
        &self,
        batch_id: &BatchId,
        address: &ChunkAddress,
        timestamp: u64,
        issue: F,
    ) -> Result<StampRecord>
    where
        F: FnOnce() -> Result<StampIndex>,
    {
        match self.records.entry((*batch_id, *address)) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().timestamp = timestamp;
                Ok(*entry.get())
            }
            Entry::Vacant(entry) => {
                let record = StampRecord {
                    index: issue()?,
                    timestamp,
                };
                entry.insert(record);
                Ok(record)
            }
        }
    }

    fn get(&self, batch_id: &BatchId, address: &ChunkAddress) -> Option<StampRecord> {
        self.records.get(&(*batch_id, *address)).map(|r| *r)
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PostageError;
    use alloy_primitives::B256;

    #[test]
    fn test_reuses_index_and_refreshes_timestamp() {
        let store = MemoryStampStore::new();
        let batch = B256::repeat_byte(1);
        let address = B256::repeat_byte(2);

        let first = store
            .get_or_issue(&batch, &address, 10, || Ok(StampIndex::new(1, 0)))
            .unwrap();
        let second = store
            .get_or_issue(&batch, &address, 20, || panic!("slot issued twice"))
            .unwrap();

        assert_eq!(first.index, second.index);
        assert_eq!(second.timestamp, 20);
        assert_eq!(store.get(&batch, &address), Some(second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_batches_are_separate() {
        let store = MemoryStampStore::new();
        let address = B256::repeat_byte(2);

        store
            .get_or_issue(&B256::repeat_byte(1), &address, 0, || Ok(StampIndex::new(0, 0)))
            .unwrap();
        store
            .get_or_issue(&B256::repeat_byte(3), &address, 0, || Ok(StampIndex::new(0, 5)))
            .unwrap();

        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_failed_issue_records_nothing() {
        let store = MemoryStampStore::new();
        let result = store.get_or_issue(&B256::ZERO, &B256::ZERO, 0, || {
            Err(PostageError::BatchOverflow { bucket: 0, limit: 1 })
        });

        assert!(matches!(result, Err(PostageError::BatchOverflow { .. })));
        assert!(store.is_empty());
    }
}
