//! Bucket accounting for a batch.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};
use vertex_swarm_primitives::ChunkAddress;

use crate::batch::PostageBatch;
use crate::error::{PostageError, Result};
use crate::stamp::StampIndex;

#[derive(Debug)]
struct Buckets {
    counts: Box<[u32]>,
    max_bucket_count: u32,
}

/// Issues slots of a batch, one bucket counter per collision bucket.
///
/// All counters sit behind one lock. When a bucket of a mutable batch fills
/// up it wraps to slot zero and the issuer is flagged saturated for good;
/// immutable batches refuse instead.
#[derive(Debug)]
pub struct PostageStampIssuer {
    batch: PostageBatch,
    buckets: Mutex<Buckets>,
    saturated: AtomicBool,
}

impl PostageStampIssuer {
    /// Create an issuer with all buckets empty.
    pub fn new(batch: PostageBatch) -> Self {
        let counts = vec![0u32; batch.bucket_count()].into_boxed_slice();
        Self {
            batch,
            buckets: Mutex::new(Buckets {
                counts,
                max_bucket_count: 0,
            }),
            saturated: AtomicBool::new(false),
        }
    }

    /// The batch this issuer spends.
    pub fn batch(&self) -> &PostageBatch {
        &self.batch
    }

    /// Claim the next slot in the bucket of `address`.
    pub fn increment_bucket_count(&self, address: &ChunkAddress) -> Result<StampIndex> {
        let bucket = StampIndex::bucket_of(address, self.batch.bucket_depth());
        let upper_bound = self.batch.bucket_upper_bound();

        let mut buckets = self.buckets.lock();
        let Some(count) = buckets.counts.get_mut(bucket as usize) else {
            return Err(PostageError::InvalidStamp("bucket out of range"));
        };

        if u64::from(*count) >= upper_bound {
            if self.batch.immutable() {
                return Err(PostageError::BatchOverflow {
                    bucket,
                    limit: upper_bound,
                });
            }

            *count = 0;
            metrics::counter!("postage_bucket_wraps_total").increment(1);
            if !self.saturated.swap(true, Ordering::Relaxed) {
                warn!(batch_id = %self.batch.id(), bucket, "batch saturated, bucket wrapped");
            }
        }

        let slot = *count;
        *count += 1;
        let next = *count;
        buckets.max_bucket_count = buckets.max_bucket_count.max(next);

        debug!(%address, bucket, slot, "issued stamp index");
        Ok(StampIndex::new(bucket, slot))
    }

    /// Slots used in `bucket`.
    pub fn bucket_count(&self, bucket: u32) -> Option<u32> {
        self.buckets.lock().counts.get(bucket as usize).copied()
    }

    /// Highest slot count reached by any bucket.
    pub fn max_bucket_count(&self) -> u32 {
        self.buckets.lock().max_bucket_count
    }

    /// Fraction of the fullest bucket in use, in `[0, 1]`.
    pub fn utilization(&self) -> f64 {
        self.max_bucket_count() as f64 / self.batch.bucket_upper_bound() as f64
    }

    /// Whether any bucket has wrapped.
    pub fn is_saturated(&self) -> bool {
        self.saturated.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256, b256};
    use std::sync::Arc;

    fn batch(immutable: bool) -> PostageBatch {
        PostageBatch::builder()
            .with_owner(Address::ZERO)
            .with_id(B256::ZERO)
            .with_depths(18, 16)
            .unwrap()
            .with_immutable(immutable)
            .build()
    }

    fn address_in_bucket(bucket: u16, tail: u8) -> ChunkAddress {
        let mut address = ChunkAddress::repeat_byte(tail);
        address[..2].copy_from_slice(&bucket.to_be_bytes());
        address
    }

    #[test]
    fn test_slots_are_sequential_per_bucket() {
        let issuer = PostageStampIssuer::new(batch(false));

        let a = issuer.increment_bucket_count(&address_in_bucket(5, 1)).unwrap();
        let b = issuer.increment_bucket_count(&address_in_bucket(5, 2)).unwrap();
        let c = issuer.increment_bucket_count(&address_in_bucket(6, 1)).unwrap();

        assert_eq!(a, StampIndex::new(5, 0));
        assert_eq!(b, StampIndex::new(5, 1));
        assert_eq!(c, StampIndex::new(6, 0));
        assert_eq!(a.to_bytes(), [0, 0, 0, 5, 0, 0, 0, 0]);
        assert_eq!(issuer.bucket_count(5), Some(2));
        assert_eq!(issuer.max_bucket_count(), 2);
        assert_eq!(issuer.utilization(), 0.5);
    }

    #[test]
    fn test_immutable_overflows_at_upper_bound() {
        let issuer = PostageStampIssuer::new(batch(true));
        let address = b256!("0007000000000000000000000000000000000000000000000000000000000000");

        for slot in 0..4 {
            let index = issuer.increment_bucket_count(&address).unwrap();
            assert_eq!(index.slot(), slot);
        }

        assert!(matches!(
            issuer.increment_bucket_count(&address),
            Err(PostageError::BatchOverflow { bucket: 7, limit: 4 })
        ));
        assert!(!issuer.is_saturated());
        assert_eq!(issuer.bucket_count(7), Some(4));
    }

    #[test]
    fn test_mutable_wraps_and_saturates() {
        let issuer = PostageStampIssuer::new(batch(false));
        let address = address_in_bucket(9, 0);

        for _ in 0..4 {
            issuer.increment_bucket_count(&address).unwrap();
        }
        assert!(!issuer.is_saturated());

        let wrapped = issuer.increment_bucket_count(&address).unwrap();
        assert_eq!(wrapped, StampIndex::new(9, 0));
        assert!(issuer.is_saturated());
        assert_eq!(issuer.max_bucket_count(), 4);

        // Saturation is sticky.
        issuer.increment_bucket_count(&address).unwrap();
        assert!(issuer.is_saturated());
    }

    #[test]
    fn test_concurrent_issuing_hands_out_distinct_slots() {
        let issuer = Arc::new(PostageStampIssuer::new(batch(true)));
        let address = address_in_bucket(1, 0);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let issuer = issuer.clone();
                std::thread::spawn(move || issuer.increment_bucket_count(&address).unwrap())
            })
            .collect();

        let mut slots: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().unwrap().slot())
            .collect();
        slots.sort_unstable();
        assert_eq!(slots, [0, 1, 2, 3]);
    }
}
