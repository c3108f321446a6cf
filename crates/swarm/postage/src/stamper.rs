//! Stamp signing.

use alloy_signer::Signer;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::trace;
use vertex_swarm_primitives::ChunkAddress;

use crate::error::{PostageError, Result};
use crate::issuer::PostageStampIssuer;
use crate::stamp::{PostageStamp, StampDigest};
use crate::store::{MemoryStampStore, StampStore};

/// Issues signed stamps for chunk addresses.
#[async_trait]
pub trait Stamper: Send + Sync {
    /// Stamp the chunk at `address`.
    async fn stamp(&self, address: &ChunkAddress) -> Result<PostageStamp>;
}

#[async_trait]
impl<T: Stamper + ?Sized> Stamper for Arc<T> {
    async fn stamp(&self, address: &ChunkAddress) -> Result<PostageStamp> {
        (**self).stamp(address).await
    }
}

/// Current Unix time in nanoseconds.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

/// Stamps chunks with one batch, signing as the batch owner.
#[derive(Debug)]
pub struct BatchStamper<S, St = MemoryStampStore> {
    issuer: Arc<PostageStampIssuer>,
    store: St,
    signer: S,
}

impl<S: Signer + Send + Sync> BatchStamper<S> {
    /// Create a stamper with an in-memory record store.
    pub fn new(issuer: Arc<PostageStampIssuer>, signer: S) -> Result<Self> {
        Self::with_store(issuer, MemoryStampStore::new(), signer)
    }
}

impl<S, St> BatchStamper<S, St>
where
    S: Signer + Send + Sync,
    St: StampStore,
{
    /// Create a stamper over `store`. The signer must own the batch.
    pub fn with_store(issuer: Arc<PostageStampIssuer>, store: St, signer: S) -> Result<Self> {
        let owner = issuer.batch().owner();
        if signer.address() != owner {
            return Err(PostageError::OwnerMismatch {
                expected: owner,
                got: signer.address(),
            });
        }

        Ok(Self {
            issuer,
            store,
            signer,
        })
    }

    /// The issuer.
    pub fn issuer(&self) -> &Arc<PostageStampIssuer> {
        &self.issuer
    }

    /// The record store.
    pub fn store(&self) -> &St {
        &self.store
    }
}

#[async_trait]
impl<S, St> Stamper for BatchStamper<S, St>
where
    S: Signer + Send + Sync,
    St: StampStore,
{
    async fn stamp(&self, address: &ChunkAddress) -> Result<PostageStamp> {
        let batch_id = *self.issuer.batch().id();
        let record = self
            .store
            .get_or_issue(&batch_id, address, current_timestamp(), || {
                self.issuer.increment_bucket_count(address)
            })?;

        let digest = StampDigest {
            address: *address,
            batch_id,
            index: record.index,
            timestamp: record.timestamp,
        };
        let signature = self.signer.sign_message(digest.to_sign().as_slice()).await?;

        metrics::counter!("postage_stamps_issued_total").increment(1);
        trace!(%address, bucket = record.index.bucket(), slot = record.index.slot(), "stamped chunk");

        Ok(PostageStamp::new(
            batch_id,
            record.index,
            record.timestamp,
            signature,
        ))
    }
}
