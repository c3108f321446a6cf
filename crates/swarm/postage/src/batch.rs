//! Postage batches.
//!
//! A batch is prepaid storage: `2^depth` chunks, spread over
//! `2^bucket_depth` collision buckets of `2^(depth - bucket_depth)` slots.
//! Batches are built with a typestate builder so an owner, an id and the
//! depths are always present.

use alloy_primitives::{Address, B256, Keccak256};
use alloy_signer::Signer;
use std::marker::PhantomData;
use vertex_swarm_primitives::constants::CHUNK_SIZE;

use crate::error::{PostageError, Result};

/// Identifier of a batch.
pub type BatchId = B256;

/// Smallest bucket depth accepted by the builder.
pub const MIN_BUCKET_DEPTH: u8 = 16;

/// Largest bucket depth accepted by the builder.
///
/// The issuer keeps one counter per bucket and bucket indices are 32 bits.
pub const MAX_BUCKET_DEPTH: u8 = 24;

/// Largest `depth - bucket_depth`, so slot counters fit a `u32`.
pub const MAX_BUCKET_SLOT_DEPTH: u8 = 31;

/// Largest depth a batch may have.
pub const MAX_DEPTH: u8 = 63;

/// A postage batch.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "BatchConfig"))]
pub struct PostageBatch {
    /// Unique identifier, generally `H(owner ++ nonce)`.
    id: BatchId,
    /// The address that signs stamps for the batch.
    owner: Address,
    /// log2 of the number of chunks the batch pays for.
    depth: u8,
    /// Number of leading address bits that pick a bucket.
    bucket_depth: u8,
    /// Whether full buckets reject new chunks instead of wrapping.
    immutable: bool,
}

impl PostageBatch {
    /// Start building a batch.
    pub fn builder() -> BatchBuilder<Initial> {
        BatchBuilder::new()
    }

    /// The batch id.
    pub fn id(&self) -> &BatchId {
        &self.id
    }

    /// The batch owner.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// The batch depth.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// The bucket depth.
    pub fn bucket_depth(&self) -> u8 {
        self.bucket_depth
    }

    /// Whether the batch is immutable.
    pub fn immutable(&self) -> bool {
        self.immutable
    }

    /// Number of collision buckets (`2^bucket_depth`).
    pub const fn bucket_count(&self) -> usize {
        1usize << self.bucket_depth
    }

    /// Slots per bucket (`2^(depth - bucket_depth)`).
    #[must_use]
    pub const fn bucket_upper_bound(&self) -> u64 {
        1u64 << (self.depth - self.bucket_depth)
    }

    /// Number of chunks a batch of `depth` pays for.
    pub const fn chunks(depth: u8) -> u64 {
        1u64 << depth
    }

    /// Number of bytes a batch of `depth` may hold.
    pub const fn size(depth: u8) -> u64 {
        Self::chunks(depth) * CHUNK_SIZE as u64
    }

    /// Smallest depth holding `size` bytes. Empty data still needs one chunk.
    #[must_use]
    pub fn depth_for_size(size: u64) -> u8 {
        let chunks = size.div_ceil(CHUNK_SIZE as u64).max(1);
        chunks.next_power_of_two().trailing_zeros() as u8
    }
}

/// Marker trait for builder states
pub trait BuilderState {}

/// No fields set.
#[derive(Debug)]
pub struct Initial;
impl BuilderState for Initial {}

/// Owner set.
#[derive(Debug)]
pub struct WithOwner;
impl BuilderState for WithOwner {}

/// Owner and id set.
#[derive(Debug)]
pub struct WithId;
impl BuilderState for WithId {}

/// Everything set.
#[derive(Debug)]
pub struct WithSize;
impl BuilderState for WithSize {}

#[derive(Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
struct BatchConfig {
    id: BatchId,
    owner: Address,
    depth: u8,
    bucket_depth: u8,
    immutable: bool,
}

/// Unchecked batch fields, e.g. as deserialized, go through the builder's
/// depth checks.
impl TryFrom<BatchConfig> for PostageBatch {
    type Error = PostageError;

    fn try_from(config: BatchConfig) -> Result<Self> {
        Ok(BatchBuilder::new()
            .with_owner(config.owner)
            .with_id(config.id)
            .with_depths(config.depth, config.bucket_depth)?
            .with_immutable(config.immutable)
            .build())
    }
}

/// A typestate builder for [`PostageBatch`].
#[derive(Debug)]
pub struct BatchBuilder<S: BuilderState> {
    config: BatchConfig,
    _state: PhantomData<S>,
}

impl<S: BuilderState> BatchBuilder<S> {
    /// Set whether the batch is immutable.
    pub fn with_immutable(mut self, immutable: bool) -> Self {
        self.config.immutable = immutable;
        self
    }

    fn transition<T: BuilderState>(self) -> BatchBuilder<T> {
        BatchBuilder {
            config: self.config,
            _state: PhantomData,
        }
    }
}

impl Default for BatchBuilder<Initial> {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchBuilder<Initial> {
    /// Create a builder in the initial state.
    pub fn new() -> Self {
        Self {
            config: BatchConfig::default(),
            _state: PhantomData,
        }
    }

    /// Set the owner.
    pub fn with_owner(mut self, owner: Address) -> BatchBuilder<WithOwner> {
        self.config.owner = owner;
        self.transition()
    }

    /// Set the owner to the signer's address.
    pub fn with_signer(self, signer: &impl Signer) -> BatchBuilder<WithOwner> {
        self.with_owner(signer.address())
    }
}

impl BatchBuilder<WithOwner> {
    /// Set the batch id.
    pub fn with_id(mut self, id: BatchId) -> BatchBuilder<WithId> {
        self.config.id = id;
        self.transition()
    }

    /// Derive the id as the contract does: `keccak256(abi.encode(owner, nonce))`.
    pub fn with_id_derived_from_nonce(self, nonce: B256) -> BatchBuilder<WithId> {
        let mut hasher = Keccak256::new();
        hasher.update(self.config.owner.into_word());
        hasher.update(nonce);
        let id = hasher.finalize();
        self.with_id(id)
    }
}

impl BatchBuilder<WithId> {
    /// Pick the smallest depth holding `size_bytes`, with the minimum bucket depth.
    pub fn auto_size(self, size_bytes: u64) -> Result<BatchBuilder<WithSize>> {
        if size_bytes == 0 {
            return Err(PostageError::SizeTooSmall);
        }

        let depth = PostageBatch::depth_for_size(size_bytes).max(MIN_BUCKET_DEPTH);
        self.with_depths(depth, MIN_BUCKET_DEPTH)
    }

    /// Set depth and bucket depth.
    ///
    /// Fails if `bucket_depth` is outside [`MIN_BUCKET_DEPTH`]..=[`MAX_BUCKET_DEPTH`]
    /// or above `depth`, if `depth` exceeds [`MAX_DEPTH`], or if a bucket would
    /// hold more than `2^MAX_BUCKET_SLOT_DEPTH` slots.
    pub fn with_depths(mut self, depth: u8, bucket_depth: u8) -> Result<BatchBuilder<WithSize>> {
        if depth > MAX_DEPTH {
            return Err(PostageError::InvalidDepth(depth));
        }

        if bucket_depth > depth
            || !(MIN_BUCKET_DEPTH..=MAX_BUCKET_DEPTH).contains(&bucket_depth)
        {
            return Err(PostageError::InvalidBucketDepth(bucket_depth));
        }

        if depth - bucket_depth > MAX_BUCKET_SLOT_DEPTH {
            return Err(PostageError::InvalidDepth(depth));
        }

        self.config.depth = depth;
        self.config.bucket_depth = bucket_depth;
        Ok(self.transition())
    }
}

impl BatchBuilder<WithSize> {
    /// Build the batch.
    pub fn build(self) -> PostageBatch {
        let BatchConfig {
            id,
            owner,
            depth,
            bucket_depth,
            immutable,
        } = self.config;

        PostageBatch {
            id,
            owner,
            depth,
            bucket_depth,
            immutable,
        }
    }
}
