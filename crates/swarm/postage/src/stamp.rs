//! Postage stamps.
//!
//! A stamp binds a chunk address to a slot of a batch. The owner signs
//! `keccak256(address ++ batch_id ++ index ++ timestamp)`; anybody holding the
//! batch can recover the signer and check the slot.

use alloy_primitives::{Address, B256, Keccak256, Signature};
use bytes::{BufMut, Bytes, BytesMut};
use vertex_swarm_primitives::ChunkAddress;
use vertex_swarm_primitives::constants::SIGNATURE_SIZE;

use crate::batch::{BatchId, PostageBatch};
use crate::error::{PostageError, Result};

const BATCH_ID_SIZE: usize = std::mem::size_of::<BatchId>();
const INDEX_SIZE: usize = StampIndex::SIZE;
const TIMESTAMP_SIZE: usize = std::mem::size_of::<u64>();

/// Size of a serialized stamp.
pub const STAMP_SIZE: usize = BATCH_ID_SIZE + INDEX_SIZE + TIMESTAMP_SIZE + SIGNATURE_SIZE;

/// Position of a stamp inside its batch: a bucket and a slot in that bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StampIndex {
    bucket: u32,
    slot: u32,
}

impl StampIndex {
    /// Size of the packed index.
    pub const SIZE: usize = 8;

    /// Create an index.
    pub const fn new(bucket: u32, slot: u32) -> Self {
        Self { bucket, slot }
    }

    /// The bucket a chunk address falls into: its leading `bucket_depth` bits.
    pub fn bucket_of(address: &ChunkAddress, bucket_depth: u8) -> u32 {
        let [a, b, c, d, ..] = address.0;
        let prefix = u32::from_be_bytes([a, b, c, d]);

        match bucket_depth {
            0 => 0,
            1..=32 => prefix >> (32 - u32::from(bucket_depth)),
            _ => prefix,
        }
    }

    /// The bucket.
    pub const fn bucket(&self) -> u32 {
        self.bucket
    }

    /// The slot within the bucket.
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Pack as `be32(bucket) ++ be32(slot)`.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        self.to_u64().to_be_bytes()
    }

    /// Unpack from `be32(bucket) ++ be32(slot)`.
    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        Self::from_u64(u64::from_be_bytes(bytes))
    }

    /// Pack into a `u64` with the bucket in the high half.
    pub const fn to_u64(&self) -> u64 {
        ((self.bucket as u64) << 32) | self.slot as u64
    }

    /// Unpack from a `u64` with the bucket in the high half.
    pub const fn from_u64(index: u64) -> Self {
        Self {
            bucket: (index >> 32) as u32,
            slot: index as u32,
        }
    }
}

/// The message a batch owner signs for a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampDigest {
    /// The stamped chunk
    pub address: ChunkAddress,
    /// The paying batch
    pub batch_id: BatchId,
    /// Slot in the batch
    pub index: StampIndex,
    /// Unix time in nanoseconds
    pub timestamp: u64,
}

impl StampDigest {
    /// `keccak256(address ++ batch_id ++ index ++ be64(timestamp))`.
    pub fn to_sign(&self) -> B256 {
        let mut hasher = Keccak256::new();
        hasher.update(self.address);
        hasher.update(self.batch_id);
        hasher.update(self.index.to_bytes());
        hasher.update(self.timestamp.to_be_bytes());
        hasher.finalize()
    }
}

/// A signed postage stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostageStamp {
    batch_id: BatchId,
    index: StampIndex,
    timestamp: u64,
    signature: Signature,
}

impl PostageStamp {
    /// Assemble a stamp.
    pub const fn new(
        batch_id: BatchId,
        index: StampIndex,
        timestamp: u64,
        signature: Signature,
    ) -> Self {
        Self {
            batch_id,
            index,
            timestamp,
            signature,
        }
    }

    /// The batch id.
    pub fn batch_id(&self) -> &BatchId {
        &self.batch_id
    }

    /// The slot in the batch.
    pub fn index(&self) -> StampIndex {
        self.index
    }

    /// Unix time of issue in nanoseconds.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The owner's signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The digest this stamp signs for `address`.
    pub fn digest(&self, address: ChunkAddress) -> StampDigest {
        StampDigest {
            address,
            batch_id: self.batch_id,
            index: self.index,
            timestamp: self.timestamp,
        }
    }

    /// Recover the signer of this stamp for `address`.
    pub fn recover_owner(&self, address: ChunkAddress) -> Result<Address> {
        let digest = self.digest(address).to_sign();
        Ok(self.signature.recover_address_from_msg(digest)?)
    }

    /// Check that this stamp is a valid stamp of `batch` for `address`.
    pub fn verify(&self, address: ChunkAddress, batch: &PostageBatch) -> Result<()> {
        if self.batch_id != *batch.id() {
            return Err(PostageError::InvalidStamp("batch id mismatch"));
        }

        if self.index.bucket() != StampIndex::bucket_of(&address, batch.bucket_depth()) {
            return Err(PostageError::InvalidStamp("bucket mismatch"));
        }

        if u64::from(self.index.slot()) >= batch.bucket_upper_bound() {
            return Err(PostageError::InvalidStamp("slot out of range"));
        }

        let owner = self.recover_owner(address)?;
        if owner != batch.owner() {
            return Err(PostageError::OwnerMismatch {
                expected: batch.owner(),
                got: owner,
            });
        }

        Ok(())
    }

    /// Serialize as `batch_id ++ index ++ be64(timestamp) ++ signature`.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(STAMP_SIZE);
        buf.put_slice(self.batch_id.as_slice());
        buf.put_slice(&self.index.to_bytes());
        buf.put_u64(self.timestamp);
        buf.put_slice(&self.signature.as_bytes());
        buf.freeze()
    }

    /// Parse the serialized form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != STAMP_SIZE {
            return Err(PostageError::IncorrectSize(bytes.len(), STAMP_SIZE));
        }

        let (batch_id, rest) = bytes.split_at(BATCH_ID_SIZE);
        let (index, rest) = rest.split_at(INDEX_SIZE);
        let (timestamp, signature) = rest.split_at(TIMESTAMP_SIZE);

        let mut index_bytes = [0u8; INDEX_SIZE];
        index_bytes.copy_from_slice(index);
        let mut timestamp_bytes = [0u8; TIMESTAMP_SIZE];
        timestamp_bytes.copy_from_slice(timestamp);

        Ok(Self {
            batch_id: BatchId::from_slice(batch_id),
            index: StampIndex::from_bytes(index_bytes),
            timestamp: u64::from_be_bytes(timestamp_bytes),
            signature: Signature::try_from(signature)?,
        })
    }
}

impl From<PostageStamp> for Bytes {
    fn from(stamp: PostageStamp) -> Self {
        stamp.to_bytes()
    }
}

impl TryFrom<&[u8]> for PostageStamp {
    type Error = PostageError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}
