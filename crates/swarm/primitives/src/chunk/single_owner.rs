//! Single-owner chunks.
//!
//! A single-owner chunk (SOC) wraps a content chunk under an address chosen by
//! its owner: `keccak256(id ++ owner)`. The owner signs
//! `keccak256(id ++ inner_address)`, and is recovered from that signature.

use alloy_primitives::{Address, B256, Keccak256, Signature, address, b256};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use bytes::{BufMut, Bytes, BytesMut};
use std::sync::OnceLock;

use super::content::ContentChunk;
use super::error::{ChunkError, Result};
use crate::ChunkAddress;
use crate::constants::{ID_SIZE, SIGNATURE_SIZE};

const MIN_SOC_FIELDS_SIZE: usize = ID_SIZE + SIGNATURE_SIZE;

/// Owner of dispersed replica chunks.
///
/// The key pair is public: anybody may write replicas, and the id rule in
/// [`SingleOwnerChunk::verify`] keeps them bound to the chunk they copy.
pub const DISPERSED_REPLICA_OWNER: Address = address!("0xdc5b20847f43d67928f49cd4f85d696b5a7617b5");

/// Private key of [`DISPERSED_REPLICA_OWNER`].
pub const DISPERSED_REPLICA_OWNER_PK: B256 =
    b256!("0x0100000000000000000000000000000000000000000000000000000000000000");

/// A chunk addressed by its identifier and owner.
#[derive(Debug, Clone)]
pub struct SingleOwnerChunk {
    id: B256,
    signature: Signature,
    inner: ContentChunk,
    cached_owner: OnceLock<Address>,
}

impl PartialEq for SingleOwnerChunk {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.signature == other.signature && self.inner == other.inner
    }
}

impl Eq for SingleOwnerChunk {}

impl SingleOwnerChunk {
    /// Wrap `inner` under `id`, signed by `signer`.
    pub async fn new<S>(id: B256, inner: ContentChunk, signer: &S) -> Result<Self>
    where
        S: Signer + Send + Sync,
    {
        let digest = Self::to_sign(id, inner.address());
        let signature = signer.sign_message(digest.as_slice()).await?;

        let chunk = Self::new_signed_unchecked(id, signature, inner);
        // The signer is known, skip recovery.
        let _ = chunk.cached_owner.set(signer.address());
        Ok(chunk)
    }

    /// Assemble a chunk from an existing signature without checking it.
    pub fn new_signed_unchecked(id: B256, signature: Signature, inner: ContentChunk) -> Self {
        Self {
            id,
            signature,
            inner,
            cached_owner: OnceLock::new(),
        }
    }

    /// Build a dispersed replica of `inner`.
    ///
    /// The id is the inner address with its first byte replaced by
    /// `first_byte`, signed with the public replica key.
    pub async fn new_dispersed_replica(first_byte: u8, inner: ContentChunk) -> Result<Self> {
        let mut id = inner.address();
        id[0] = first_byte;

        let signer = PrivateKeySigner::from_bytes(&DISPERSED_REPLICA_OWNER_PK)
            .map_err(alloy_signer::Error::other)?;
        Self::new(id, inner, &signer).await
    }

    /// The address a chunk with `id` signed by `owner` lives at.
    pub fn address_for(id: &B256, owner: &Address) -> ChunkAddress {
        let mut hasher = Keccak256::new();
        hasher.update(id);
        hasher.update(owner);
        hasher.finalize()
    }

    fn to_sign(id: B256, inner_address: ChunkAddress) -> B256 {
        let mut hasher = Keccak256::new();
        hasher.update(id);
        hasher.update(inner_address);
        hasher.finalize()
    }

    /// The identifier.
    pub fn id(&self) -> B256 {
        self.id
    }

    /// The owner's signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The wrapped content chunk.
    pub fn inner(&self) -> &ContentChunk {
        &self.inner
    }

    /// Unwrap into the content chunk.
    pub fn into_inner(self) -> ContentChunk {
        self.inner
    }

    /// The owner recovered from the signature, or the zero address if the
    /// signature does not recover.
    pub fn owner(&self) -> Address {
        *self.cached_owner.get_or_init(|| {
            let digest = Self::to_sign(self.id, self.inner.address());
            self.signature
                .recover_address_from_msg(digest)
                .unwrap_or(Address::ZERO)
        })
    }

    /// The chunk address.
    pub fn address(&self) -> ChunkAddress {
        Self::address_for(&self.id, &self.owner())
    }

    /// Whether this chunk is signed by the replica owner.
    pub fn is_dispersed_replica(&self) -> bool {
        self.owner() == DISPERSED_REPLICA_OWNER
    }

    fn is_valid_replica(&self) -> bool {
        self.id.get(1..) == self.inner.address().get(1..)
    }

    /// Check the chunk against the address it was requested under.
    ///
    /// Replicas must additionally carry an id derived from the inner address.
    pub fn verify(&self, expected: ChunkAddress) -> Result<()> {
        if self.is_dispersed_replica() && !self.is_valid_replica() {
            return Err(ChunkError::InvalidReplica);
        }

        let actual = self.address();
        if actual != expected {
            return Err(ChunkError::verification(
                "address mismatch",
                expected,
                actual,
            ));
        }
        Ok(())
    }

    /// Size of the wire form.
    pub fn size(&self) -> usize {
        MIN_SOC_FIELDS_SIZE + self.inner.size()
    }

    /// Serialize to the wire form `id ++ signature ++ span ++ data`.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.size());
        buf.put_slice(self.id.as_slice());
        buf.put_slice(&self.signature.as_bytes());
        buf.put_slice(&self.inner.to_bytes());
        buf.freeze()
    }

    /// Parse the wire form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_SOC_FIELDS_SIZE {
            return Err(ChunkError::size(
                "insufficient data",
                bytes.len(),
                MIN_SOC_FIELDS_SIZE,
            ));
        }

        let (id, rest) = bytes.split_at(ID_SIZE);
        let (signature, body) = rest.split_at(SIGNATURE_SIZE);

        Ok(Self::new_signed_unchecked(
            B256::from_slice(id),
            Signature::try_from(signature)?,
            ContentChunk::from_bytes(body)?,
        ))
    }
}

impl From<SingleOwnerChunk> for Bytes {
    fn from(chunk: SingleOwnerChunk) -> Self {
        chunk.to_bytes()
    }
}

impl TryFrom<&[u8]> for SingleOwnerChunk {
    type Error = ChunkError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}
