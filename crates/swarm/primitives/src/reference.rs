use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::ChunkAddress;
use crate::constants::{ENCRYPTED_REFERENCE_SIZE, ENCRYPTION_KEY_SIZE, REFERENCE_SIZE};

/// Errors parsing a [`ChunkReference`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReferenceError {
    /// Not 32 or 64 bytes long
    #[error("invalid reference length: {0}")]
    InvalidLength(usize),

    /// Not valid hex
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Symmetric key of an encrypted chunk.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncryptionKey([u8; ENCRYPTION_KEY_SIZE]);

impl EncryptionKey {
    /// A fresh random key.
    pub fn random() -> Self {
        Self(rand::random())
    }

    /// The raw key bytes.
    pub const fn as_bytes(&self) -> &[u8; ENCRYPTION_KEY_SIZE] {
        &self.0
    }
}

impl From<[u8; ENCRYPTION_KEY_SIZE]> for EncryptionKey {
    fn from(bytes: [u8; ENCRYPTION_KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for EncryptionKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}

/// Reference to the root of a split.
///
/// Plain references are a bare address. Encrypted references also carry the
/// root key; `recursive` tells whether the intermediate chunks hold 64-byte
/// `address ++ key` entries or 32-byte addresses under one shared key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkReference {
    address: ChunkAddress,
    key: Option<EncryptionKey>,
    recursive: bool,
}

impl ChunkReference {
    /// A plain, unencrypted reference.
    pub const fn new(address: ChunkAddress) -> Self {
        Self {
            address,
            key: None,
            recursive: false,
        }
    }

    /// An encrypted reference.
    pub const fn encrypted(address: ChunkAddress, key: EncryptionKey, recursive: bool) -> Self {
        Self {
            address,
            key: Some(key),
            recursive,
        }
    }

    /// The root chunk address.
    pub const fn address(&self) -> ChunkAddress {
        self.address
    }

    /// The root key, if encrypted.
    pub const fn encryption_key(&self) -> Option<&EncryptionKey> {
        self.key.as_ref()
    }

    /// Whether intermediate chunks carry per-child keys.
    pub const fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Size of one entry in an intermediate chunk of this tree.
    pub const fn child_reference_size(&self) -> usize {
        if self.recursive {
            ENCRYPTED_REFERENCE_SIZE
        } else {
            REFERENCE_SIZE
        }
    }

    /// Serialize as `address` or `address ++ key`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.address.to_vec();
        if let Some(key) = &self.key {
            bytes.extend_from_slice(key.as_bytes());
        }
        bytes
    }

    /// Parse `address` or `address ++ key`.
    ///
    /// A 64-byte reference is taken to be recursively encrypted, which is the
    /// only encrypted form that exchanges references as raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ReferenceError> {
        match bytes.len() {
            REFERENCE_SIZE => Ok(Self::new(ChunkAddress::from_slice(bytes))),
            ENCRYPTED_REFERENCE_SIZE => {
                let (address, key) = bytes.split_at(REFERENCE_SIZE);
                let mut raw = [0u8; ENCRYPTION_KEY_SIZE];
                raw.copy_from_slice(key);
                Ok(Self::encrypted(
                    ChunkAddress::from_slice(address),
                    EncryptionKey(raw),
                    true,
                ))
            }
            len => Err(ReferenceError::InvalidLength(len)),
        }
    }
}

impl From<ChunkAddress> for ChunkReference {
    fn from(address: ChunkAddress) -> Self {
        Self::new(address)
    }
}

impl fmt::Display for ChunkReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl FromStr for ChunkReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        Self::from_bytes(&hex::decode(s)?)
    }
}
