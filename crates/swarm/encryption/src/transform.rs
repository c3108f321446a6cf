//! Counter-mode keystream transform.
//!
//! The keystream for 32-byte block `i` is
//! `keccak256(keccak256(key ++ le32(init_counter + i)))`. Encryption and
//! decryption are the same XOR; blocks are independent and transformed on the
//! rayon pool.

use alloy_primitives::{B256, Keccak256, keccak256};
use rand::RngCore;
use rayon::prelude::*;
use vertex_swarm_primitives::EncryptionKey;
use vertex_swarm_primitives::constants::SEGMENT_SIZE;

use crate::error::{EncryptionError, Result};

/// A keyed transform with an optional fixed output size.
#[derive(Debug, Clone, Copy)]
pub struct Encryption<'a> {
    key: &'a EncryptionKey,
    padding: usize,
    init_counter: u32,
}

impl<'a> Encryption<'a> {
    /// Create a transform. With a non-zero `padding`, ciphertexts are exactly
    /// `padding` bytes and the tail past the plaintext is random.
    pub const fn new(key: &'a EncryptionKey, padding: usize, init_counter: u32) -> Self {
        Self {
            key,
            padding,
            init_counter,
        }
    }

    /// Encrypt `data`, padding it if configured.
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        let out_len = if self.padding > 0 {
            if data.len() > self.padding {
                return Err(EncryptionError::InvalidInput {
                    size: data.len(),
                    limit: self.padding,
                });
            }
            self.padding
        } else {
            data.len()
        };

        let mut out = vec![0u8; out_len];
        let (body, tail) = out.split_at_mut(data.len());
        transcrypt(self.key, self.init_counter, data, body);
        rand::rng().fill_bytes(tail);
        Ok(out)
    }

    /// Decrypt a whole ciphertext, padding included.
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        if self.padding > 0 && data.len() != self.padding {
            return Err(EncryptionError::InvalidInput {
                size: data.len(),
                limit: self.padding,
            });
        }

        let mut out = vec![0u8; data.len()];
        transcrypt(self.key, self.init_counter, data, &mut out);
        Ok(out)
    }
}

/// Decrypt the first `out.len()` bytes of `data` into `out`.
pub fn decrypt(data: &[u8], key: &EncryptionKey, init_counter: u32, out: &mut [u8]) -> Result<()> {
    let input = data
        .get(..out.len())
        .ok_or(EncryptionError::InvalidInput {
            size: out.len(),
            limit: data.len(),
        })?;
    transcrypt(key, init_counter, input, out);
    Ok(())
}

fn transcrypt(key: &EncryptionKey, init_counter: u32, input: &[u8], out: &mut [u8]) {
    out.par_chunks_mut(SEGMENT_SIZE)
        .zip(input.par_chunks(SEGMENT_SIZE))
        .enumerate()
        .for_each(|(i, (out, input))| {
            let segment_key = segment_key(key, init_counter.wrapping_add(i as u32));
            for ((o, b), k) in out.iter_mut().zip(input).zip(segment_key.iter()) {
                *o = b ^ k;
            }
        });
}

fn segment_key(key: &EncryptionKey, counter: u32) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(key);
    hasher.update(counter.to_le_bytes());
    keccak256(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::hex;
    use proptest::prelude::*;

    fn test_key() -> EncryptionKey {
        let mut raw = [0u8; 32];
        raw.iter_mut().enumerate().for_each(|(i, b)| *b = i as u8);
        EncryptionKey::from(raw)
    }

    #[test]
    fn test_keystream_vector() {
        let key = test_key();
        let encrypted = Encryption::new(&key, 0, 0).encrypt(b"hello world").unwrap();
        assert_eq!(encrypted, hex!("a4540ab417b8d2c82dccf3"));
    }

    #[test]
    fn test_multi_block_vector() {
        let key = test_key();
        let data: Vec<u8> = (0..70).map(|i| (i % 255) as u8).collect();
        let encrypted = Encryption::new(&key, 0, 0).encrypt(&data).unwrap();
        assert_eq!(
            encrypted,
            hex!(
                "cc3064db7c9da3a057a99de6d080b42e5e6281fe36ef00c1b008bcd252fc190c\
                 6e3c80cd91ddda3dd89f79c23d30390afb5a6e03c9d3eb0dc59641ea5f616e26\
                 50252049e8ee"
            )
        );
    }

    #[test]
    fn test_padding() {
        let key = test_key();
        let encryption = Encryption::new(&key, 4096, 0);

        let encrypted = encryption.encrypt(b"hello world").unwrap();
        assert_eq!(encrypted.len(), 4096);
        assert_eq!(&encrypted[..11], hex!("a4540ab417b8d2c82dccf3"));

        let decrypted = encryption.decrypt(&encrypted).unwrap();
        assert_eq!(&decrypted[..11], b"hello world");

        assert!(encryption.encrypt(&[0u8; 4097]).is_err());
        assert!(encryption.decrypt(&[0u8; 100]).is_err());
    }

    #[test]
    fn test_decrypt_prefix_into_buffer() {
        let key = test_key();
        let encrypted = Encryption::new(&key, 4096, 0).encrypt(b"hello world").unwrap();

        let mut out = [0u8; 5];
        decrypt(&encrypted, &key, 0, &mut out).unwrap();
        assert_eq!(&out, b"hello");

        let mut too_long = vec![0u8; 4097];
        assert!(decrypt(&encrypted, &key, 0, &mut too_long).is_err());
    }

    proptest! {
        #[test]
        fn proptest_round_trip(
            data in prop::collection::vec(any::<u8>(), 0..=4096),
            raw_key in any::<[u8; 32]>(),
            counter in any::<u32>(),
        ) {
            let key = EncryptionKey::from(raw_key);
            let encryption = Encryption::new(&key, 0, counter);
            let encrypted = encryption.encrypt(&data).unwrap();
            prop_assert_eq!(encryption.decrypt(&encrypted).unwrap(), data);
        }
    }
}
