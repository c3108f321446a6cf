//! Chunk encryption for Swarm.
//!
//! Chunks are encrypted with a Keccak-256 counter-mode keystream. The
//! ciphertext of a chunk is itself a valid content chunk: its address is the
//! BMT hash of the encrypted span and the padded, encrypted payload.
//!
//! - [`Encryption`] - the raw keyed transform
//! - [`encrypt_chunk`] / [`decrypt_chunk`] - whole chunk transforms
//! - [`data_length`] - payload length recovery from a decrypted span

mod chunk;
mod error;
mod transform;

pub use chunk::{
    EncryptedParts, SPAN_INIT_COUNTER, data_length, decrypt_chunk, encrypt, encrypt_chunk,
};
pub use error::{EncryptionError, Result};
pub use transform::{Encryption, decrypt};
