//! Chunk storage for vertex Swarm clients.
//!
//! - [`ChunkStore`] - async get/put/exists over chunks
//! - [`MemoryChunkStore`] - in-memory implementation
//! - [`StoreError`] - errors, with misses and cancellation kept apart

mod error;
mod memory;
mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryChunkStore;
pub use traits::ChunkStore;
