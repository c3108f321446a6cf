//! Streaming file chunking for Swarm.
//!
//! [`ChunkFeeder`] turns a byte stream into a tree of content chunks: 4096-byte
//! leaves under intermediate chunks of references, stored (and optionally
//! encrypted and stamped) through a [`ChunkStore`](vertex_swarm_storer::ChunkStore).
//! [`Joiner`] walks the tree back into bytes.

mod args;
mod error;
mod feeder;
mod joiner;
mod pipeline;
mod trie;

pub use args::{EncryptionKind, FeederArgs, default_concurrency};
pub use error::{FileError, Result};
pub use feeder::{ChunkFeeder, EncryptionMode};
pub use joiner::Joiner;
