//! Intermediate levels of the chunk tree.
//!
//! Each level groups the references of the level below into parents of up to
//! `branches` entries. A trailing group with a single entry is carried up
//! unchanged rather than wrapped in a parent of its own.

use bytes::BytesMut;
use tracing::debug;
use vertex_swarm_storer::ChunkStore;

use crate::error::{FileError, Result};
use crate::pipeline::{ChunkTasks, Entry, Pipeline, Slots};

/// Build parents over `level` until a single root entry is left.
pub(crate) async fn build_root<S: ChunkStore + 'static>(
    pipeline: &Pipeline<S>,
    mut level: Vec<Entry>,
) -> Result<Entry> {
    let branches = pipeline.branches();
    let mut height = 0;

    while level.len() > 1 {
        height += 1;
        let mut tasks = ChunkTasks::new();
        let mut slots = Slots::with_capacity(level.len().div_ceil(branches));

        for group in level.chunks(branches) {
            if let [single] = group {
                slots.push(*single);
                continue;
            }

            let span = group.iter().map(|entry| entry.span).sum();
            let mut data = BytesMut::new();
            for entry in group {
                data.extend_from_slice(&pipeline.reference(entry).to_bytes());
            }

            let index = slots.reserve();
            pipeline.submit(&mut tasks, index, span, data.freeze()).await?;
        }

        slots.fill_all(&mut tasks).await?;
        level = slots.into_entries()?;
        debug!(height, chunks = level.len(), "built tree level");
    }

    level.pop().ok_or(FileError::MissingChunk(0))
}
