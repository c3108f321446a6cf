//! Feeding content and joining it back.

use std::sync::Arc;
use std::time::Duration;

use vertex_file::{ChunkFeeder, EncryptionMode, FileError, Joiner};
use vertex_swarm_encryption::encrypt_chunk;
use vertex_swarm_primitives::{ChunkReference, ContentChunk, EncryptionKey, RedundancyLevel};
use vertex_swarm_replicas::{ReplicaPutter, ReplicaResolvingStore};
use vertex_swarm_storer::{ChunkStore, MemoryChunkStore, StoreError};
use vertex_swarm_test_utils::{RecordingStore, init_tracing, patterned_data};

async fn round_trip(len: usize, encryption: EncryptionMode) {
    init_tracing();
    let store = Arc::new(MemoryChunkStore::new());
    let data = patterned_data(len);

    let feeder = ChunkFeeder::from_shared(store.clone()).with_encryption(encryption);
    let reference = feeder.feed_bytes(&data).await.unwrap();

    let joiner = Joiner::from_shared(store).with_concurrency(3);
    assert_eq!(joiner.size(&reference).await.unwrap(), len as u64);
    let joined = joiner.join(&reference).await.unwrap();
    assert_eq!(joined.len(), len, "length {len}");
    assert!(joined.as_ref() == data.as_slice(), "content {len}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_plain_round_trip() {
    for len in [0, 1, 4096, 4097, 128 * 4096 + 1, 300_000] {
        round_trip(len, EncryptionMode::None).await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shared_key_round_trip() {
    for len in [0, 100, 4096, 8193, 129 * 4096] {
        round_trip(len, EncryptionMode::Shared(None)).await;
        round_trip(len, EncryptionMode::Shared(Some(EncryptionKey::random()))).await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_recursive_round_trip() {
    for len in [0, 5, 4096, 4097, 64 * 4096, 64 * 4096 + 1, 129 * 4096 + 1] {
        round_trip(len, EncryptionMode::Recursive).await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reference_survives_hex() {
    let store = Arc::new(MemoryChunkStore::new());
    let data = patterned_data(20_000);
    let reference = ChunkFeeder::from_shared(store.clone())
        .with_encryption(EncryptionMode::Recursive)
        .feed_bytes(&data)
        .await
        .unwrap();

    let parsed: ChunkReference = reference.to_string().parse().unwrap();
    assert_eq!(parsed, reference);
    let joined = Joiner::from_shared(store).join(&parsed).await.unwrap();
    assert!(joined.as_ref() == data.as_slice());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shared_key_reference_survives_hex() {
    let store = Arc::new(MemoryChunkStore::new());
    // 65 leaves: two levels under 64-way branching.
    let data = patterned_data(65 * 4096 + 10);
    let reference = ChunkFeeder::from_shared(store.clone())
        .with_encryption(EncryptionMode::Shared(None))
        .feed_bytes(&data)
        .await
        .unwrap();

    let parsed: ChunkReference = reference.to_string().parse().unwrap();
    assert_eq!(parsed, reference);
    let joined = Joiner::from_shared(store).join(&parsed).await.unwrap();
    assert!(joined.as_ref() == data.as_slice());
}

#[tokio::test]
async fn test_join_shared_key_tree_with_plain_children() {
    let store = Arc::new(MemoryChunkStore::new());
    let key = EncryptionKey::from([3u8; 32]);
    let data = patterned_data(2 * 4096);

    // Intermediate chunk holding bare addresses, everything under one key.
    let mut children = Vec::new();
    for part in data.chunks(4096) {
        let leaf = ContentChunk::new(part.to_vec()).unwrap();
        let (_, leaf) = encrypt_chunk(&leaf, Some(key)).unwrap();
        children.extend_from_slice(leaf.address().as_slice());
        store.put(leaf.into(), None).await.unwrap();
    }
    let parent = ContentChunk::with_span(data.len() as u64, children).unwrap();
    let (_, parent) = encrypt_chunk(&parent, Some(key)).unwrap();
    let reference = ChunkReference::encrypted(parent.address(), key, false);
    store.put(parent.into(), None).await.unwrap();

    let joiner = Joiner::from_shared(store);
    assert_eq!(joiner.size(&reference).await.unwrap(), data.len() as u64);
    let joined = joiner.join(&reference).await.unwrap();
    assert!(joined.as_ref() == data.as_slice());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_chunk_is_not_found() {
    let store = Arc::new(MemoryChunkStore::new());
    let reference = ChunkFeeder::from_shared(store.clone())
        .feed_bytes(&patterned_data(3 * 4096))
        .await
        .unwrap();

    let leaf = ContentChunk::new(patterned_data(4096)).unwrap().address();
    assert!(store.remove(&leaf));

    let err = Joiner::from_shared(store).join(&reference).await.unwrap_err();
    assert!(matches!(err, FileError::Store(StoreError::NotFound(address)) if address == leaf));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wrong_key_is_rejected() {
    let store = Arc::new(MemoryChunkStore::new());
    let reference = ChunkFeeder::from_shared(store.clone())
        .with_encryption(EncryptionMode::Shared(None))
        .feed_bytes(&patterned_data(10_000))
        .await
        .unwrap();

    let forged = ChunkReference::encrypted(reference.address(), EncryptionKey::random(), true);
    assert!(Joiner::from_shared(store).join(&forged).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_join_through_replicas() {
    init_tracing();
    let recording = Arc::new(RecordingStore::new(MemoryChunkStore::new()));
    let putter = ReplicaPutter::new(recording.clone(), RedundancyLevel::Medium);
    let data = patterned_data(5 * 4096);

    let reference = ChunkFeeder::new(putter)
        .with_concurrency(2)
        .feed_bytes(&data)
        .await
        .unwrap();

    // Every chunk of the tree plus two replicas each.
    assert_eq!(recording.inner().len(), 6 * 3);

    recording.hide(reference.address());
    let leaf = ContentChunk::new(patterned_data(4096)).unwrap().address();
    recording.hide(leaf);
    assert!(!recording.exists(&leaf).await.unwrap());

    let resolver = ReplicaResolvingStore::new(recording.clone(), RedundancyLevel::Medium)
        .with_round_delay(Duration::from_millis(100));
    let joined = Joiner::new(resolver).join(&reference).await.unwrap();
    assert!(joined.as_ref() == data.as_slice());
}
