//! Replica resolution against a recording store on a paused clock.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_signer_local::PrivateKeySigner;
use tokio::time::{Instant, sleep};
use vertex_swarm_postage::{BatchStamper, PostageBatch, PostageStampIssuer, Stamper};
use vertex_swarm_primitives::{
    AnyChunk, ContentChunk, DISPERSED_REPLICA_OWNER_PK, RedundancyLevel, SingleOwnerChunk,
};
use vertex_swarm_replicas::{ReplicaArgs, ReplicaGenerator, ReplicaPutter, ReplicaResolvingStore};
use vertex_swarm_storer::{ChunkStore, MemoryChunkStore, StoreError};
use vertex_swarm_test_utils::{RecordingStore, init_tracing, patterned_data, random_signer};

type Recording = Arc<RecordingStore<MemoryChunkStore>>;

fn recording() -> Recording {
    init_tracing();
    Arc::new(RecordingStore::new(MemoryChunkStore::new()))
}

fn content(len: usize) -> ContentChunk {
    ContentChunk::new(patterned_data(len)).unwrap()
}

/// Lookup counts keyed by milliseconds since `start`.
fn lookups_by_offset(store: &Recording, start: Instant) -> BTreeMap<u128, usize> {
    let mut offsets = BTreeMap::new();
    for get in store.gets() {
        *offsets
            .entry(get.at.duration_since(start).as_millis())
            .or_default() += 1;
    }
    offsets
}

async fn store_replicas_of_round(store: &Recording, chunk: &ContentChunk, round: usize) {
    let rounds = ReplicaGenerator::new(chunk.address(), RedundancyLevel::Paranoid).rounds();
    for replica in &rounds[round] {
        let soc = SingleOwnerChunk::new_dispersed_replica(replica.id_prefix(), chunk.clone())
            .await
            .unwrap();
        assert_eq!(soc.address(), replica.address);
        store.put(soc.into(), None).await.unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn test_escalates_every_round_delay_until_exhausted() {
    let store = recording();
    let resolver = ReplicaResolvingStore::new(store.clone(), RedundancyLevel::Paranoid);
    let address = content(100).address();

    let start = Instant::now();
    let err = resolver.get(&address).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(a) if a == address));

    let expected = BTreeMap::from([(0, 1), (500, 2), (1000, 2), (1500, 4), (2000, 8)]);
    assert_eq!(lookups_by_offset(&store, start), expected);
    // The last round gets one more delay before giving up.
    assert_eq!(Instant::now().duration_since(start), Duration::from_millis(2500));

    sleep(Duration::from_secs(5)).await;
    assert_eq!(store.get_count(), 17);
}

#[tokio::test(start_paused = true)]
async fn test_unresponsive_store_times_out() {
    init_tracing();
    let store = Arc::new(
        RecordingStore::new(MemoryChunkStore::new()).with_latency(Duration::from_secs(3600)),
    );
    let resolver = ReplicaResolvingStore::new(store.clone(), RedundancyLevel::Medium);
    let address = content(77).address();

    let start = Instant::now();
    let err = tokio::time::timeout(Duration::from_secs(60), resolver.get(&address))
        .await
        .expect("resolver must give up on its own")
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(a) if a == address));
    assert_eq!(Instant::now().duration_since(start), Duration::from_millis(1000));
    assert_eq!(
        lookups_by_offset(&store, start),
        BTreeMap::from([(0, 1), (500, 2)])
    );

    sleep(Duration::from_secs(7200)).await;
    assert_eq!(store.get_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_level_none_waits_for_slow_direct_lookup() {
    init_tracing();
    let store = Arc::new(
        RecordingStore::new(MemoryChunkStore::new()).with_latency(Duration::from_millis(600)),
    );
    let chunk = content(5);
    store.put(chunk.clone().into(), None).await.unwrap();
    let resolver = ReplicaResolvingStore::new(store.clone(), RedundancyLevel::None);

    let start = Instant::now();
    let found = resolver.get(&chunk.address()).await.unwrap();
    assert_eq!(found, AnyChunk::Content(chunk));
    assert_eq!(Instant::now().duration_since(start), Duration::from_millis(600));
    assert_eq!(store.get_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_level_none_slow_miss_is_not_found() {
    init_tracing();
    let store = Arc::new(
        RecordingStore::new(MemoryChunkStore::new()).with_latency(Duration::from_millis(600)),
    );
    let resolver = ReplicaResolvingStore::new(store.clone(), RedundancyLevel::None);

    let start = Instant::now();
    assert!(resolver.get(&content(6).address()).await.unwrap_err().is_not_found());
    assert_eq!(Instant::now().duration_since(start), Duration::from_millis(600));
    assert_eq!(store.get_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_direct_hit_needs_one_lookup() {
    let store = recording();
    let chunk = content(4096);
    store.put(chunk.clone().into(), None).await.unwrap();

    let resolver = ReplicaResolvingStore::new(store.clone(), RedundancyLevel::Paranoid);
    let found = resolver.get(&chunk.address()).await.unwrap();
    assert_eq!(found, AnyChunk::Content(chunk));

    sleep(Duration::from_secs(5)).await;
    assert_eq!(store.get_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_level_none_fails_without_waiting() {
    let store = recording();
    let resolver = ReplicaResolvingStore::new(store.clone(), RedundancyLevel::None);
    let address = content(10).address();

    let start = Instant::now();
    assert!(resolver.get(&address).await.unwrap_err().is_not_found());
    assert_eq!(Instant::now(), start);
    assert_eq!(store.get_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resolves_from_second_round() {
    let store = recording();
    let chunk = content(3000);
    store_replicas_of_round(&store, &chunk, 1).await;

    let resolver = ReplicaResolvingStore::new(store.clone(), RedundancyLevel::Paranoid);
    let start = Instant::now();
    let found = resolver.get(&chunk.address()).await.unwrap();
    assert_eq!(found, AnyChunk::Content(chunk));
    assert_eq!(Instant::now().duration_since(start), Duration::from_millis(1000));

    let lookups = store.get_count();
    sleep(Duration::from_secs(5)).await;
    assert_eq!(store.get_count(), lookups);
    assert_eq!(store.gets_within(start, Duration::from_millis(1000)), lookups);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_escalation() {
    let store = recording();
    let resolver = ReplicaResolvingStore::new(store.clone(), RedundancyLevel::Paranoid);
    let address = content(64).address();

    let start = Instant::now();
    let err = resolver
        .get_with_cancel(&address, sleep(Duration::from_millis(700)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Canceled));
    assert_eq!(Instant::now().duration_since(start), Duration::from_millis(700));
    assert_eq!(store.get_count(), 3);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(store.get_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_forged_replica_is_ignored() {
    let store = recording();
    let chunk = content(512);
    let rounds = ReplicaGenerator::new(chunk.address(), RedundancyLevel::Paranoid).rounds();

    // Signed by the replica owner under a genuine replica id, wrapping other content.
    let signer = PrivateKeySigner::from_bytes(&DISPERSED_REPLICA_OWNER_PK).unwrap();
    let forged = SingleOwnerChunk::new(rounds[0][0].id, content(513), &signer)
        .await
        .unwrap();
    assert_eq!(forged.address(), rounds[0][0].address);
    store.put(forged.into(), None).await.unwrap();
    store_replicas_of_round(&store, &chunk, 1).await;

    let resolver = ReplicaResolvingStore::new(store.clone(), RedundancyLevel::Paranoid);
    let start = Instant::now();
    let found = resolver.get(&chunk.address()).await.unwrap();
    assert_eq!(found, AnyChunk::Content(chunk));
    assert_eq!(Instant::now().duration_since(start), Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_round_delay_from_args() {
    let store = recording();
    let args = ReplicaArgs {
        level: RedundancyLevel::Medium,
        round_delay_ms: 50,
    };
    let resolver = ReplicaResolvingStore::from_args(store.clone(), &args);

    let start = Instant::now();
    assert!(resolver.get(&content(1).address()).await.is_err());
    assert_eq!(
        lookups_by_offset(&store, start),
        BTreeMap::from([(0, 1), (50, 2)])
    );
}

#[tokio::test(start_paused = true)]
async fn test_putter_replicas_resolve_when_original_is_lost() {
    let store = recording();
    let putter = ReplicaPutter::new(store.clone(), RedundancyLevel::Strong);
    let chunk = content(4096);

    assert!(putter.put(chunk.clone().into(), None).await.unwrap());
    assert_eq!(store.inner().len(), 1 + RedundancyLevel::Strong.replica_count());

    store.hide(chunk.address());
    let resolver = ReplicaResolvingStore::new(store.clone(), RedundancyLevel::Strong);
    let found = resolver.get(&chunk.address()).await.unwrap();
    assert_eq!(found, AnyChunk::Content(chunk));
}

#[tokio::test]
async fn test_putter_stamps_each_replica() {
    let signer = random_signer();
    let batch = PostageBatch::builder()
        .with_signer(&signer)
        .with_id_derived_from_nonce(Default::default())
        .with_depths(20, 16)
        .unwrap()
        .build();
    let issuer = Arc::new(PostageStampIssuer::new(batch));
    let stamper: Arc<dyn Stamper> = Arc::new(BatchStamper::new(issuer.clone(), signer).unwrap());

    let store = Arc::new(MemoryChunkStore::new());
    let putter = ReplicaPutter::new(store.clone(), RedundancyLevel::Medium).with_stamper(stamper);
    let chunk = content(200);

    assert_eq!(putter.put_replicas(&chunk).await.unwrap(), 2);
    for replica in ReplicaGenerator::new(chunk.address(), RedundancyLevel::Medium).replicas() {
        let stamp = store.stamp(&replica.address).unwrap();
        stamp.verify(replica.address, issuer.batch()).unwrap();
    }
    assert!(store.stamp(&chunk.address()).is_none());
}
