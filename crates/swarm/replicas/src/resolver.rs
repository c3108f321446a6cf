//! Replica-resolving retrieval.
//!
//! A lookup first asks for the chunk itself. If that has not succeeded when
//! the round delay expires, the replicas of the next escalation round are
//! requested in parallel, and so on every delay until the rounds run out.
//! Lookups from earlier rounds stay in flight; the first one to return a
//! valid chunk wins and the rest are aborted. One delay after the last round
//! the lookup fails with [`StoreError::NotFound`], however many lookups are
//! still pending. Without replicas there is no time box: the direct lookup
//! is awaited and its failure is the result.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, trace};
use vertex_swarm_postage::PostageStamp;
use vertex_swarm_primitives::{AnyChunk, ChunkAddress, ChunkError, RedundancyLevel};
use vertex_swarm_storer::{ChunkStore, StoreError, StoreResult};

use crate::args::{DEFAULT_ROUND_DELAY_MS, ReplicaArgs};
use crate::generator::ReplicaGenerator;

/// Where a lookup is directed.
#[derive(Debug, Clone, Copy)]
enum Lookup {
    /// The requested address itself.
    Direct,
    /// A dispersed replica of the requested address.
    Replica(ChunkAddress),
}

impl Lookup {
    fn source(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Replica(_) => "replica",
        }
    }
}

/// Chunk store decorator that falls back to dispersed replicas on retrieval.
#[derive(Debug)]
pub struct ReplicaResolvingStore<S> {
    inner: Arc<S>,
    level: RedundancyLevel,
    round_delay: Duration,
}

impl<S> Clone for ReplicaResolvingStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            level: self.level,
            round_delay: self.round_delay,
        }
    }
}

impl<S: ChunkStore + 'static> ReplicaResolvingStore<S> {
    /// Resolve through `inner` at `level` with the default round delay.
    pub fn new(inner: S, level: RedundancyLevel) -> Self {
        Self {
            inner: Arc::new(inner),
            level,
            round_delay: Duration::from_millis(DEFAULT_ROUND_DELAY_MS),
        }
    }

    /// Resolve through `inner` as configured by `args`.
    pub fn from_args(inner: S, args: &ReplicaArgs) -> Self {
        Self::new(inner, args.level).with_round_delay(args.round_delay())
    }

    /// Set the delay between escalation rounds.
    pub fn with_round_delay(mut self, round_delay: Duration) -> Self {
        self.round_delay = round_delay;
        self
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Resolve `address`, giving up with [`StoreError::Canceled`] as soon as
    /// `cancel` completes.
    pub async fn get_with_cancel<C>(&self, address: &ChunkAddress, cancel: C) -> StoreResult<AnyChunk>
    where
        C: Future<Output = ()> + Send,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                debug!(%address, "replica lookup canceled");
                Err(StoreError::Canceled)
            }
            result = self.resolve(address) => result,
        }
    }

    async fn resolve(&self, address: &ChunkAddress) -> StoreResult<AnyChunk> {
        let address = *address;
        let mut rounds = ReplicaGenerator::new(address, self.level)
            .rounds()
            .into_iter()
            .enumerate();

        // Dropping the set aborts every lookup still in flight.
        let mut lookups = JoinSet::new();
        self.spawn_lookup(&mut lookups, address, Lookup::Direct);

        // Without replicas there is nothing to escalate to, so the direct
        // lookup is awaited for as long as it takes.
        let escalates = !self.level.rounds().is_empty();
        let mut deadline = Instant::now() + self.round_delay;

        loop {
            tokio::select! {
                biased;
                Some(joined) = lookups.join_next() => {
                    match joined {
                        Ok((Ok(chunk), source)) => {
                            metrics::counter!("replicas_resolved_total", "source" => source).increment(1);
                            trace!(%address, source, "resolved chunk");
                            return Ok(chunk);
                        }
                        Ok((Err(error), source)) => {
                            trace!(%address, source, %error, "lookup failed");
                        }
                        Err(error) => {
                            trace!(%address, %error, "lookup task failed");
                        }
                    }
                    if lookups.is_empty() && !escalates {
                        return Err(self.not_found(address));
                    }
                }
                _ = sleep_until(deadline), if escalates => {
                    // The last round gets one delay to answer like every other.
                    let Some((round, replicas)) = rounds.next() else {
                        return Err(self.not_found(address));
                    };
                    debug!(%address, round, count = replicas.len(), "requesting replicas");
                    for replica in replicas {
                        self.spawn_lookup(&mut lookups, address, Lookup::Replica(replica.address));
                    }
                    deadline += self.round_delay;
                }
                else => return Err(self.not_found(address)),
            }
        }
    }

    fn not_found(&self, address: ChunkAddress) -> StoreError {
        metrics::counter!("replicas_not_found_total").increment(1);
        debug!(%address, level = %self.level, "chunk and replicas not found");
        StoreError::NotFound(address)
    }

    fn spawn_lookup(
        &self,
        lookups: &mut JoinSet<(StoreResult<AnyChunk>, &'static str)>,
        address: ChunkAddress,
        lookup: Lookup,
    ) {
        metrics::counter!("replicas_lookups_total").increment(1);
        let inner = self.inner.clone();
        lookups.spawn(async move { (fetch(inner.as_ref(), address, lookup).await, lookup.source()) });
    }
}

/// Fetch and validate one candidate for `address`.
async fn fetch<S: ChunkStore>(
    store: &S,
    address: ChunkAddress,
    lookup: Lookup,
) -> StoreResult<AnyChunk> {
    match lookup {
        Lookup::Direct => {
            let chunk = store.get(&address).await?;
            chunk.verify(address)?;
            Ok(chunk)
        }
        Lookup::Replica(replica_address) => match store.get(&replica_address).await? {
            AnyChunk::SingleOwner(soc) => {
                soc.verify(replica_address)?;
                let original = soc.into_inner();
                original.verify(address)?;
                Ok(AnyChunk::Content(original))
            }
            AnyChunk::Content(chunk) => Err(ChunkError::verification(
                "replica is not a single-owner chunk",
                replica_address,
                chunk.address(),
            )
            .into()),
        },
    }
}

#[async_trait]
impl<S: ChunkStore + 'static> ChunkStore for ReplicaResolvingStore<S> {
    async fn get(&self, address: &ChunkAddress) -> StoreResult<AnyChunk> {
        self.resolve(address).await
    }

    async fn put(&self, chunk: AnyChunk, stamp: Option<PostageStamp>) -> StoreResult<bool> {
        self.inner.put(chunk, stamp).await
    }

    async fn exists(&self, address: &ChunkAddress) -> StoreResult<bool> {
        self.inner.exists(address).await
    }
}
