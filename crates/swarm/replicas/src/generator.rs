//! Deterministic replica addresses.
//!
//! A replica of a chunk is a single-owner chunk signed with the public replica
//! key. Its id is the chunk address with the first byte replaced, so there are
//! 255 candidate ids per chunk; the original first byte is never used, as that
//! id would be the original address itself.
//!
//! Replicas are handed out in escalation rounds of 2, 2, 4 and 8. Round `r`
//! picks candidates, in first-byte order, whose replica address falls into a
//! neighbourhood of depth `r + 1` that no earlier replica occupies. After a
//! full schedule the replicas therefore sit in distinct neighbourhoods at
//! every depth. A level with `n` rounds uses the first `n` of them.

use vertex_swarm_primitives::{
    B256, ChunkAddress, DISPERSED_REPLICA_OWNER, RedundancyLevel, SingleOwnerChunk,
};

/// One replica of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replica {
    /// Escalation round, starting at 0.
    pub round: usize,
    /// Position within the round.
    pub position: usize,
    /// Single-owner chunk id.
    pub id: B256,
    /// Address the replica is stored at.
    pub address: ChunkAddress,
}

impl Replica {
    /// First byte of the replica id.
    pub fn id_prefix(&self) -> u8 {
        self.id.0[0]
    }
}

/// Id of the replica of `address` whose first byte is `prefix`.
pub fn replica_id(address: &ChunkAddress, prefix: u8) -> B256 {
    let mut id = *address;
    id.0[0] = prefix;
    id
}

/// Neighbourhood of `address` at `depth` bits, `depth <= 8`.
const fn neighbourhood(address: &ChunkAddress, depth: usize) -> u8 {
    address.0[0] >> (8 - depth)
}

/// Produces the replica schedule of a chunk.
///
/// Generation is a pure function of the address and the level, so a schedule
/// can be regenerated at any time with the same result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicaGenerator {
    address: ChunkAddress,
    level: RedundancyLevel,
}

impl ReplicaGenerator {
    /// Create a generator for `address` at `level`.
    pub const fn new(address: ChunkAddress, level: RedundancyLevel) -> Self {
        Self { address, level }
    }

    /// The replicated address.
    pub const fn address(&self) -> ChunkAddress {
        self.address
    }

    /// The redundancy level.
    pub const fn level(&self) -> RedundancyLevel {
        self.level
    }

    /// The replicas of each round, in order.
    pub fn rounds(&self) -> Vec<Vec<Replica>> {
        let counts = self.level.rounds();
        if counts.is_empty() {
            return Vec::new();
        }

        let mut candidates: Vec<Option<(B256, ChunkAddress)>> = (0..=u8::MAX)
            .filter(|&prefix| prefix != self.address.0[0])
            .map(|prefix| {
                let id = replica_id(&self.address, prefix);
                Some((id, SingleOwnerChunk::address_for(&id, &DISPERSED_REPLICA_OWNER)))
            })
            .collect();

        let mut occupied: Vec<ChunkAddress> = Vec::with_capacity(self.level.replica_count());
        let mut rounds = Vec::with_capacity(counts.len());
        for (round, &count) in counts.iter().enumerate() {
            let depth = round + 1;
            let mut taken: Vec<u8> =
                occupied.iter().map(|address| neighbourhood(address, depth)).collect();
            let mut picked = Vec::with_capacity(count);

            for slot in candidates.iter_mut() {
                if picked.len() == count {
                    break;
                }
                let Some((_, address)) = *slot else { continue };
                let hood = neighbourhood(&address, depth);
                if !taken.contains(&hood) {
                    taken.push(hood);
                    picked.extend(slot.take());
                }
            }
            // Fewer free neighbourhoods than replicas: fill with the next unused candidates.
            for slot in candidates.iter_mut() {
                if picked.len() == count {
                    break;
                }
                picked.extend(slot.take());
            }

            occupied.extend(picked.iter().map(|&(_, address)| address));
            rounds.push(
                picked
                    .into_iter()
                    .enumerate()
                    .map(|(position, (id, address))| Replica { round, position, id, address })
                    .collect(),
            );
        }
        rounds
    }

    /// All replicas, round by round.
    pub fn replicas(&self) -> Vec<Replica> {
        self.rounds().into_iter().flatten().collect()
    }
}
