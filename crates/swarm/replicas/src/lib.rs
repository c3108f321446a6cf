//! Dispersed replicas for Swarm.
//!
//! Chunks uploaded with a redundancy level are copied to deterministic
//! single-owner chunk addresses spread across the address space. Retrieval
//! escalates to those copies over time when the original cannot be found.
//!
//! - [`ReplicaGenerator`] - replica ids and addresses per escalation round
//! - [`ReplicaPutter`] - store decorator writing replicas on put
//! - [`ReplicaResolvingStore`] - store decorator resolving through replicas on get
//! - [`ReplicaArgs`] - configuration

mod args;
mod generator;
mod putter;
mod resolver;

pub use args::{DEFAULT_ROUND_DELAY_MS, ReplicaArgs};
pub use generator::{Replica, ReplicaGenerator, replica_id};
pub use putter::ReplicaPutter;
pub use resolver::ReplicaResolvingStore;
