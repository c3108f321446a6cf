//! Postage stamps for Swarm.
//!
//! Every chunk uploaded to Swarm carries a stamp proving that a batch paid
//! for its storage.
//!
//! # Types
//!
//! - [`PostageBatch`] - prepaid storage, built with [`BatchBuilder`]
//! - [`StampIndex`] - bucket and slot of a stamp
//! - [`StampDigest`] - the message the batch owner signs
//! - [`PostageStamp`] - a signed stamp
//!
//! # Issuing
//!
//! - [`PostageStampIssuer`] - bucket counters of one batch
//! - [`StampStore`] - per-chunk records so restamping reuses a slot
//! - [`Stamper`] / [`BatchStamper`] - issue and sign stamps

mod batch;
mod error;
mod issuer;
mod stamp;
mod stamper;
mod store;

pub use batch::{
    BatchBuilder, BatchId, BuilderState, Initial, MAX_BUCKET_DEPTH, MAX_BUCKET_SLOT_DEPTH,
    MAX_DEPTH, MIN_BUCKET_DEPTH, PostageBatch, WithId, WithOwner, WithSize,
};
pub use error::{PostageError, Result};
pub use issuer::PostageStampIssuer;
pub use stamp::{PostageStamp, STAMP_SIZE, StampDigest, StampIndex};
pub use stamper::{BatchStamper, Stamper, current_timestamp};
pub use store::{MemoryStampStore, StampRecord, StampStore};
