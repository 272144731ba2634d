//! A k-bucket routing table for Kademlia-style peer lookup, partitioned by identifier range.
//!
//! Peers are named by 160-bit [`Id`]s. The [`RoutingTable`] keeps a list of [`Bucket`]s, each
//! responsible for a half-open range of the identifier space and holding at most `K` peers. When a
//! peer lands in a full bucket, the bucket splits at the midpoint of its range and its peers are
//! redistributed between the two halves.
//!
//! Notable differences with a conventional Kademlia table:
//!
//! 1. Buckets are numeric ranges, not XOR-distance prefixes. The construction-time boundaries
//!    grow exponentially (`2^(shift * i)`), so range sizes are very unequal.
//! 2. Lookups are local only: an exact match, or a small random sample of the bucket covering the
//!    identifier. There is no iterative FIND_NODE and no closeness ranking.
//! 3. Peers are never evicted, there is no liveness tracking.
//!
//! ```
//! use kbucket::{Config, Id, Lookup, RoutingTable};
//!
//! let mut rt: RoutingTable = RoutingTable::new(Config::default()).unwrap();
//! let id: Id = "00112233445566778899aabbccddeeff00112233".parse().unwrap();
//!
//! rt.insert(id).unwrap();
//! assert!(matches!(rt.find(&id), Ok(Lookup::Exact(_))));
//! ```

#![cfg_attr(doc_cfg, feature(doc_cfg))]

mod core;
mod table;

pub use crate::core::{
    bucket::{Bucket, Peer, TryInsert},
    config::{Config, B, K, SAMPLE_SIZE, SHIFT},
    error::{ConfigError, IdError, RoutingError},
    id::Id,
    range::IdRange,
};
#[cfg(feature = "sync")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "sync")))]
pub use crate::table::SyncRoutingTable;
pub use crate::table::{Insertion, Lookup, RoutingTable};
pub use primitive_types::U256;
