use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;

use crate::{
    core::{
        bucket::{Bucket, Peer},
        config::Config,
        error::{ConfigError, RoutingError},
        id::Id,
    },
    table::routing_table::{Insertion, Lookup, RoutingTable},
};

#[cfg_attr(doc_cfg, doc(cfg(feature = "sync")))]
#[derive(Debug, Default)]
/// A routing table handle suitable for sharing between threads.
///
/// It wraps [`RoutingTable`] in a single lock: insertions (and the splits they trigger) hold the
/// write lock for their whole duration, so readers never observe a half-applied split.
pub struct SyncRoutingTable<M = ()> {
    routing_table: Arc<RwLock<RoutingTable<M>>>,
}

// Derived `Clone` would require `M: Clone`.
impl<M> Clone for SyncRoutingTable<M> {
    fn clone(&self) -> Self {
        Self {
            routing_table: Arc::clone(&self.routing_table),
        }
    }
}

impl<M> From<RoutingTable<M>> for SyncRoutingTable<M> {
    fn from(routing_table: RoutingTable<M>) -> Self {
        Self {
            routing_table: Arc::new(RwLock::new(routing_table)),
        }
    }
}

impl<M> SyncRoutingTable<M> {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        RoutingTable::new(config).map(Self::from)
    }

    pub fn config(&self) -> Config {
        *self.routing_table.read().config()
    }

    pub fn len(&self) -> usize {
        self.routing_table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routing_table.read().is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.routing_table.read().bucket_count()
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.routing_table.read().contains(id)
    }

    pub fn insert_peer(&self, peer: Peer<M>) -> Result<Insertion, RoutingError> {
        self.routing_table.write().insert_peer(peer)
    }

    pub fn dump(&self) -> String {
        self.routing_table.read().dump()
    }
}

impl<M: Default> SyncRoutingTable<M> {
    pub fn insert(&self, id: Id) -> Result<Insertion, RoutingError> {
        self.routing_table.write().insert(id)
    }

    pub fn insert_hex(&self, text: &str) -> Result<Insertion, RoutingError> {
        self.routing_table.write().insert_hex(text)
    }
}

impl<M: Clone> SyncRoutingTable<M> {
    pub fn find(&self, id: &Id) -> Result<Lookup<M>, RoutingError> {
        self.routing_table.read().find(id)
    }

    pub fn find_hex(&self, text: &str) -> Result<Lookup<M>, RoutingError> {
        self.routing_table.read().find_hex(text)
    }

    pub fn find_with_rng<R: Rng + ?Sized>(
        &self,
        id: &Id,
        rng: &mut R,
    ) -> Result<Lookup<M>, RoutingError> {
        self.routing_table.read().find_with_rng(id, rng)
    }

    /// Returns a copy of the buckets as they are at the time of the call.
    pub fn snapshot(&self) -> Vec<Bucket<M>> {
        self.routing_table.read().buckets().to_vec()
    }
}
