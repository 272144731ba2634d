//! Capacity-bounded buckets of peers.

use std::fmt;

use tracing::{debug, trace};

use crate::core::{id::Id, range::IdRange};

/// A peer record: its identifier plus caller-defined metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer<M = ()> {
    id: Id,
    meta: M,
}

impl<M> Peer<M> {
    /// Creates a new peer record.
    pub fn new(id: Id, meta: M) -> Self {
        Self { id, meta }
    }

    /// Returns the peer's identifier.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Returns the peer's metadata.
    pub fn meta(&self) -> &M {
        &self.meta
    }

    /// Returns the peer's metadata mutably.
    pub fn meta_mut(&mut self) -> &mut M {
        &mut self.meta
    }
}

impl From<Id> for Peer {
    fn from(id: Id) -> Self {
        Peer::new(id, ())
    }
}

/// The outcome of [`Bucket::try_insert`].
#[derive(Debug, PartialEq, Eq)]
pub enum TryInsert<M> {
    /// The peer was appended to the bucket.
    Inserted,
    /// A peer with the same identifier is already in the bucket, the record was dropped.
    Exists,
    /// The bucket is at capacity; the peer is handed back so the caller can split.
    Full(Peer<M>),
}

/// A bucket holding up to `capacity` peers whose identifiers lie in its range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket<M = ()> {
    // The identifiers this bucket is responsible for.
    range: IdRange,
    // The peers, in insertion order.
    peers: Vec<Peer<M>>,
    // The maximum number of peers outside of a split.
    capacity: usize,
}

impl<M> Bucket<M> {
    /// Creates a new, empty bucket.
    pub fn new(range: IdRange, capacity: usize) -> Self {
        Self {
            range,
            peers: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn range(&self) -> &IdRange {
        &self.range
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the peers in insertion order.
    pub fn peers(&self) -> &[Peer<M>] {
        &self.peers
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.peers.len() >= self.capacity
    }

    /// Returns `true` if the identifier falls in this bucket's range.
    pub fn covers(&self, id: &Id) -> bool {
        self.range.contains(id)
    }

    /// Returns the peer with exactly this identifier, if present.
    pub fn get(&self, id: &Id) -> Option<&Peer<M>> {
        self.peers.iter().find(|peer| peer.id == *id)
    }

    /// Appends the peer if there is room for it.
    ///
    /// The caller is responsible for checking the bucket covers the peer's identifier.
    pub fn try_insert(&mut self, peer: Peer<M>) -> TryInsert<M> {
        debug_assert!(self.covers(&peer.id));

        if self.get(&peer.id).is_some() {
            return TryInsert::Exists;
        }

        if self.is_full() {
            return TryInsert::Full(peer);
        }

        self.peers.push(peer);
        TryInsert::Inserted
    }

    /// Splits the bucket at its range's midpoint.
    ///
    /// The children cover `[min, mid)` and `[mid, max)`. Peers with `id < mid` go left, all
    /// others go right, preserving their relative order.
    pub fn split(self) -> (Self, Self) {
        let (left_range, right_range) = self.range.split();
        let mid = left_range.max();

        let mut left = Self::new(left_range, self.capacity);
        let mut right = Self::new(right_range, self.capacity);

        for peer in self.peers {
            if peer.id.value() < mid {
                left.peers.push(peer);
            } else {
                right.peers.push(peer);
            }
        }

        debug!(
            parent = %self.range,
            left = %left.range,
            left_peers = left.len(),
            right = %right.range,
            right_peers = right.len(),
            "split bucket"
        );

        (left, right)
    }

    /// Returns the number of splits needed to admit `id` into this full bucket, or `None` if more
    /// than `max_depth` would be required.
    ///
    /// With `capacity + 1` peers to place, a split only makes progress once the peers don't all
    /// land in the same child; until then the crowded child is split again.
    pub(crate) fn splits_needed(&self, id: &Id, max_depth: u32) -> Option<u32> {
        let mut ids: Vec<_> = self.peers.iter().map(|peer| peer.id.value()).collect();
        ids.push(id.value());

        let mut range = self.range;
        for depth in 1..=max_depth {
            let (left, right) = range.split();
            let below = ids.iter().filter(|&&value| value < left.max()).count();

            if below > self.capacity {
                range = left;
            } else if ids.len() - below > self.capacity {
                range = right;
            } else {
                return Some(depth);
            }

            trace!(range = %range, depth, "split made no progress");
        }

        None
    }

    /// Admits `peer` into this full bucket by splitting up to `depth` times.
    ///
    /// Returns the resulting buckets: the first takes the place of this bucket, the others are
    /// in the order they were created (the right child of each split).
    pub(crate) fn split_with(mut self, peer: Peer<M>, depth: u32) -> Vec<Self> {
        self.peers.push(peer);

        let mut placed = vec![self];
        for _ in 0..depth {
            let i = match placed.iter().position(|bucket| bucket.is_over_capacity()) {
                Some(i) => i,
                None => break,
            };

            // The left child keeps its parent's slot.
            let (left, right) = placed.remove(i).split();
            placed.insert(i, left);
            placed.push(right);
        }

        debug_assert!(placed.iter().all(|bucket| !bucket.is_over_capacity()));

        placed
    }

    fn is_over_capacity(&self) -> bool {
        self.peers.len() > self.capacity
    }

    /// Writes the bucket's range and members, identifiers formatted for a `bits`-wide space.
    pub(crate) fn fmt_with_bits(&self, f: &mut fmt::Formatter<'_>, bits: u32) -> fmt::Result {
        write!(f, "{} ({}/{}): [", self.range, self.len(), self.capacity)?;
        for (i, peer) in self.peers.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&peer.id.to_hex(bits))?;
        }
        f.write_str("]")
    }
}

impl<M> fmt::Display for Bucket<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_with_bits(f, Id::BITS)
    }
}
