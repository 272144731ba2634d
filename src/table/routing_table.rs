use std::{fmt, mem};

use primitive_types::U256;
use rand::{seq::SliceRandom, thread_rng, Rng};
use tracing::{debug, trace, warn};

use crate::core::{
    bucket::{Bucket, Peer, TryInsert},
    config::Config,
    error::{ConfigError, RoutingError},
    id::Id,
    range::IdRange,
};

/// The outcome of a successful insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The peer was added to the bucket covering its identifier.
    Inserted,
    /// The identifier was already present, nothing changed.
    Exists,
    /// The covering bucket was full and got replaced after `splits` splits; the peer is in one of
    /// the new buckets.
    Split { splits: u32 },
}

/// The result of a lookup in the bucket covering an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<M = ()> {
    /// The identifier itself is known.
    Exact(Peer<M>),
    /// The identifier isn't known, these are randomly drawn peers from the covering bucket.
    Sample(Vec<Peer<M>>),
    /// The covering bucket is empty.
    Empty,
}

impl<M> Lookup<M> {
    pub fn is_exact(&self) -> bool {
        matches!(self, Lookup::Exact(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Lookup::Empty)
    }

    /// Returns the peers in the result, a single one for an exact match.
    pub fn into_peers(self) -> Vec<Peer<M>> {
        match self {
            Lookup::Exact(peer) => vec![peer],
            Lookup::Sample(peers) => peers,
            Lookup::Empty => vec![],
        }
    }

    /// Returns the identifiers in the result.
    pub fn ids(&self) -> Vec<Id> {
        match self {
            Lookup::Exact(peer) => vec![peer.id()],
            Lookup::Sample(peers) => peers.iter().map(Peer::id).collect(),
            Lookup::Empty => vec![],
        }
    }
}

/// The routing table: an ordered list of buckets covering the identifier space.
///
/// At construction the buckets partition `[0, 2^id_bits)` in increasing order. When a full bucket
/// splits, its left child takes its place and the right child is appended to the end of the list,
/// so after the first split the list is no longer sorted and lookups scan it linearly.
///
/// The table isn't synchronised; the `sync` feature provides `SyncRoutingTable`, a shared handle
/// guarding every operation with a single lock.
#[derive(Debug, Clone)]
pub struct RoutingTable<M = ()> {
    // The parameters the table was built with.
    config: Config,
    // The buckets, in construction order followed by split order.
    buckets: Vec<Bucket<M>>,
}

impl<M> Default for RoutingTable<M> {
    fn default() -> Self {
        let config = Config::default();

        Self {
            buckets: exponential_buckets(&config),
            config,
        }
    }
}

impl<M> RoutingTable<M> {
    /// Creates a new routing table with `initial_buckets` buckets whose boundaries sit at
    /// `2^(shift * i)`; the lowest bucket starts at 0.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            buckets: exponential_buckets(&config),
            config,
        })
    }

    /// Creates a new routing table from explicit bucket boundaries.
    ///
    /// `boundaries` must be strictly increasing with at least two entries, and the last must not
    /// exceed `2^id_bits`; bucket `i` covers `[boundaries[i], boundaries[i + 1])`. Identifiers
    /// outside `[boundaries[0], boundaries[n - 1])` are not covered.
    pub fn with_boundaries(mut config: Config, boundaries: &[U256]) -> Result<Self, ConfigError> {
        config.validate_params()?;

        let top = U256::one() << config.id_bits;
        let increasing = boundaries.windows(2).all(|pair| pair[0] < pair[1]);
        let within = boundaries.last().map_or(false, |last| *last <= top);
        if boundaries.len() < 2 || !increasing || !within {
            return Err(ConfigError::Boundaries);
        }

        config.initial_buckets = (boundaries.len() - 1) as u32;

        let buckets = boundaries
            .windows(2)
            .map(|pair| Bucket::new(IdRange::new(pair[0], pair[1]), config.bucket_size))
            .collect();

        Ok(Self { config, buckets })
    }

    /// Returns the parameters this table was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the buckets in table order.
    pub fn buckets(&self) -> &[Bucket<M>] {
        &self.buckets
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the total number of peers in the table.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Bucket::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Bucket::is_empty)
    }

    /// Returns the index of the first bucket covering the identifier.
    pub fn bucket_index(&self, id: &Id) -> Option<usize> {
        self.buckets.iter().position(|bucket| bucket.covers(id))
    }

    /// Returns the first bucket covering the identifier.
    pub fn bucket(&self, id: &Id) -> Option<&Bucket<M>> {
        self.bucket_index(id).map(|i| &self.buckets[i])
    }

    /// Returns the peer with exactly this identifier, if it is in the table.
    pub fn get(&self, id: &Id) -> Option<&Peer<M>> {
        self.bucket(id).and_then(|bucket| bucket.get(id))
    }

    /// Returns `true` if the identifier is in the table.
    pub fn contains(&self, id: &Id) -> bool {
        self.get(id).is_some()
    }

    /// Parses an identifier using the table's identifier width.
    pub fn parse_id(&self, text: &str) -> Result<Id, RoutingError> {
        Ok(Id::from_hex(text, self.config.id_bits)?)
    }

    /// Inserts a peer record into the bucket covering its identifier, splitting the bucket if it
    /// is full.
    ///
    /// On a split the new peer takes part in the redistribution. If every peer lands in the same
    /// child, that child is split again, up to `max_split_depth` times; beyond that the insertion
    /// fails and the table is left untouched. The resulting buckets are committed together: the
    /// first replaces the full bucket in place, the others are appended.
    pub fn insert_peer(&mut self, peer: Peer<M>) -> Result<Insertion, RoutingError> {
        let id = peer.id();

        let i = match self.bucket_index(&id) {
            Some(i) => i,
            None => {
                debug!(%id, "no bucket covers the identifier");
                return Err(RoutingError::NoCoveringBucket(id));
            }
        };

        let peer = match self.buckets[i].try_insert(peer) {
            TryInsert::Inserted => {
                trace!(%id, bucket = i, "inserted peer");
                return Ok(Insertion::Inserted);
            }
            TryInsert::Exists => return Ok(Insertion::Exists),
            TryInsert::Full(peer) => peer,
        };

        let max_depth = self.config.max_split_depth;
        let depth = match self.buckets[i].splits_needed(&id, max_depth) {
            Some(depth) => depth,
            None => {
                warn!(%id, bucket = i, max_depth, "bucket split doesn't converge");
                return Err(RoutingError::SplitDepthExceeded {
                    id,
                    depth: max_depth,
                });
            }
        };

        let placeholder = Bucket::new(*self.buckets[i].range(), self.config.bucket_size);
        let full = mem::replace(&mut self.buckets[i], placeholder);

        let mut placed = full.split_with(peer, depth);
        let appended = placed.split_off(1);
        if let Some(first) = placed.pop() {
            self.buckets[i] = first;
        }
        self.buckets.extend(appended);

        debug!(
            %id,
            bucket = i,
            splits = depth,
            buckets = self.buckets.len(),
            "inserted peer after split"
        );

        Ok(Insertion::Split { splits: depth })
    }

    /// Returns the buckets' ranges and members in a human-readable form.
    pub fn dump(&self) -> String {
        self.to_string()
    }
}

impl<M: Default> RoutingTable<M> {
    /// Inserts an identifier with default metadata, see [`RoutingTable::insert_peer`].
    pub fn insert(&mut self, id: Id) -> Result<Insertion, RoutingError> {
        self.insert_peer(Peer::new(id, M::default()))
    }

    /// Parses a hex identifier and inserts it, see [`RoutingTable::insert_peer`].
    pub fn insert_hex(&mut self, text: &str) -> Result<Insertion, RoutingError> {
        let id = self.parse_id(text)?;
        self.insert(id)
    }
}

impl<M: Clone> RoutingTable<M> {
    /// Looks up an identifier in the bucket covering it.
    ///
    /// Returns the peer itself if known, otherwise up to `sample_size` distinct peers drawn
    /// uniformly at random from that same bucket. Only the covering bucket is sampled, no
    /// closeness ranking is attempted.
    pub fn find(&self, id: &Id) -> Result<Lookup<M>, RoutingError> {
        self.find_with_rng(id, &mut thread_rng())
    }

    /// Parses a hex identifier and looks it up, see [`RoutingTable::find`].
    pub fn find_hex(&self, text: &str) -> Result<Lookup<M>, RoutingError> {
        let id = self.parse_id(text)?;
        self.find(&id)
    }

    /// Like [`RoutingTable::find`], drawing the sample from the supplied RNG.
    pub fn find_with_rng<R: Rng + ?Sized>(
        &self,
        id: &Id,
        rng: &mut R,
    ) -> Result<Lookup<M>, RoutingError> {
        let bucket = self.bucket(id).ok_or(RoutingError::NoCoveringBucket(*id))?;

        if let Some(peer) = bucket.get(id) {
            return Ok(Lookup::Exact(peer.clone()));
        }

        if bucket.is_empty() {
            return Ok(Lookup::Empty);
        }

        let sample: Vec<_> = bucket
            .peers()
            .choose_multiple(rng, self.config.sample_size)
            .cloned()
            .collect();

        trace!(%id, sampled = sample.len(), "no exact match");

        Ok(Lookup::Sample(sample))
    }
}

impl<M> fmt::Display for RoutingTable<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, bucket) in self.buckets.iter().enumerate() {
            write!(f, "Bucket {i}: ")?;
            bucket.fmt_with_bits(f, self.config.id_bits)?;
            writeln!(f)?;
        }

        Ok(())
    }
}

// Builds the construction-time buckets, bucket `i` covering `[2^(shift * i), 2^(shift * (i + 1)))`
// except for the first, which starts at 0.
fn exponential_buckets<M>(config: &Config) -> Vec<Bucket<M>> {
    (0..config.initial_buckets)
        .map(|i| {
            let min = match i {
                0 => U256::zero(),
                _ => U256::one() << (config.shift * i),
            };
            let max = U256::one() << (config.shift * (i + 1));

            Bucket::new(IdRange::new(min, max), config.bucket_size)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::core::error::IdError;

    // The toy space: 3-bit identifiers, two buckets [0, 4) and [4, 8), two peers per bucket.
    fn toy_table() -> RoutingTable {
        let config = Config::default().with_bucket_size(2).with_id_bits(3);
        let boundaries = [0u64, 4, 8].map(U256::from);

        RoutingTable::with_boundaries(config, &boundaries).unwrap()
    }

    fn ranges<M>(rt: &RoutingTable<M>) -> Vec<(u64, u64)> {
        rt.buckets()
            .iter()
            .map(|b| (b.range().min().low_u64(), b.range().max().low_u64()))
            .collect()
    }

    fn ids<M>(bucket: &Bucket<M>) -> Vec<u64> {
        bucket
            .peers()
            .iter()
            .map(|p| p.id().value().low_u64())
            .collect()
    }

    #[test]
    fn default() {
        let rt: RoutingTable = RoutingTable::default();

        assert_eq!(rt.config(), &Config::default());
        assert_eq!(rt.bucket_count(), 8);
        assert!(rt.is_empty());
        assert_eq!(rt.len(), 0);
    }

    #[test]
    fn new_partitions_the_space() {
        let rt: RoutingTable = RoutingTable::new(Config::default()).unwrap();
        let buckets = rt.buckets();

        assert_eq!(buckets[0].range().min(), U256::zero());
        assert_eq!(buckets[0].range().max(), U256::one() << 20);
        for i in 1..buckets.len() {
            assert_eq!(buckets[i].range().min(), U256::one() << (20 * i));
            assert_eq!(buckets[i - 1].range().max(), buckets[i].range().min());
        }
        assert_eq!(buckets[7].range().max(), U256::one() << 160);
        assert!(buckets.iter().all(|b| b.capacity() == 3));
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = Config::default().with_partition(8, 16);
        assert!(matches!(
            RoutingTable::<()>::new(config),
            Err(ConfigError::Partition { .. })
        ));
    }

    #[test]
    fn with_boundaries_rejects_invalid() {
        let config = Config::default().with_id_bits(3);

        for boundaries in [vec![], vec![0u64], vec![0, 4, 4], vec![4, 0], vec![0, 4, 9]] {
            let boundaries: Vec<_> = boundaries.into_iter().map(U256::from).collect();
            assert_eq!(
                RoutingTable::<()>::with_boundaries(config, &boundaries).unwrap_err(),
                ConfigError::Boundaries
            );
        }
    }

    #[test]
    fn insert() {
        let mut rt = toy_table();

        assert_eq!(rt.insert(Id::from_u64(1)), Ok(Insertion::Inserted));
        assert_eq!(rt.insert(Id::from_u64(2)), Ok(Insertion::Inserted));
        assert_eq!(rt.insert(Id::from_u64(5)), Ok(Insertion::Inserted));

        assert_eq!(ids(&rt.buckets()[0]), vec![1, 2]);
        assert_eq!(ids(&rt.buckets()[1]), vec![5]);
        assert_eq!(rt.len(), 3);
    }

    #[test]
    fn insert_duplicate() {
        let mut rt = toy_table();

        assert_eq!(rt.insert(Id::from_u64(1)), Ok(Insertion::Inserted));
        assert_eq!(rt.insert(Id::from_u64(1)), Ok(Insertion::Exists));
        assert_eq!(rt.len(), 1);
    }

    #[test]
    fn insert_split() {
        let mut rt = toy_table();
        for i in [1, 2, 5] {
            rt.insert(Id::from_u64(i)).unwrap();
        }

        assert_eq!(rt.insert(Id::from_u64(3)), Ok(Insertion::Split { splits: 1 }));

        // The left child replaces the full bucket, the right child is appended.
        assert_eq!(ranges(&rt), vec![(0, 2), (4, 8), (2, 4)]);
        assert_eq!(ids(&rt.buckets()[0]), vec![1]);
        assert_eq!(ids(&rt.buckets()[1]), vec![5]);
        // The midpoint is classified right and covered by the right child.
        assert_eq!(ids(&rt.buckets()[2]), vec![2, 3]);
        assert_eq!(rt.len(), 4);
    }

    #[test]
    fn insert_uncovered() {
        // Only [1, 4) is covered.
        let config = Config::default().with_bucket_size(2).with_id_bits(3);
        let boundaries = [1u64, 4].map(U256::from);
        let mut rt: RoutingTable = RoutingTable::with_boundaries(config, &boundaries).unwrap();

        assert_eq!(
            rt.insert(Id::from_u64(0)),
            Err(RoutingError::NoCoveringBucket(Id::from_u64(0)))
        );
        assert_eq!(
            rt.insert(Id::from_u64(4)),
            Err(RoutingError::NoCoveringBucket(Id::from_u64(4)))
        );
        assert!(rt.is_empty());
    }

    #[test]
    fn insert_beyond_id_width() {
        // A valid 160-bit identifier lies outside a 3-bit table.
        let mut rt = toy_table();
        let id = Id::from_u64(8);
        assert_eq!(rt.insert(id), Err(RoutingError::NoCoveringBucket(id)));
    }

    #[test]
    fn insert_split_depth_exceeded() {
        // [0, 16) holding 12 and 13 needs 3 splits to admit 14.
        let config = Config::default()
            .with_bucket_size(2)
            .with_id_bits(4)
            .with_max_split_depth(2);
        let boundaries = [0u64, 16].map(U256::from);
        let mut rt: RoutingTable = RoutingTable::with_boundaries(config, &boundaries).unwrap();

        rt.insert(Id::from_u64(12)).unwrap();
        rt.insert(Id::from_u64(13)).unwrap();

        let before = rt.buckets().to_vec();
        assert_eq!(
            rt.insert(Id::from_u64(14)),
            Err(RoutingError::SplitDepthExceeded {
                id: Id::from_u64(14),
                depth: 2
            })
        );
        // The table is untouched.
        assert_eq!(rt.buckets(), &before[..]);
    }

    #[test]
    fn insert_split_cascade() {
        let config = Config::default().with_bucket_size(2).with_id_bits(4);
        let boundaries = [0u64, 16].map(U256::from);
        let mut rt: RoutingTable = RoutingTable::with_boundaries(config, &boundaries).unwrap();

        rt.insert(Id::from_u64(12)).unwrap();
        rt.insert(Id::from_u64(13)).unwrap();

        assert_eq!(rt.insert(Id::from_u64(14)), Ok(Insertion::Split { splits: 3 }));
        assert_eq!(ranges(&rt), vec![(0, 8), (8, 12), (12, 14), (14, 16)]);
        assert!(rt.buckets().iter().all(|b| b.len() <= 2));
        for i in [12, 13, 14] {
            assert!(rt.find(&Id::from_u64(i)).unwrap().is_exact());
        }
    }

    #[test]
    fn insert_hex() {
        let mut rt = toy_table();

        assert_eq!(rt.insert_hex("5"), Ok(Insertion::Inserted));
        assert_eq!(
            rt.insert_hex("05"),
            Err(RoutingError::Id(IdError::InvalidLength {
                expected: 1,
                actual: 2
            }))
        );
        assert_eq!(
            rt.insert_hex("z"),
            Err(RoutingError::Id(IdError::InvalidDigit {
                index: 0,
                found: 'z'
            }))
        );
        assert_eq!(
            rt.insert_hex("9"),
            Err(RoutingError::Id(IdError::Overflow { bits: 3 }))
        );
        assert_eq!(rt.len(), 1);
    }

    #[test]
    fn find_exact() {
        let mut rt = toy_table();
        for i in [1, 2, 5, 3] {
            rt.insert(Id::from_u64(i)).unwrap();
        }

        for i in [1, 2, 3, 5] {
            let lookup = rt.find(&Id::from_u64(i)).unwrap();
            assert_eq!(lookup, Lookup::Exact(Id::from_u64(i).into()));
        }
    }

    #[test]
    fn find_sample() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut rt = toy_table();
        for i in [4, 5] {
            rt.insert(Id::from_u64(i)).unwrap();
        }

        let lookup = rt.find_with_rng(&Id::from_u64(6), &mut rng).unwrap();
        let mut found = lookup.ids();
        found.sort();
        assert_eq!(found, vec![Id::from_u64(4), Id::from_u64(5)]);
    }

    #[test]
    fn find_sample_is_bounded() {
        let config = Config::default().with_bucket_size(8).with_id_bits(8);
        let boundaries = [0u64, 256].map(U256::from);
        let mut rt: RoutingTable = RoutingTable::with_boundaries(config, &boundaries).unwrap();
        for i in 0..8 {
            rt.insert(Id::from_u64(i * 2)).unwrap();
        }

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let ids = rt.find_with_rng(&Id::from_u64(1), &mut rng).unwrap().ids();
            assert_eq!(ids.len(), 2);
            assert_ne!(ids[0], ids[1]);
            assert!(ids.iter().all(|id| rt.contains(id)));
        }
    }

    #[test]
    fn find_empty() {
        let mut rt = toy_table();
        rt.insert(Id::from_u64(1)).unwrap();

        assert_eq!(rt.find(&Id::from_u64(5)), Ok(Lookup::Empty));
    }

    #[test]
    fn find_uncovered() {
        let rt = toy_table();
        let id = Id::from_u64(8);
        assert_eq!(rt.find(&id), Err(RoutingError::NoCoveringBucket(id)));
    }

    #[test]
    fn find_hex() {
        let mut rt = toy_table();
        rt.insert_hex("3").unwrap();

        assert!(rt.find_hex("3").unwrap().is_exact());
        assert!(matches!(rt.find_hex(""), Err(RoutingError::Id(IdError::Empty))));
    }

    #[test]
    fn metadata() {
        let mut rt: RoutingTable<&'static str> = RoutingTable::default();
        let id = Id::rand();

        rt.insert_peer(Peer::new(id, "127.0.0.1:1")).unwrap();

        match rt.find(&id).unwrap() {
            Lookup::Exact(peer) => assert_eq!(*peer.meta(), "127.0.0.1:1"),
            lookup => panic!("expected an exact match, got {lookup:?}"),
        }
    }

    #[test]
    fn dump() {
        let mut rt = toy_table();
        for i in [1, 2, 5, 3] {
            rt.insert(Id::from_u64(i)).unwrap();
        }

        assert_eq!(
            rt.dump(),
            "Bucket 0: [0x0, 0x2) (1/2): [1]\n\
             Bucket 1: [0x4, 0x8) (1/2): [5]\n\
             Bucket 2: [0x2, 0x4) (2/2): [2, 3]\n"
        );
    }
}
