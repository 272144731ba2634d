//! Routing table configuration.

use crate::core::{error::ConfigError, id::Id};

/// The default maximum number of peers held by a bucket.
pub const K: usize = 3;

/// The default number of buckets created at construction.
pub const B: u32 = 8;

/// The default shift unit, in bits, between construction-time bucket boundaries.
pub const SHIFT: u32 = 20;

/// The default number of peers returned when a lookup has no exact match.
pub const SAMPLE_SIZE: usize = 2;

/// Routing table parameters, fixed once the table is constructed.
///
/// The defaults describe a 160-bit space split into 8 buckets with boundaries at `2^(20 * i)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    // The maximum number of peers a bucket holds outside of a split.
    pub(crate) bucket_size: usize,
    // The width of the identifier space.
    pub(crate) id_bits: u32,
    // The number of buckets built at construction.
    pub(crate) initial_buckets: u32,
    // Bucket `i` starts at `2^(shift * i)`.
    pub(crate) shift: u32,
    // The number of peers sampled when a lookup has no exact match.
    pub(crate) sample_size: usize,
    // The maximum number of splits a single insertion may cause.
    pub(crate) max_split_depth: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket_size: K,
            id_bits: Id::BITS,
            initial_buckets: B,
            shift: SHIFT,
            sample_size: SAMPLE_SIZE,
            max_split_depth: Id::BITS,
        }
    }
}

impl Config {
    /// Sets the maximum bucket size (`K`).
    pub fn with_bucket_size(mut self, bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    /// Sets the identifier width in bits.
    pub fn with_id_bits(mut self, id_bits: u32) -> Self {
        self.id_bits = id_bits;
        self
    }

    /// Sets the number of buckets built at construction (`B`) and their shift unit (`w`).
    pub fn with_partition(mut self, initial_buckets: u32, shift: u32) -> Self {
        self.initial_buckets = initial_buckets;
        self.shift = shift;
        self
    }

    /// Sets the number of peers sampled by a lookup without an exact match.
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Sets the maximum number of splits a single insertion may trigger.
    pub fn with_max_split_depth(mut self, max_split_depth: u32) -> Self {
        self.max_split_depth = max_split_depth;
        self
    }

    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    pub fn id_bits(&self) -> u32 {
        self.id_bits
    }

    pub fn initial_buckets(&self) -> u32 {
        self.initial_buckets
    }

    pub fn shift(&self) -> u32 {
        self.shift
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn max_split_depth(&self) -> u32 {
        self.max_split_depth
    }

    /// Checks the parameters describe a usable table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_params()?;
        self.validate_partition()
    }

    /// Checks everything but the construction-time partition, which explicit boundaries replace.
    pub(crate) fn validate_params(&self) -> Result<(), ConfigError> {
        if self.bucket_size == 0 {
            return Err(ConfigError::BucketSize);
        }

        if self.id_bits == 0 || self.id_bits > Id::BITS {
            return Err(ConfigError::IdBits {
                bits: self.id_bits,
                max: Id::BITS,
            });
        }

        if self.sample_size == 0 {
            return Err(ConfigError::SampleSize);
        }

        if self.max_split_depth == 0 {
            return Err(ConfigError::SplitDepth);
        }

        Ok(())
    }

    /// Checks the construction-time buckets exactly cover `[0, 2^id_bits)`.
    pub(crate) fn validate_partition(&self) -> Result<(), ConfigError> {
        if self.initial_buckets == 0 {
            return Err(ConfigError::InitialBuckets);
        }

        let covered = self.shift.checked_mul(self.initial_buckets);
        if self.shift == 0 || covered != Some(self.id_bits) {
            return Err(ConfigError::Partition {
                shift: self.shift,
                buckets: self.initial_buckets,
                bits: self.id_bits,
            });
        }

        Ok(())
    }
}
