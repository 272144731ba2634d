//! Error types.

use thiserror::Error;

use crate::core::id::Id;

/// Errors raised while parsing an identifier from its hex form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier has {actual} hex digits, expected {expected}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid hex digit {found:?} at index {index}")]
    InvalidDigit { index: usize, found: char },

    #[error("identifier doesn't fit in {bits} bits")]
    Overflow { bits: u32 },

    #[error("unsupported identifier width: {0} bits")]
    UnsupportedWidth(u32),
}

/// Errors raised when a routing table configuration is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("bucket size must be at least 1")]
    BucketSize,

    #[error("identifier width must be within 1..={max} bits, got {bits}")]
    IdBits { bits: u32, max: u32 },

    #[error("at least one initial bucket is required")]
    InitialBuckets,

    #[error("{buckets} buckets with a shift of {shift} bits don't partition a {bits}-bit space")]
    Partition { shift: u32, buckets: u32, bits: u32 },

    #[error("sample size must be at least 1")]
    SampleSize,

    #[error("split depth must be at least 1")]
    SplitDepth,

    #[error("bucket boundaries must be strictly increasing and within the identifier space")]
    Boundaries,
}

/// Errors raised by routing table operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error(transparent)]
    Id(#[from] IdError),

    #[error("no bucket covers identifier {0}")]
    NoCoveringBucket(Id),

    #[error("inserting {id} needed more than {depth} splits")]
    SplitDepthExceeded { id: Id, depth: u32 },
}
