//! Half-open identifier ranges.

use std::fmt;

use primitive_types::U256;

use crate::core::id::Id;

/// A half-open range `[min, max)` of the identifier space.
///
/// Bounds are kept as [`U256`] as the exclusive upper bound of the top bucket (`2^160` for the
/// full space) is not itself a valid identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdRange {
    min: U256,
    max: U256,
}

impl IdRange {
    /// Creates a new range, `min` inclusive and `max` exclusive.
    pub fn new(min: U256, max: U256) -> Self {
        Self { min, max }
    }

    /// Returns the inclusive lower bound.
    pub fn min(&self) -> U256 {
        self.min
    }

    /// Returns the exclusive upper bound.
    pub fn max(&self) -> U256 {
        self.max
    }

    /// Returns `true` if the range holds no identifiers.
    pub fn is_empty(&self) -> bool {
        self.min >= self.max
    }

    /// Returns `true` if `min <= id < max`.
    pub fn contains(&self, id: &Id) -> bool {
        let value = id.value();
        self.min <= value && value < self.max
    }

    /// Returns `floor((min + max) / 2)`, or `min` for an empty range.
    pub fn midpoint(&self) -> U256 {
        if self.is_empty() {
            return self.min;
        }

        // Equal to floor((min + max) / 2) without the intermediate sum overflowing.
        self.min + ((self.max - self.min) >> 1)
    }

    /// Splits the range at its midpoint into `[min, mid)` and `[mid, max)`.
    ///
    /// The midpoint belongs to the upper half, matching how peers are classified on a bucket
    /// split (`id < mid` goes left, everything else right).
    pub fn split(&self) -> (IdRange, IdRange) {
        let mid = self.midpoint();
        (Self::new(self.min, mid), Self::new(mid, self.max))
    }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", Bound(self.min), Bound(self.max))
    }
}

// Formats a bound as `0x`-prefixed hex without leading zeros.
struct Bound(U256);

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = [0u8; 32];
        self.0.to_big_endian(&mut bytes);

        let hex = hex::encode(bytes);
        match hex.trim_start_matches('0') {
            "" => f.write_str("0x0"),
            digits => write!(f, "0x{digits}"),
        }
    }
}
