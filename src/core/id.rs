//! Peer identifier types.

use std::{fmt, str::FromStr};

use primitive_types::U256;

use crate::core::error::IdError;

/// A 160-bit peer identifier, ordered by its unsigned numeric value.
///
/// The bytes are stored big-endian so the derived ordering is the numeric ordering. Range
/// arithmetic is done on [`U256`], which holds every bucket bound up to and including `2^160`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id {
    bytes: [u8; Self::BYTES],
}

impl Id {
    /// The size of the identifier in bytes.
    pub const BYTES: usize = 20;

    /// The size of the identifier in bits.
    pub const BITS: u32 = 20 * 8;

    /// Creates a new identifier from the supplied big-endian bytes.
    pub fn new(bytes: [u8; Self::BYTES]) -> Self {
        Id { bytes }
    }

    /// Returns the big-endian bytes backing the identifier.
    pub fn bytes(&self) -> [u8; Self::BYTES] {
        self.bytes
    }

    /// Convenience function for working with small identifiers (toy spaces, tests).
    pub fn from_u64(raw: u64) -> Self {
        let mut bytes = [0u8; Self::BYTES];
        bytes[Self::BYTES - 8..].copy_from_slice(&raw.to_be_bytes());

        Self { bytes }
    }

    #[doc(hidden)]
    /// Convenience function for generating random identifiers during testing.
    pub fn rand() -> Self {
        use rand::{thread_rng, Fill};

        let mut rng = thread_rng();
        let mut bytes = [0u8; Self::BYTES];
        let _res = bytes.try_fill(&mut rng);
        debug_assert!(_res.is_ok());

        Self { bytes }
    }

    /// Returns the numeric value of the identifier.
    pub fn value(&self) -> U256 {
        U256::from_big_endian(&self.bytes)
    }

    /// Builds an identifier from a numeric value, `None` if it doesn't fit in [`Id::BITS`].
    pub fn from_value(value: U256) -> Option<Self> {
        if value.bits() > Self::BITS as usize {
            return None;
        }

        let mut wide = [0u8; 32];
        value.to_big_endian(&mut wide);

        let mut bytes = [0u8; Self::BYTES];
        bytes.copy_from_slice(&wide[32 - Self::BYTES..]);

        Some(Self { bytes })
    }

    /// Parses the fixed-width hexadecimal form of an identifier in a `bits`-wide space.
    ///
    /// The text must hold exactly `ceil(bits / 4)` hex digits (either case, no prefix) and its
    /// value must be below `2^bits`. Nothing is coerced: any other input is an error.
    pub fn from_hex(text: &str, bits: u32) -> Result<Self, IdError> {
        if bits == 0 || bits > Self::BITS {
            return Err(IdError::UnsupportedWidth(bits));
        }

        if text.is_empty() {
            return Err(IdError::Empty);
        }

        let mut value = U256::zero();
        let mut digits = 0;
        for (index, c) in text.chars().enumerate() {
            let digit = c
                .to_digit(16)
                .ok_or(IdError::InvalidDigit { index, found: c })?;

            // At most 40 digits make it past the length check below, the shift can't overflow.
            if digits < hex_digits(Self::BITS) {
                value = (value << 4u32) | U256::from(digit);
            }
            digits += 1;
        }

        let expected = hex_digits(bits);
        if digits != expected {
            return Err(IdError::InvalidLength {
                expected,
                actual: digits,
            });
        }

        if value.bits() > bits as usize {
            return Err(IdError::Overflow { bits });
        }

        Self::from_value(value).ok_or(IdError::Overflow { bits })
    }

    /// Renders the identifier as fixed-width lowercase hex for a `bits`-wide space.
    ///
    /// Identifiers too large for the requested width are rendered with all their significant
    /// digits rather than truncated.
    pub fn to_hex(&self, bits: u32) -> String {
        let full = hex::encode(self.bytes);
        let significant = hex_digits(self.value().bits() as u32);
        let digits = hex_digits(bits).max(significant).clamp(1, full.len());

        full[full.len() - digits..].to_owned()
    }
}

/// The number of hex digits needed to write a `bits`-wide value.
pub(crate) fn hex_digits(bits: u32) -> usize {
    (bits as usize + 3) / 4
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex(Self::BITS))
    }
}

impl FromStr for Id {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s, Self::BITS)
    }
}
