//! Validated derivation indices.
//!
//! A [`KeyIndex`] is always inside the BIP32 normal child range, so it can be
//! derived from both unneutered and neutered chain nodes. Wallet layers hand
//! indices over in whatever numeric shape they carry, so conversions exist from
//! the common integer types, from `f64`, and from strings. Each of them rejects
//! negative, fractional and out-of-range input with
//! [`KeyChainError::InvalidIndex`].

use std::{fmt, str::FromStr};

use bitcoin::bip32::ChildNumber;

use crate::KeyChainError;

/// Non-negative, non-hardened derivation index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyIndex(u32);

impl KeyIndex {
    /// Largest accepted index (`2^31 - 1`).
    pub const MAX: u32 = (1 << 31) - 1;

    /// Creates an index, rejecting anything in the hardened range.
    pub fn new(index: u32) -> Result<Self, KeyChainError> {
        if index > Self::MAX {
            return Err(KeyChainError::InvalidIndex(index.to_string()));
        }

        Ok(Self(index))
    }

    /// Raw index value.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The BIP32 child number for this index.
    pub const fn child_number(self) -> ChildNumber {
        ChildNumber::Normal { index: self.0 }
    }
}

impl fmt::Display for KeyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for KeyIndex {
    type Error = KeyChainError;

    fn try_from(index: u32) -> Result<Self, Self::Error> {
        Self::new(index)
    }
}

impl TryFrom<u64> for KeyIndex {
    type Error = KeyChainError;

    fn try_from(index: u64) -> Result<Self, Self::Error> {
        u32::try_from(index)
            .map_err(|_| KeyChainError::InvalidIndex(index.to_string()))
            .and_then(Self::new)
    }
}

impl TryFrom<i32> for KeyIndex {
    type Error = KeyChainError;

    fn try_from(index: i32) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(index))
    }
}

impl TryFrom<i64> for KeyIndex {
    type Error = KeyChainError;

    fn try_from(index: i64) -> Result<Self, Self::Error> {
        u32::try_from(index)
            .map_err(|_| KeyChainError::InvalidIndex(index.to_string()))
            .and_then(Self::new)
    }
}

impl TryFrom<f64> for KeyIndex {
    type Error = KeyChainError;

    fn try_from(index: f64) -> Result<Self, Self::Error> {
        let integral = index.is_finite() && index.fract() == 0.0;
        if !integral || index < 0.0 || index > f64::from(Self::MAX) {
            return Err(KeyChainError::InvalidIndex(index.to_string()));
        }

        // Exact: the value is integral and within u32 range.
        Self::new(index as u32)
    }
}

impl TryFrom<&str> for KeyIndex {
    type Error = KeyChainError;

    fn try_from(index: &str) -> Result<Self, Self::Error> {
        index.parse()
    }
}

impl FromStr for KeyIndex {
    type Err = KeyChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>()
            .map_err(|_| KeyChainError::InvalidIndex(format!("{s:?}")))
            .and_then(Self::new)
    }
}
