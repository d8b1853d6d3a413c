//! Identifier types for coffee-shop records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The input was empty.
    #[error("identifier is empty")]
    Empty,

    /// The input was not a decimal integer.
    #[error("identifier is not numeric: {0}")]
    NotNumeric(String),

    /// Zero is reserved and never allocated.
    #[error("identifier must be greater than zero")]
    Zero,
}

/// A drink identifier.
///
/// Identifiers are allocated sequentially by the store, starting at 1, and
/// rendered as plain integers on the wire.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrinkId(u64);

impl DrinkId {
    /// The first identifier handed out by an empty store.
    pub const FIRST: Self = Self(1);

    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Return the raw integer value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The identifier allocated after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Big-endian bytes, so keys sort in allocation order.
    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Rebuild an identifier from its big-endian key bytes.
    #[must_use]
    pub const fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }
}

impl fmt::Debug for DrinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DrinkId({})", self.0)
    }
}

impl fmt::Display for DrinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DrinkId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        let raw: u64 = s
            .parse()
            .map_err(|_| IdError::NotNumeric(s.to_string()))?;
        if raw == 0 {
            return Err(IdError::Zero);
        }
        Ok(Self(raw))
    }
}

impl From<DrinkId> for u64 {
    fn from(id: DrinkId) -> Self {
        id.0
    }
}
