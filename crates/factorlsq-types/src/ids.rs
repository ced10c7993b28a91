//! Strongly-typed identifier for unknowns in a factor graph.
//!
//! Keys are opaque and stable; their numeric order defines the column
//! layout of the assembled Jacobian.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a vector-valued variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(pub u64);

impl Key {
    /// Returns the raw identifier.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for Key {
    fn from(val: u64) -> Self {
        Self(val)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}
