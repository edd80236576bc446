//! Occupation identifiers.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// An occupation code (OCC2010 in the original data).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct OccupationId(u32);

impl OccupationId {
    /// Wrap a raw occupation code.
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// The raw occupation code.
    pub const fn code(self) -> u32 {
        self.0
    }
}

/// A directional move from an origin occupation to a destination occupation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display("{origin}->{dest}")]
pub struct OccupationPair {
    /// Occupation the worker leaves
    pub origin: OccupationId,
    /// Occupation the worker enters
    pub dest: OccupationId,
}

impl OccupationPair {
    /// Create a new pair.
    pub const fn new(origin: OccupationId, dest: OccupationId) -> Self {
        Self { origin, dest }
    }

    /// Whether origin and destination are the same occupation.
    pub fn is_self_pair(&self) -> bool {
        self.origin == self.dest
    }
}
