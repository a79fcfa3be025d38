//! Map spaces and the pieces that occupy them.
//!
//! The engine treats the map as opaque content: spaces are registered at
//! setup with stable IDs, a population value, an adjacency list, and a
//! support level. Piece kinds are likewise content-defined newtype IDs.
//!
//! Piece counts are stored in ordered maps so that iteration order (and
//! therefore every decision that scans the board) is deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Support level floor (active opposition).
pub const SUPPORT_MIN: i8 = -2;
/// Support level ceiling (active support).
pub const SUPPORT_MAX: i8 = 2;

/// Space identifier, assigned by the content pack at setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpaceId(pub u16);

impl SpaceId {
    /// Create a new space ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Piece kind identifier (regulars, militia, forts, ...), content-defined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PieceKind(pub u8);

impl PieceKind {
    /// Create a new piece kind.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }
}

/// One map space: piece counts plus the engine-visible scalar attributes.
///
/// Support is a signed level in `SUPPORT_MIN..=SUPPORT_MAX`; shifts clamp
/// at the edges rather than error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    /// Display name (for history entries and logs).
    pub name: String,

    /// Population value, used by decision policies for ranking.
    pub population: u32,

    /// Support/opposition level.
    support: i8,

    /// Adjacent space IDs.
    pub adjacent: Vec<SpaceId>,

    /// Piece counts by kind. Ordered for deterministic iteration.
    pieces: BTreeMap<PieceKind, u32>,
}

impl Space {
    /// Create a named space with the given population.
    #[must_use]
    pub fn new(name: impl Into<String>, population: u32) -> Self {
        Self {
            name: name.into(),
            population,
            support: 0,
            adjacent: Vec::new(),
            pieces: BTreeMap::new(),
        }
    }

    /// Set the adjacency list (builder style, for setup code).
    #[must_use]
    pub fn with_adjacent(mut self, adjacent: Vec<SpaceId>) -> Self {
        self.adjacent = adjacent;
        self
    }

    /// Set the starting support level (builder style, for setup code).
    #[must_use]
    pub fn with_support(mut self, support: i8) -> Self {
        self.support = support.clamp(SUPPORT_MIN, SUPPORT_MAX);
        self
    }

    /// Current support level.
    #[must_use]
    pub fn support(&self) -> i8 {
        self.support
    }

    /// Shift support by `delta`, clamped to the legal range.
    pub fn shift_support(&mut self, delta: i8) {
        self.support = self.support.saturating_add(delta).clamp(SUPPORT_MIN, SUPPORT_MAX);
    }

    /// Count of pieces of one kind in this space.
    #[must_use]
    pub fn piece_count(&self, kind: PieceKind) -> u32 {
        self.pieces.get(&kind).copied().unwrap_or(0)
    }

    /// Total pieces of all kinds in this space.
    #[must_use]
    pub fn total_pieces(&self) -> u32 {
        self.pieces.values().sum()
    }

    /// Iterate over `(kind, count)` pairs with non-zero counts.
    pub fn pieces(&self) -> impl Iterator<Item = (PieceKind, u32)> + '_ {
        self.pieces.iter().filter(|(_, n)| **n > 0).map(|(k, n)| (*k, *n))
    }

    /// Add pieces. Only `WorldState` calls this; handlers go through the
    /// conserving pool operations.
    pub(crate) fn add_pieces(&mut self, kind: PieceKind, count: u32) {
        if count > 0 {
            *self.pieces.entry(kind).or_insert(0) += count;
        }
    }

    /// Remove pieces. Caller has already verified the count.
    pub(crate) fn remove_pieces(&mut self, kind: PieceKind, count: u32) {
        if let Some(n) = self.pieces.get_mut(&kind) {
            *n = n.saturating_sub(count);
            if *n == 0 {
                self.pieces.remove(&kind);
            }
        }
    }
}
