//! Faction identification and per-faction data storage.
//!
//! ## FactionId
//!
//! Type-safe faction identifier. Card-driven games run 2-8 asymmetric
//! factions; the engine never assumes a fixed count.
//!
//! ## FactionMap
//!
//! Per-faction data storage backed by `Vec` for O(1) access.
//! Supports iteration and indexing by `FactionId`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Faction identifier.
///
/// Faction indices are 0-based and assigned by the content pack at setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactionId(pub u8);

impl FactionId {
    /// Create a new faction ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw faction index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over all faction IDs for a game with `faction_count` factions.
    pub fn all(faction_count: usize) -> impl Iterator<Item = FactionId> {
        (0..faction_count as u8).map(FactionId)
    }
}

impl std::fmt::Display for FactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Faction {}", self.0)
    }
}

/// Per-faction data storage with O(1) access.
///
/// Backed by a `Vec<T>` with one entry per faction.
/// Use `FactionMap::new()` to create with a factory function,
/// or `FactionMap::with_value()` to initialize all entries to the same value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactionMap<T> {
    data: Vec<T>,
}

impl<T> FactionMap<T> {
    /// Create a map with a factory function called per faction.
    pub fn new(faction_count: usize, factory: impl Fn(FactionId) -> T) -> Self {
        Self {
            data: FactionId::all(faction_count).map(factory).collect(),
        }
    }

    /// Number of factions in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the map covers zero factions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over `(FactionId, &T)` pairs in faction order.
    pub fn iter(&self) -> impl Iterator<Item = (FactionId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (FactionId(i as u8), v))
    }

    /// Iterate over `(FactionId, &mut T)` pairs in faction order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (FactionId, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (FactionId(i as u8), v))
    }
}

impl<T: Clone> FactionMap<T> {
    /// Create a map with all entries set to the same value.
    pub fn with_value(faction_count: usize, value: T) -> Self {
        Self {
            data: vec![value; faction_count],
        }
    }
}

impl<T: Default> FactionMap<T> {
    /// Create a map with all entries defaulted.
    #[must_use]
    pub fn with_default(faction_count: usize) -> Self {
        Self::new(faction_count, |_| T::default())
    }
}

impl<T> Index<FactionId> for FactionMap<T> {
    type Output = T;

    fn index(&self, faction: FactionId) -> &T {
        &self.data[faction.index()]
    }
}

impl<T> IndexMut<FactionId> for FactionMap<T> {
    fn index_mut(&mut self, faction: FactionId) -> &mut T {
        &mut self.data[faction.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faction_id_all() {
        let factions: Vec<_> = FactionId::all(4).collect();
        assert_eq!(factions.len(), 4);
        assert_eq!(factions[0], FactionId::new(0));
        assert_eq!(factions[3], FactionId::new(3));
    }

    #[test]
    fn test_faction_map_index() {
        let mut resources: FactionMap<i64> = FactionMap::with_value(4, 10);

        assert_eq!(resources[FactionId::new(0)], 10);

        resources[FactionId::new(2)] = 25;
        assert_eq!(resources[FactionId::new(2)], 25);
    }

    #[test]
    fn test_faction_map_iter() {
        let map: FactionMap<usize> = FactionMap::new(3, |f| f.index() * 2);

        let pairs: Vec<_> = map.iter().map(|(f, v)| (f.index(), *v)).collect();
        assert_eq!(pairs, vec![(0, 0), (1, 2), (2, 4)]);
    }
}
