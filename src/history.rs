//! Append-only game history.
//!
//! Entries are written only when something actually happened to the
//! canonical world: a card reveal, a committed action, a pass (with its
//! reason code), or a free operation resolving. Entries are never
//! mutated after creation and carry no wall-clock data, so two runs with
//! the same seed and the same external inputs produce byte-identical
//! history streams. Replay verification and offline aggregation (how
//! often each faction forfeits, and why) both read this log.

use serde::{Deserialize, Serialize};

use crate::core::{CardId, EventSide, FactionId, SpaceId};
use crate::error::PassReason;

/// What a history entry records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryRecord {
    /// A card was revealed and became current.
    CardRevealed {
        /// The revealed card.
        card: CardId,
    },

    /// A faction's action was validated and committed.
    Committed {
        /// Acting faction.
        faction: FactionId,
        /// `"event"` entries carry the resolved side.
        event_side: Option<EventSide>,
        /// Operation name for commands, as registered.
        op: Option<String>,
        /// Spaces the action affected, in trace order.
        affected: Vec<SpaceId>,
        /// True if a special activity was part of the action.
        used_special: bool,
    },

    /// A faction's turn resolved as a pass.
    Passed {
        /// Passing faction.
        faction: FactionId,
        /// Why.
        reason: PassReason,
        /// Resources gained from the pass reward.
        reward: i64,
    },

    /// A free operation resolved during an event.
    FreeOperation {
        /// Executing faction.
        faction: FactionId,
        /// Operation name, as registered.
        op: String,
        /// Target space, if one was named.
        space: Option<SpaceId>,
    },

    /// Free-form note from content handlers.
    Note(String),
}

/// One immutable history entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Monotonic sequence number, starting at 1.
    pub seq: u32,

    /// Card in play when the entry was written, if any.
    pub card: Option<CardId>,

    /// The recorded event.
    pub record: HistoryRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serde_is_stable() {
        let entry = HistoryEntry {
            seq: 3,
            card: Some(CardId::new(12)),
            record: HistoryRecord::Passed {
                faction: FactionId::new(2),
                reason: PassReason::ResourceGate,
                reward: 1,
            },
        };

        let json = serde_json::to_string(&entry).unwrap();
        let back: HistoryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
