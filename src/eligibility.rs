//! Sequence-of-play eligibility tracking.
//!
//! Each faction carries one of three statuses for the card in progress:
//!
//! - `Eligible`: may act this card.
//! - `IneligibleNext`: sits this card out, eligible again afterwards.
//! - `IneligibleThroughNext`: sits this card out and decays to
//!   `IneligibleNext` at the next card boundary.
//!
//! Executing an Event or Command marks a faction ineligible for the
//! following card (unless a "remain eligible" effect is pending).
//! Passing leaves it eligible. Event effects can force the longer
//! durations; their content decides who and when, the tracker only
//! implements the cycle.
//!
//! Marks earned during a card take effect at the next `begin_card`, so
//! the acting queue computed at the start of a card is stable while the
//! card resolves.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::{FactionId, FactionMap};

/// Per-faction sequence-of-play status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eligibility {
    /// May act on the current card.
    #[default]
    Eligible,
    /// Sits out the current card.
    IneligibleNext,
    /// Sits out the current card and the next one.
    IneligibleThroughNext,
}

/// Tracks eligibility across card boundaries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityTracker {
    /// Effective status for the card in progress.
    status: FactionMap<Eligibility>,

    /// Marks earned during the current card, applied at the next
    /// `begin_card`. Ordered map keeps replay deterministic.
    pending: BTreeMap<FactionId, Eligibility>,

    /// Factions that keep their eligibility despite executing.
    remain_eligible: BTreeSet<FactionId>,
}

impl EligibilityTracker {
    /// Create a tracker with every faction eligible.
    #[must_use]
    pub fn new(faction_count: usize) -> Self {
        Self {
            status: FactionMap::with_default(faction_count),
            pending: BTreeMap::new(),
            remain_eligible: BTreeSet::new(),
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self, faction: FactionId) -> Eligibility {
        self.status[faction]
    }

    /// True if the faction may act on the card in progress.
    #[must_use]
    pub fn is_eligible(&self, faction: FactionId) -> bool {
        self.status[faction] == Eligibility::Eligible
    }

    /// Advance to a new card: decay last card's statuses, then apply the
    /// marks earned while it resolved.
    pub fn begin_card(&mut self) {
        for (_, status) in self.status.iter_mut() {
            *status = match *status {
                Eligibility::Eligible | Eligibility::IneligibleNext => Eligibility::Eligible,
                Eligibility::IneligibleThroughNext => Eligibility::IneligibleNext,
            };
        }
        let pending = std::mem::take(&mut self.pending);
        for (faction, status) in pending {
            self.status[faction] = status;
        }
    }

    /// Record that a faction executed an Event or Command this card.
    /// It becomes ineligible for the next card unless a remain-eligible
    /// effect is pending (which is consumed here).
    pub fn note_executed(&mut self, faction: FactionId) {
        if self.remain_eligible.remove(&faction) {
            self.pending.remove(&faction);
        } else {
            self.pending.insert(faction, Eligibility::IneligibleNext);
        }
    }

    /// Record that a faction passed: it stays eligible.
    pub fn note_passed(&mut self, faction: FactionId) {
        self.pending.remove(&faction);
    }

    /// Event effect: the faction keeps its eligibility when it next
    /// executes this card.
    pub fn mark_remain_eligible(&mut self, faction: FactionId) {
        self.remain_eligible.insert(faction);
    }

    /// Event effect: the faction is ineligible for the remainder of this
    /// card and through the next one.
    pub fn mark_ineligible_through_next(&mut self, faction: FactionId) {
        self.status[faction] = Eligibility::IneligibleThroughNext;
        self.pending.remove(&faction);
    }

    /// Winter quarters: every faction starts the new period eligible,
    /// with all pending marks and remain-eligible grants discarded.
    pub fn reset_all(&mut self) {
        for (_, status) in self.status.iter_mut() {
            *status = Eligibility::Eligible;
        }
        self.pending.clear();
        self.remain_eligible.clear();
    }
}
