//! The canonical world state.
//!
//! `WorldState` is the single aggregate of truth: spaces and their
//! pieces, the three piece pools (available / unavailable / casualties),
//! per-faction resources and eligibility, queued free operations, leader
//! positions, markers, the card deck, the history log, and the
//! deterministic RNG. It is created once at setup, mutated only by
//! committed actions, and never destroyed mid-game.
//!
//! ## Conservation
//!
//! For every piece kind, `available + unavailable + casualties + sum
//! over spaces` is constant for the whole game. All piece movement goes
//! through the pool operations on this type, which move counts between
//! locations and pools without ever minting or destroying pieces.
//! `piece_census()` exposes the totals for verification.
//!
//! ## Snapshots
//!
//! The whole struct is plain value state: `Clone` gives an independent
//! deep copy (persistent structures make the big collections cheap), and
//! serde gives save/resume. The sandbox relies on both properties.
//!
//! ## Turn trace
//!
//! The in-progress turn's bookkeeping (affected spaces, special-activity
//! usage, resource deltas) lives in an embedded `Trace`, reset by the
//! sandbox at the start of every attempt. Mutating operations record
//! into it automatically, so handlers cannot forget to.

use im::Vector;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::eligibility::EligibilityTracker;
use crate::error::StateError;
use crate::free_ops::FreeOperationQueue;
use crate::history::{HistoryEntry, HistoryRecord};
use crate::ledger::ResourceLedger;
use crate::sandbox::Trace;

use super::card::Card;
use super::faction::FactionId;
use super::rng::GameRng;
use super::space::{PieceKind, Space, SpaceId};

/// The canonical world state. See the module docs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldState {
    faction_count: usize,

    /// Map spaces, ordered by ID for deterministic iteration.
    spaces: BTreeMap<SpaceId, Space>,

    /// Pieces available for placement.
    available: BTreeMap<PieceKind, u32>,

    /// Pieces not yet released into the game.
    unavailable: BTreeMap<PieceKind, u32>,

    /// Pieces removed as casualties.
    casualties: BTreeMap<PieceKind, u32>,

    /// Per-faction spendable resources.
    resources: ResourceLedger,

    /// Sequence-of-play eligibility.
    eligibility: EligibilityTracker,

    /// Operations events have granted for free.
    free_ops: FreeOperationQueue,

    /// Leader positions by name; `None` = off map.
    leaders: BTreeMap<String, Option<SpaceId>>,

    /// Marker placements by tag.
    markers: BTreeMap<String, BTreeSet<SpaceId>>,

    /// Remaining deck, front = next card.
    deck: Vector<Card>,

    /// The revealed-but-not-yet-current card, if any.
    upcoming_card: Option<Card>,

    /// The card being resolved.
    current_card: Option<Card>,

    /// Append-only history.
    history: Vector<HistoryEntry>,

    /// Next history sequence number.
    next_seq: u32,

    /// In-progress turn bookkeeping.
    trace: Trace,

    /// Deterministic RNG.
    rng: GameRng,
}

impl WorldState {
    /// Create an empty world for `faction_count` factions.
    #[must_use]
    pub fn new(faction_count: usize, seed: u64) -> Self {
        assert!(faction_count > 0, "must have at least 1 faction");
        Self {
            faction_count,
            spaces: BTreeMap::new(),
            available: BTreeMap::new(),
            unavailable: BTreeMap::new(),
            casualties: BTreeMap::new(),
            resources: ResourceLedger::new(faction_count),
            eligibility: EligibilityTracker::new(faction_count),
            free_ops: FreeOperationQueue::new(),
            leaders: BTreeMap::new(),
            markers: BTreeMap::new(),
            deck: Vector::new(),
            upcoming_card: None,
            current_card: None,
            history: Vector::new(),
            next_seq: 1,
            trace: Trace::default(),
            rng: GameRng::new(seed),
        }
    }

    /// Number of factions.
    #[must_use]
    pub fn faction_count(&self) -> usize {
        self.faction_count
    }

    // === Spaces ===

    /// Register a space at setup.
    pub fn add_space(&mut self, id: SpaceId, space: Space) {
        self.spaces.insert(id, space);
    }

    /// Look up a space.
    #[must_use]
    pub fn space(&self, id: SpaceId) -> Option<&Space> {
        self.spaces.get(&id)
    }

    /// Iterate over `(SpaceId, &Space)` in ID order.
    pub fn spaces(&self) -> impl Iterator<Item = (SpaceId, &Space)> {
        self.spaces.iter().map(|(id, sp)| (*id, sp))
    }

    /// All space IDs in order.
    pub fn space_ids(&self) -> impl Iterator<Item = SpaceId> + '_ {
        self.spaces.keys().copied()
    }

    fn space_mut(&mut self, id: SpaceId) -> Result<&mut Space, StateError> {
        self.spaces.get_mut(&id).ok_or(StateError::UnknownSpace(id))
    }

    /// Shift a space's support level, recording the space as affected.
    pub fn shift_support(&mut self, id: SpaceId, delta: i8) -> Result<(), StateError> {
        self.space_mut(id)?.shift_support(delta);
        self.trace.note_space(id);
        Ok(())
    }

    // === Piece pools (conserving operations) ===

    /// Pieces of a kind in the available pool.
    #[must_use]
    pub fn available(&self, kind: PieceKind) -> u32 {
        self.available.get(&kind).copied().unwrap_or(0)
    }

    /// Pieces of a kind in the unavailable pool.
    #[must_use]
    pub fn unavailable(&self, kind: PieceKind) -> u32 {
        self.unavailable.get(&kind).copied().unwrap_or(0)
    }

    /// Pieces of a kind in the casualties pool.
    #[must_use]
    pub fn casualties(&self, kind: PieceKind) -> u32 {
        self.casualties.get(&kind).copied().unwrap_or(0)
    }

    /// Seed the available pool at setup.
    pub fn set_available(&mut self, kind: PieceKind, count: u32) {
        self.available.insert(kind, count);
    }

    /// Seed the unavailable pool at setup.
    pub fn set_unavailable(&mut self, kind: PieceKind, count: u32) {
        self.unavailable.insert(kind, count);
    }

    /// Place pieces directly at setup, debiting the available pool.
    pub fn setup_place(&mut self, kind: PieceKind, space: SpaceId, count: u32) -> Result<(), StateError> {
        self.take_from_pool(PoolKind::Available, kind, count)?;
        self.space_mut(space)?.add_pieces(kind, count);
        Ok(())
    }

    /// Move pieces from the available pool onto the map.
    pub fn place_from_available(&mut self, kind: PieceKind, space: SpaceId, count: u32) -> Result<(), StateError> {
        self.take_from_pool(PoolKind::Available, kind, count)?;
        self.space_mut(space)?.add_pieces(kind, count);
        self.trace.note_space(space);
        Ok(())
    }

    /// Remove pieces from the map to the casualties pool.
    pub fn remove_to_casualties(&mut self, kind: PieceKind, space: SpaceId, count: u32) -> Result<(), StateError> {
        self.take_from_space(kind, space, count)?;
        *self.casualties.entry(kind).or_insert(0) += count;
        self.trace.note_space(space);
        Ok(())
    }

    /// Remove pieces from the map back to the available pool.
    pub fn remove_to_available(&mut self, kind: PieceKind, space: SpaceId, count: u32) -> Result<(), StateError> {
        self.take_from_space(kind, space, count)?;
        *self.available.entry(kind).or_insert(0) += count;
        self.trace.note_space(space);
        Ok(())
    }

    /// Move pieces between two spaces, marking both as affected.
    pub fn move_pieces(&mut self, kind: PieceKind, from: SpaceId, to: SpaceId, count: u32) -> Result<(), StateError> {
        self.take_from_space(kind, from, count)?;
        self.space_mut(to)?.add_pieces(kind, count);
        self.trace.note_space(from);
        self.trace.note_space(to);
        Ok(())
    }

    /// Return casualties to the available pool (period-end bookkeeping).
    pub fn return_casualties(&mut self, kind: PieceKind, count: u32) -> Result<(), StateError> {
        self.take_from_pool(PoolKind::Casualties, kind, count)?;
        *self.available.entry(kind).or_insert(0) += count;
        Ok(())
    }

    /// Release unavailable pieces into the available pool.
    pub fn release_unavailable(&mut self, kind: PieceKind, count: u32) -> Result<(), StateError> {
        self.take_from_pool(PoolKind::Unavailable, kind, count)?;
        *self.available.entry(kind).or_insert(0) += count;
        Ok(())
    }

    /// Total of each piece kind across pools and spaces. The totals are
    /// invariant for the whole game.
    #[must_use]
    pub fn piece_census(&self) -> BTreeMap<PieceKind, u32> {
        let mut census = BTreeMap::new();
        for pool in [&self.available, &self.unavailable, &self.casualties] {
            for (kind, count) in pool {
                *census.entry(*kind).or_insert(0) += count;
            }
        }
        for space in self.spaces.values() {
            for (kind, count) in space.pieces() {
                *census.entry(kind).or_insert(0) += count;
            }
        }
        census
    }

    fn take_from_pool(&mut self, pool: PoolKind, kind: PieceKind, count: u32) -> Result<(), StateError> {
        let pool = match pool {
            PoolKind::Available => &mut self.available,
            PoolKind::Unavailable => &mut self.unavailable,
            PoolKind::Casualties => &mut self.casualties,
        };
        let have = pool.get(&kind).copied().unwrap_or(0);
        if have < count {
            return Err(StateError::PoolExhausted { kind, need: count, have });
        }
        pool.insert(kind, have - count);
        Ok(())
    }

    fn take_from_space(&mut self, kind: PieceKind, space: SpaceId, count: u32) -> Result<(), StateError> {
        let sp = self.space_mut(space)?;
        let have = sp.piece_count(kind);
        if have < count {
            return Err(StateError::NotEnoughPieces { space, kind, need: count, have });
        }
        sp.remove_pieces(kind, count);
        Ok(())
    }

    // === Resources ===

    /// Read-only resource ledger.
    #[must_use]
    pub fn resources(&self) -> &ResourceLedger {
        &self.resources
    }

    /// Spend resources, recording the delta in the turn trace.
    pub fn spend_resources(&mut self, faction: FactionId, amount: i64) -> Result<(), crate::error::LedgerError> {
        self.resources.spend(faction, amount)?;
        self.trace.note_resource_delta(faction, -amount);
        Ok(())
    }

    /// Add resources (clamped), recording the actual gain in the trace.
    pub fn add_resources(&mut self, faction: FactionId, amount: i64) -> i64 {
        let gained = self.resources.add(faction, amount);
        self.trace.note_resource_delta(faction, gained);
        gained
    }

    /// Set a balance directly (setup only).
    pub fn set_resources(&mut self, faction: FactionId, amount: i64) {
        self.resources.set(faction, amount);
    }

    // === Eligibility ===

    /// Read-only eligibility tracker.
    #[must_use]
    pub fn eligibility(&self) -> &EligibilityTracker {
        &self.eligibility
    }

    /// Mutable eligibility tracker (engine and event effects).
    pub fn eligibility_mut(&mut self) -> &mut EligibilityTracker {
        &mut self.eligibility
    }

    // === Free operations ===

    /// Read-only free-operation queue.
    #[must_use]
    pub fn free_ops(&self) -> &FreeOperationQueue {
        &self.free_ops
    }

    /// Mutable free-operation queue (event handlers enqueue, the
    /// sandbox drains).
    pub fn free_ops_mut(&mut self) -> &mut FreeOperationQueue {
        &mut self.free_ops
    }

    // === Leaders and markers ===

    /// Place or move a leader; `None` takes it off map.
    pub fn set_leader(&mut self, name: impl Into<String>, space: Option<SpaceId>) {
        self.leaders.insert(name.into(), space);
    }

    /// A leader's position.
    #[must_use]
    pub fn leader(&self, name: &str) -> Option<SpaceId> {
        self.leaders.get(name).copied().flatten()
    }

    /// Place a marker in a space, recording the space as affected.
    pub fn place_marker(&mut self, tag: impl Into<String>, space: SpaceId) {
        self.markers.entry(tag.into()).or_default().insert(space);
        self.trace.note_space(space);
    }

    /// Remove a marker from a space.
    pub fn remove_marker(&mut self, tag: &str, space: SpaceId) -> bool {
        self.markers.get_mut(tag).is_some_and(|set| set.remove(&space))
    }

    /// True if the marker tag is present in the space.
    #[must_use]
    pub fn has_marker(&self, tag: &str, space: SpaceId) -> bool {
        self.markers.get(tag).is_some_and(|set| set.contains(&space))
    }

    // === Deck ===

    /// Set the deck at setup (front of the slice = next card).
    pub fn set_deck(&mut self, cards: Vec<Card>) {
        self.deck = cards.into_iter().collect();
    }

    /// Cards left in the deck (excluding the upcoming buffer).
    #[must_use]
    pub fn deck_size(&self) -> usize {
        self.deck.len()
    }

    /// The card being resolved.
    #[must_use]
    pub fn current_card(&self) -> Option<&Card> {
        self.current_card.as_ref()
    }

    /// The revealed-but-not-current card.
    #[must_use]
    pub fn upcoming_card(&self) -> Option<&Card> {
        self.upcoming_card.as_ref()
    }

    /// Make a card current (engine use).
    pub fn set_current_card(&mut self, card: Card) {
        self.current_card = Some(card);
    }

    /// Reveal the next card, updating current/upcoming/deck.
    ///
    /// If the card revealed into the upcoming slot is winter quarters, it
    /// becomes current immediately and the drawn card waits in the
    /// upcoming slot instead.
    pub fn draw_card(&mut self) -> Option<Card> {
        let current = match self.upcoming_card.take() {
            Some(card) => card,
            None => self.deck.pop_front()?,
        };

        let next_upcoming = self.deck.pop_front();

        if let Some(next) = &next_upcoming {
            if next.winter_quarters {
                let wq = next.clone();
                self.current_card = Some(wq.clone());
                self.upcoming_card = Some(current);
                return Some(wq);
            }
        }

        self.upcoming_card = next_upcoming;
        self.current_card = Some(current.clone());
        Some(current)
    }

    // === History ===

    /// Append a history record, assigning the next sequence number.
    pub fn push_history(&mut self, record: HistoryRecord) {
        let entry = HistoryEntry {
            seq: self.next_seq,
            card: self.current_card.as_ref().map(|c| c.id),
            record,
        };
        self.next_seq += 1;
        self.history.push_back(entry);
    }

    /// The full history.
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    /// The most recent entry.
    #[must_use]
    pub fn last_history(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    // === Turn trace ===

    /// The in-progress turn's trace.
    #[must_use]
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Reset the trace to empty. The sandbox calls this at the start of
    /// every attempt; failure to do so would let residue from an
    /// abandoned attempt poison the next legality check.
    pub fn reset_trace(&mut self) {
        self.trace.reset();
    }

    /// Record a space as affected without moving pieces (content
    /// handlers with bespoke effects).
    pub fn touch_space(&mut self, space: SpaceId) {
        self.trace.note_space(space);
    }

    /// Record that a special activity was used this turn.
    pub fn note_special_used(&mut self) {
        self.trace.note_special();
    }

    pub(crate) fn trace_mut(&mut self) -> &mut Trace {
        &mut self.trace
    }

    // === RNG ===

    /// The world's RNG (handlers roll dice through this).
    pub fn rng_mut(&mut self) -> &mut GameRng {
        &mut self.rng
    }

    /// Snapshot of the RNG (engine decision plumbing).
    #[must_use]
    pub fn rng(&self) -> &GameRng {
        &self.rng
    }

    /// Replace the RNG (engine decision plumbing).
    pub fn set_rng(&mut self, rng: GameRng) {
        self.rng = rng;
    }

    /// Everything that matters for "did this do anything": spaces,
    /// pools, resources, eligibility, markers, and leaders. Ignores
    /// history, trace, RNG position, and deck bookkeeping. Used by the
    /// ineffective-event test.
    #[must_use]
    pub fn material_eq(&self, other: &Self) -> bool {
        self.spaces == other.spaces
            && self.available == other.available
            && self.unavailable == other.unavailable
            && self.casualties == other.casualties
            && self.resources == other.resources
            && self.eligibility == other.eligibility
            && self.leaders == other.leaders
            && self.markers == other.markers
            && self.free_ops == other.free_ops
    }
}

enum PoolKind {
    Available,
    Unavailable,
    Casualties,
}
