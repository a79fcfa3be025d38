//! Core engine types: factions, spaces, cards, actions, state, RNG.
//!
//! This module contains the fundamental building blocks that are
//! content-agnostic. Scenario packs register maps, piece kinds,
//! operations, and events at setup rather than modifying the core.

pub mod action;
pub mod card;
pub mod faction;
pub mod rng;
pub mod space;
pub mod state;

pub use action::{Action, ActionKind, OpId, SpecialPlay};
pub use card::{Card, CardId, EventSide};
pub use faction::{FactionId, FactionMap};
pub use rng::{GameRng, GameRngState};
pub use space::{PieceKind, Space, SpaceId, SUPPORT_MAX, SUPPORT_MIN};
pub use state::WorldState;
