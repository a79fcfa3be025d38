//! # sop-engine
//!
//! A turn-resolution and decision-validation engine for card-driven,
//! multi-faction strategy simulations.
//!
//! ## Design Principles
//!
//! 1. **Content-Agnostic**: No hardcoded maps, factions, operations, or
//!    events. Scenario packs register everything at setup.
//!
//! 2. **Speculate, Never Undo**: Candidate actions run against a private
//!    deep copy of the world (`ActionSandbox`); validated copies are
//!    committed wholesale, rejected ones dropped. There is no
//!    mutate-then-rollback anywhere.
//!
//! 3. **Deterministic Replay**: A seeded RNG lives inside the world
//!    state, all iterated collections are ordered, and history carries
//!    no wall-clock data. Same seed, same decisions, same game.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: O(1) structural sharing via `im`
//!   makes the per-attempt world clone cheap.
//!
//! - **Trace-Based Legality**: handlers record affected spaces and
//!   resource deltas into an embedded trace as a side effect of
//!   mutating the world; the validator reads the trace instead of
//!   trusting the proposal.
//!
//! - **Uniform Providers**: bots and human input implement the same
//!   `DecisionProvider` contract; the engine only differs on whether it
//!   re-solicits after a rejection.
//!
//! ## Modules
//!
//! - `core`: faction/space/card/action types, world state, RNG
//! - `ledger`: per-faction resource balances
//! - `eligibility`: sequence-of-play status cycle
//! - `free_ops`: event-granted operation queue
//! - `handlers`: content registry (operations and events)
//! - `sandbox`: speculative execution and the turn trace
//! - `legality`: slot constraints and the action validator
//! - `agent`: flowchart decision providers
//! - `engine`: card flow and the propose/validate/commit cycle
//! - `games`: bundled demo content

pub mod agent;
pub mod core;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod free_ops;
pub mod games;
pub mod handlers;
pub mod history;
pub mod ledger;
pub mod legality;
pub mod sandbox;

// Re-export commonly used types
pub use crate::core::{
    Action, ActionKind, Card, CardId, EventSide, FactionId, FactionMap, GameRng, GameRngState,
    OpId, PieceKind, Space, SpaceId, SpecialPlay, WorldState,
};

pub use crate::agent::{Decision, DecisionProvider, FlowchartAgent, FlowchartNode, NodeKind};

pub use crate::eligibility::{Eligibility, EligibilityTracker};

pub use crate::engine::{CardOutcome, EngineConfig, ExecutedKind, TurnEngine, TurnOutcome, TurnRecord};

pub use crate::error::{
    AttemptError, Fault, HandlerError, LedgerError, PassReason, RegistryError, RejectReason,
    StateError,
};

pub use crate::free_ops::{FreeOperation, FreeOperationQueue};

pub use crate::handlers::{EventHandler, HandlerContext, HandlerRegistry, OpHandler};

pub use crate::history::{HistoryEntry, HistoryRecord};

pub use crate::ledger::{ResourceLedger, DEFAULT_MAX_RESOURCES};

pub use crate::legality::{FirstAction, LegalityValidator, SlotConstraints};

pub use crate::sandbox::{ActionSandbox, SandboxRun, Trace};
