//! Action representation: a faction's proposal for one turn.
//!
//! An `Action` is transient: it is produced by a decision provider (bot
//! flowchart or human input), consumed immediately by the sandbox, and
//! never stored. What persists is the `HistoryEntry` written on commit.
//!
//! Actions are compositional: a kind (Pass, Event, or a Command naming an
//! operation and its target spaces) plus an optional special-activity
//! play. The engine does not interpret operation IDs; content registers
//! handlers for them in the `HandlerRegistry`.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::card::EventSide;
use super::faction::FactionId;
use super::space::SpaceId;

/// Operation identifier for commands and special activities,
/// content-defined and resolved through the handler registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OpId(pub u16);

impl OpId {
    /// Create a new operation ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }
}

/// The three things a faction can do with its turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Decline to act (always legal; pays the pass reward).
    Pass,

    /// Resolve the current card's event.
    Event {
        /// Which side of a dual event to resolve.
        side: EventSide,
    },

    /// Execute a command operation in the given target spaces.
    Command {
        /// The operation to run.
        op: OpId,
        /// Target spaces, in the order the builder selected them.
        targets: SmallVec<[SpaceId; 3]>,
        /// True when the builder scoped this as a Limited Command.
        limited: bool,
    },
}

/// A special activity paired with a command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialPlay {
    /// The special activity operation.
    pub op: OpId,
    /// Target space, if the activity takes one.
    pub space: Option<SpaceId>,
}

/// A complete turn proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// The acting faction.
    pub faction: FactionId,

    /// What to do.
    pub kind: ActionKind,

    /// Optional special activity (commands only; validated per slot).
    pub special: Option<SpecialPlay>,
}

impl Action {
    /// A pass.
    #[must_use]
    pub fn pass(faction: FactionId) -> Self {
        Self {
            faction,
            kind: ActionKind::Pass,
            special: None,
        }
    }

    /// Play the current card's event.
    #[must_use]
    pub fn event(faction: FactionId, side: EventSide) -> Self {
        Self {
            faction,
            kind: ActionKind::Event { side },
            special: None,
        }
    }

    /// Execute a command in the given spaces.
    #[must_use]
    pub fn command(faction: FactionId, op: OpId, targets: &[SpaceId]) -> Self {
        Self {
            faction,
            kind: ActionKind::Command {
                op,
                targets: SmallVec::from_slice(targets),
                limited: false,
            },
            special: None,
        }
    }

    /// Execute a Limited Command (single space, no special activity).
    #[must_use]
    pub fn limited_command(faction: FactionId, op: OpId, target: SpaceId) -> Self {
        Self {
            faction,
            kind: ActionKind::Command {
                op,
                targets: SmallVec::from_slice(&[target]),
                limited: true,
            },
            special: None,
        }
    }

    /// Attach a special activity (builder style).
    #[must_use]
    pub fn with_special(mut self, op: OpId, space: Option<SpaceId>) -> Self {
        self.special = Some(SpecialPlay { op, space });
        self
    }

    /// True for pass actions.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self.kind, ActionKind::Pass)
    }

    /// Number of target spaces for a command, 0 otherwise.
    #[must_use]
    pub fn target_count(&self) -> usize {
        match &self.kind {
            ActionKind::Command { targets, .. } => targets.len(),
            _ => 0,
        }
    }
}
