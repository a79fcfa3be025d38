//! Error taxonomy.
//!
//! Three layers, matching how failures propagate:
//!
//! - `StateError` / `LedgerError`: what a handler sees when it asks the
//!   world for something impossible (missing pieces, empty pools,
//!   unaffordable costs). Handlers bubble these up with `?`.
//! - `HandlerError`: anything a content handler can return. The sandbox
//!   boundary converts these (and panics) into a `Fault` or, for
//!   resource shortfalls, a `RejectReason`.
//! - `RejectReason` / `PassReason`: validator verdicts and the reason
//!   codes attached to forced passes. These are serializable because
//!   they land in history entries.
//!
//! Nothing raised inside a handler or agent escapes the engine's
//! per-faction step; every failure degrades to a logged pass.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{CardId, FactionId, OpId, PieceKind, SpaceId};

/// World-state mutation errors.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StateError {
    /// The space ID is not on the map.
    #[error("unknown space {0:?}")]
    UnknownSpace(SpaceId),

    /// A removal asked for more pieces than the space holds.
    #[error("space {space:?} holds {have} of piece kind {kind:?}, need {need}")]
    NotEnoughPieces {
        /// Space being drawn from.
        space: SpaceId,
        /// Piece kind requested.
        kind: PieceKind,
        /// Count requested.
        need: u32,
        /// Count present.
        have: u32,
    },

    /// A placement asked for more pieces than the pool holds.
    #[error("pool holds {have} of piece kind {kind:?}, need {need}")]
    PoolExhausted {
        /// Piece kind requested.
        kind: PieceKind,
        /// Count requested.
        need: u32,
        /// Count in the pool.
        have: u32,
    },
}

/// Resource ledger errors.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Spending would drive the balance negative.
    #[error("{faction} cannot afford {cost} resources (balance {balance})")]
    InsufficientResources {
        /// Paying faction.
        faction: FactionId,
        /// Amount requested.
        cost: i64,
        /// Current balance.
        balance: i64,
    },
}

/// Errors a content handler may return.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// World-state mutation failed.
    #[error(transparent)]
    State(#[from] StateError),

    /// Resource spend failed.
    #[error(transparent)]
    Resources(#[from] LedgerError),

    /// The handler needed a target and none of the given ones work.
    #[error("no usable target")]
    NoValidTarget,

    /// Content-specific failure.
    #[error("{0}")]
    Content(String),
}

/// Registry configuration errors (setup time).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// An operation label was registered twice.
    #[error("operation '{0}' already registered")]
    DuplicateOp(String),

    /// An event handler was registered twice for one card.
    #[error("event handler for card {0:?} already registered")]
    DuplicateEvent(CardId),
}

/// An unexpected failure during sandboxed execution.
///
/// Always caught at the sandbox boundary; never allowed to terminate the
/// turn loop or corrupt canonical state.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Fault {
    /// A handler returned an error the engine cannot interpret as a
    /// legality verdict.
    #[error("handler for '{op}' failed: {source}")]
    Handler {
        /// Operation name as registered.
        op: String,
        /// The underlying handler error.
        #[source]
        source: HandlerError,
    },

    /// A handler panicked mid-execution.
    #[error("handler for '{op}' panicked: {message}")]
    HandlerPanic {
        /// Operation name as registered.
        op: String,
        /// Panic payload, if it was a string.
        message: String,
    },

    /// An action referenced an operation with no registered handler.
    #[error("no handler registered for operation {0:?}")]
    UnknownOp(OpId),

    /// An event action was proposed for a card with no event handler.
    #[error("no event handler registered for card {0:?}")]
    UnknownEvent(CardId),

    /// An event action was proposed with no card in play.
    #[error("no current card to resolve an event from")]
    NoCurrentCard,
}

/// Why the validator rejected an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum RejectReason {
    /// An event was proposed in a slot where events are not allowed.
    #[error("action type not allowed in this slot")]
    ActionTypeNotAllowed,

    /// A special activity was used in a slot that forbids them.
    #[error("special activity used in a limited slot")]
    LimitedUsedSpecial,

    /// A Limited Command affected other than exactly one space.
    #[error("limited command affected {affected} spaces, must be exactly 1")]
    LimitedWrongCount {
        /// Affected-space count observed in the trace.
        affected: usize,
    },

    /// A resource delta would drive a faction's balance negative.
    #[error("insufficient resources")]
    InsufficientResources,

    /// A command affected no spaces at all (a no-op).
    #[error("command affected no spaces")]
    NoAffectedSpaces,
}

/// Why a faction's turn became a pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassReason {
    /// The faction chose to pass.
    Voluntary,

    /// The faction could not afford any command.
    ResourceGate,

    /// The decision procedure exhausted every branch.
    NoValidCommand,

    /// The proposed action was rejected by the validator.
    IllegalAction(RejectReason),

    /// The decision procedure or a handler faulted; diagnostic attached.
    BotError(String),
}

impl std::fmt::Display for PassReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PassReason::Voluntary => write!(f, "pass"),
            PassReason::ResourceGate => write!(f, "resource_gate"),
            PassReason::NoValidCommand => write!(f, "no_valid_command"),
            PassReason::IllegalAction(reason) => write!(f, "illegal_action ({reason})"),
            PassReason::BotError(detail) => write!(f, "bot_error ({detail})"),
        }
    }
}

/// Failure of a single sandbox attempt.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AttemptError {
    /// The attempt is illegal; maps onto a validator reject reason.
    /// Resource shortfalls surface here because they abort the handler
    /// before the validator ever sees a trace.
    #[error("attempt rejected: {0}")]
    Rejected(RejectReason),

    /// Something unexpected happened inside the handler.
    #[error(transparent)]
    Fault(#[from] Fault),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_format() {
        assert_eq!(PassReason::ResourceGate.to_string(), "resource_gate");
        assert_eq!(PassReason::NoValidCommand.to_string(), "no_valid_command");
        assert!(PassReason::IllegalAction(RejectReason::NoAffectedSpaces)
            .to_string()
            .starts_with("illegal_action"));
    }

    #[test]
    fn test_handler_error_from_ledger() {
        let err: HandlerError = LedgerError::InsufficientResources {
            faction: FactionId::new(1),
            cost: 3,
            balance: 1,
        }
        .into();

        assert!(matches!(err, HandlerError::Resources(_)));
    }
}
