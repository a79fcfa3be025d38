//! Slot constraints and the legality validator.
//!
//! What a faction may do with its turn depends on its position in the
//! card's eligibility order and on what the first acting faction chose:
//!
//! | first faction's choice  | second faction may                        |
//! |-------------------------|-------------------------------------------|
//! | (none yet / passed)     | event, command + special, unlimited scope |
//! | event                   | command only (special allowed)            |
//! | command + special       | limited command **or** event              |
//! | command, no special     | limited command only                      |
//!
//! A Limited Command affects exactly one space and uses no special
//! activity. Constraints are recomputed fresh every turn and never
//! persisted.
//!
//! The validator inspects the sandbox trace, not the proposed action,
//! so over-broad proposals are rejected rather than silently truncated:
//! automatic down-scoping would change which space an agent "intended"
//! and alter behavior relative to the flowchart it reproduces.

use serde::{Deserialize, Serialize};

use crate::core::{Action, ActionKind};
use crate::error::RejectReason;
use crate::ledger::ResourceLedger;
use crate::sandbox::Trace;

/// What the first acting faction did this card, as far as the second
/// slot's constraints care.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FirstAction {
    /// The first faction resolved the event.
    Event,
    /// The first faction executed a command.
    Command {
        /// Whether it paired a special activity with it.
        used_special: bool,
    },
}

/// Per-slot legality flags, derived fresh for every faction-turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotConstraints {
    /// May the faction play the event?
    pub event_allowed: bool,

    /// May a command include a special activity?
    pub special_allowed: bool,

    /// Is the faction restricted to a Limited Command?
    pub limited_only: bool,
}

impl SlotConstraints {
    /// The first eligible faction acts with full freedom.
    #[must_use]
    pub fn first_eligible() -> Self {
        Self {
            event_allowed: true,
            special_allowed: true,
            limited_only: false,
        }
    }

    /// Constraints for the faction acting after `first`. `None` means
    /// nothing has executed yet this card (passes don't constrain).
    #[must_use]
    pub fn following(first: Option<&FirstAction>) -> Self {
        match first {
            None => Self::first_eligible(),
            Some(FirstAction::Event) => Self {
                event_allowed: false,
                special_allowed: true,
                limited_only: false,
            },
            Some(FirstAction::Command { used_special: true }) => Self {
                event_allowed: true,
                special_allowed: false,
                limited_only: true,
            },
            Some(FirstAction::Command { used_special: false }) => Self {
                event_allowed: false,
                special_allowed: false,
                limited_only: true,
            },
        }
    }
}

/// Accepts or rejects a sandboxed attempt against its slot constraints.
///
/// Stateless; operates on the trace the sandbox produced and the
/// sandboxed copy's ledger.
pub struct LegalityValidator;

impl LegalityValidator {
    /// Check a sandboxed attempt. `ledger` is the ledger of the
    /// *sandboxed* world, so every delta the attempt caused is visible.
    pub fn check(
        constraints: &SlotConstraints,
        action: &Action,
        trace: &Trace,
        ledger: &ResourceLedger,
    ) -> Result<(), RejectReason> {
        match &action.kind {
            ActionKind::Pass => Ok(()),

            ActionKind::Event { .. } => {
                if !constraints.event_allowed {
                    return Err(RejectReason::ActionTypeNotAllowed);
                }
                Self::check_balances(ledger)
            }

            ActionKind::Command { .. } => {
                if trace.used_special() && !constraints.special_allowed {
                    return Err(RejectReason::LimitedUsedSpecial);
                }
                let affected = trace.affected_count();
                if constraints.limited_only && affected != 1 {
                    return Err(RejectReason::LimitedWrongCount { affected });
                }
                if affected == 0 {
                    // A command that touched nothing is a no-op.
                    return Err(RejectReason::NoAffectedSpaces);
                }
                Self::check_balances(ledger)
            }
        }
    }

    /// The ledger never allows a negative balance, but the validator
    /// still refuses to commit one: handlers could bypass the ledger
    /// only by violating their contract, and this is where that is
    /// caught.
    fn check_balances(ledger: &ResourceLedger) -> Result<(), RejectReason> {
        for (_, balance) in ledger.iter() {
            if balance < 0 {
                return Err(RejectReason::InsufficientResources);
            }
        }
        Ok(())
    }
}
