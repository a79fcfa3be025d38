//! Speculative execution: try a candidate action on a private copy.
//!
//! `ActionSandbox::attempt` deep-clones the world, resets the copy's
//! turn trace, runs the relevant handler against the copy, and returns
//! the mutated copy plus its trace. The caller's world is never touched:
//! on rejection the copy is simply dropped, on acceptance it becomes the
//! new canonical state. There is no mutate-then-undo anywhere.
//!
//! Two hard contracts live here:
//!
//! - The trace is freshly reset before **every** attempt, including
//!   every fallback attempt inside one agent's decision chain. Residue
//!   from an abandoned attempt poisoning the next legality check was
//!   the single most damaging defect class in play-testing.
//! - Nothing escapes the boundary: handler errors become typed faults
//!   (or, for resource shortfalls, a reject reason), and outright
//!   panics are caught with `catch_unwind`.
//!
//! Free operations enqueued by an event are drained here, immediately
//! after the event handler returns, so the drain-once-per-resolution
//! invariant holds for every call path that can resolve an event.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::core::{Action, ActionKind, FactionId, OpId, SpaceId, WorldState};
use crate::error::{AttemptError, Fault, HandlerError, RejectReason};
use crate::handlers::{HandlerContext, HandlerRegistry};
use crate::history::HistoryRecord;

/// Bookkeeping for one sandbox attempt.
///
/// Embedded in `WorldState` so every mutating operation records into it
/// without handlers having to remember; reset to empty at the start of
/// every attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    /// Spaces the attempt affected, in ID order.
    affected: BTreeSet<SpaceId>,

    /// True if a special activity was part of the attempt.
    used_special: bool,

    /// The command operation that ran, if any.
    command: Option<OpId>,

    /// Net resource delta per faction index (negative = spent).
    deltas: Vec<(FactionId, i64)>,
}

impl Trace {
    /// Reset to empty.
    pub fn reset(&mut self) {
        self.affected.clear();
        self.used_special = false;
        self.command = None;
        self.deltas.clear();
    }

    /// True if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.affected.is_empty() && !self.used_special && self.command.is_none() && self.deltas.is_empty()
    }

    /// Record an affected space.
    pub fn note_space(&mut self, space: SpaceId) {
        self.affected.insert(space);
    }

    /// Record special-activity usage.
    pub fn note_special(&mut self) {
        self.used_special = true;
    }

    /// Record which command ran.
    pub fn note_command(&mut self, op: OpId) {
        self.command = Some(op);
    }

    /// Record a resource delta (negative = spent).
    pub fn note_resource_delta(&mut self, faction: FactionId, delta: i64) {
        if delta != 0 {
            self.deltas.push((faction, delta));
        }
    }

    /// Affected spaces in ID order.
    pub fn affected(&self) -> impl Iterator<Item = SpaceId> + '_ {
        self.affected.iter().copied()
    }

    /// Number of affected spaces.
    #[must_use]
    pub fn affected_count(&self) -> usize {
        self.affected.len()
    }

    /// Whether a special activity fired.
    #[must_use]
    pub fn used_special(&self) -> bool {
        self.used_special
    }

    /// The command that ran, if any.
    #[must_use]
    pub fn command(&self) -> Option<OpId> {
        self.command
    }

    /// Net resource delta for one faction across the attempt.
    #[must_use]
    pub fn resource_delta(&self, faction: FactionId) -> i64 {
        self.deltas
            .iter()
            .filter(|(f, _)| *f == faction)
            .map(|(_, d)| d)
            .sum()
    }
}

/// The world copy and trace produced by a successful attempt.
#[derive(Clone, Debug)]
pub struct SandboxRun {
    /// The mutated private copy; committing it makes it canonical.
    pub world: WorldState,

    /// The attempt's bookkeeping, for the legality validator.
    pub trace: Trace,
}

/// Executes candidate actions against private world copies.
pub struct ActionSandbox<'a> {
    handlers: &'a HandlerRegistry,
}

impl<'a> ActionSandbox<'a> {
    /// Create a sandbox over the given handler registry.
    #[must_use]
    pub fn new(handlers: &'a HandlerRegistry) -> Self {
        Self { handlers }
    }

    /// Try `action` against a private copy of `world`.
    ///
    /// Never mutates `world`. A fresh trace is initialized before the
    /// handler runs; panics and handler errors are converted into typed
    /// failures.
    pub fn attempt(&self, world: &WorldState, action: &Action) -> Result<SandboxRun, AttemptError> {
        let mut copy = world.clone();
        copy.reset_trace();

        let result = catch_unwind(AssertUnwindSafe(|| self.execute(&mut copy, action)));

        match result {
            Ok(Ok(())) => Ok(SandboxRun {
                trace: copy.trace().clone(),
                world: copy,
            }),
            Ok(Err(err)) => Err(err),
            Err(payload) => Err(AttemptError::Fault(Fault::HandlerPanic {
                op: describe_action(action),
                message: panic_message(payload.as_ref()),
            })),
        }
    }

    fn execute(&self, world: &mut WorldState, action: &Action) -> Result<(), AttemptError> {
        match &action.kind {
            ActionKind::Pass => Ok(()),

            ActionKind::Event { side } => {
                let card = world
                    .current_card()
                    .cloned()
                    .ok_or(AttemptError::Fault(Fault::NoCurrentCard))?;
                let handler = self.handlers.event(card.id)?;
                handler
                    .resolve(world, action.faction, *side)
                    .map_err(|e| convert_handler_error(&card.title, e))?;
                // Drain-once-per-resolution: the only drain site.
                self.drain_free_ops(world)
            }

            ActionKind::Command { op, targets, limited } => {
                let (name, handler) = self.handlers.command(*op)?;
                world.trace_mut().note_command(*op);
                let ctx = HandlerContext {
                    targets,
                    free: false,
                    limited: *limited,
                };
                handler
                    .execute(world, action.faction, &ctx)
                    .map_err(|e| convert_handler_error(name, e))?;

                if let Some(special) = &action.special {
                    let (sa_name, sa_handler) = self.handlers.special(special.op)?;
                    world.note_special_used();
                    let targets: &[SpaceId] = match &special.space {
                        Some(space) => std::slice::from_ref(space),
                        None => &[],
                    };
                    let sa_ctx = HandlerContext {
                        targets,
                        free: true,
                        limited: false,
                    };
                    sa_handler
                        .execute(world, action.faction, &sa_ctx)
                        .map_err(|e| convert_handler_error(sa_name, e))?;
                }
                Ok(())
            }
        }
    }

    /// Execute every queued free operation in enqueue order.
    fn drain_free_ops(&self, world: &mut WorldState) -> Result<(), AttemptError> {
        let ops = world.free_ops_mut().drain();
        for free_op in ops {
            let (name, handler) = self.handlers.operation(free_op.op)?;
            let name = name.to_string();
            let targets: &[SpaceId] = match &free_op.space {
                Some(space) => std::slice::from_ref(space),
                None => &[],
            };
            let ctx = HandlerContext {
                targets,
                free: true,
                limited: false,
            };
            handler
                .execute(world, free_op.faction, &ctx)
                .map_err(|e| convert_handler_error(&name, e))?;
            world.push_history(HistoryRecord::FreeOperation {
                faction: free_op.faction,
                op: name,
                space: free_op.space,
            });
        }
        Ok(())
    }
}

/// Resource shortfalls abort the handler before the validator can see a
/// trace, so they map onto the validator's reject reason here. Anything
/// else is an unexpected fault.
fn convert_handler_error(op: &str, err: HandlerError) -> AttemptError {
    match err {
        HandlerError::Resources(_) => AttemptError::Rejected(RejectReason::InsufficientResources),
        other => AttemptError::Fault(Fault::Handler {
            op: op.to_string(),
            source: other,
        }),
    }
}

fn describe_action(action: &Action) -> String {
    match &action.kind {
        ActionKind::Pass => "pass".to_string(),
        ActionKind::Event { .. } => "event".to_string(),
        ActionKind::Command { op, .. } => format!("op#{}", op.0),
    }
}

/// Best-effort extraction of a panic payload's message.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
