//! The decision-agent framework.
//!
//! A flowchart agent is an ordered table of `(predicate, builder)`
//! nodes, one per published flowchart node, evaluated in fixed priority
//! order against the current world and the turn's slot constraints. For
//! the first predicate that holds, the builder constructs a candidate
//! `Action` already narrowed to the active constraints: in a limited
//! slot the builder itself picks the single space rather than relying
//! on the validator to reject a broader proposal.
//!
//! Candidates are sandboxed and validated inside the agent; the first
//! accepted one is returned. Construction failure, sandbox fault, or
//! validator rejection all fall through to the next node (each attempt
//! gets a fresh trace from the sandbox). Exhausting the table yields a
//! Pass.
//!
//! Human input implements the same `DecisionProvider` contract, so the
//! engine treats human and automated turns uniformly; the only
//! difference is that humans are re-solicited after a rejection.

pub mod scan;

use crate::core::{Action, Card, EventSide, FactionId, GameRng, WorldState};
use crate::error::{PassReason, RejectReason};
use crate::legality::{LegalityValidator, SlotConstraints};
use crate::sandbox::ActionSandbox;

/// What a decision provider resolved to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Execute this action (the engine will sandbox and validate it).
    Act(Action),
    /// Pass, with the reason to record.
    Pass(PassReason),
}

/// Uniform decision contract for bots and human-input providers.
pub trait DecisionProvider {
    /// Decide this faction's turn. All randomness must come from `rng`.
    fn decide(
        &mut self,
        world: &WorldState,
        card: &Card,
        constraints: &SlotConstraints,
        sandbox: &ActionSandbox<'_>,
        rng: &mut GameRng,
    ) -> Decision;

    /// Called when a proposed action was rejected. Providers that
    /// re-solicit (human input) return `true` from
    /// [`DecisionProvider::retry_on_reject`] and will be asked again.
    fn rejected(&mut self, _action: &Action, _reason: &RejectReason) {}

    /// Whether the engine should ask again after a rejection.
    /// Flowchart agents already did their own fallbacks; human input
    /// wants the error reported and the choice re-solicited.
    fn retry_on_reject(&self) -> bool {
        false
    }
}

/// Whether a node proposes the event or a command. The agent uses this
/// to skip event nodes in no-event slots and command nodes when the
/// faction cannot pay for anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// The node resolves the card's event.
    Event,
    /// The node builds a command (optionally with a special activity).
    Command,
}

type Predicate =
    Box<dyn Fn(&WorldState, &SlotConstraints, &ActionSandbox<'_>) -> bool + Send + Sync>;
type Builder = Box<dyn Fn(&WorldState, &SlotConstraints, &mut GameRng) -> Option<Action> + Send + Sync>;

/// One flowchart node: fires when its predicate holds and its builder
/// produces a candidate that survives sandbox and validator.
pub struct FlowchartNode {
    name: String,
    kind: NodeKind,
    predicate: Predicate,
    builder: Builder,
}

impl FlowchartNode {
    /// Create a node.
    pub fn new(
        name: impl Into<String>,
        kind: NodeKind,
        predicate: impl Fn(&WorldState, &SlotConstraints, &ActionSandbox<'_>) -> bool + Send + Sync + 'static,
        builder: impl Fn(&WorldState, &SlotConstraints, &mut GameRng) -> Option<Action> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            predicate: Box::new(predicate),
            builder: Box::new(builder),
        }
    }

    /// Node name, for logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered-fallback decision procedure for one faction.
pub struct FlowchartAgent {
    faction: FactionId,
    nodes: Vec<FlowchartNode>,
}

impl FlowchartAgent {
    /// Create an agent with no nodes (always passes).
    #[must_use]
    pub fn new(faction: FactionId) -> Self {
        Self {
            faction,
            nodes: Vec::new(),
        }
    }

    /// The faction this agent plays.
    #[must_use]
    pub fn faction(&self) -> FactionId {
        self.faction
    }

    /// Append a node (builder style). Order of insertion is priority
    /// order.
    #[must_use]
    pub fn with_node(mut self, node: FlowchartNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Append a node.
    pub fn push_node(&mut self, node: FlowchartNode) {
        self.nodes.push(node);
    }
}

impl DecisionProvider for FlowchartAgent {
    fn decide(
        &mut self,
        world: &WorldState,
        _card: &Card,
        constraints: &SlotConstraints,
        sandbox: &ActionSandbox<'_>,
        rng: &mut GameRng,
    ) -> Decision {
        let broke = world.resources().balance(self.faction) <= 0;
        let mut resource_gated = false;

        for node in &self.nodes {
            match node.kind {
                NodeKind::Event if !constraints.event_allowed => continue,
                NodeKind::Command if broke => {
                    // Commands cost resources; with an empty purse this
                    // branch can never fire.
                    resource_gated = true;
                    continue;
                }
                _ => {}
            }

            if !(node.predicate)(world, constraints, sandbox) {
                continue;
            }

            let Some(action) = (node.builder)(world, constraints, rng) else {
                // Construction failure: fall through, not fatal.
                continue;
            };

            // Every attempt gets its own fresh trace inside the sandbox.
            let run = match sandbox.attempt(world, &action) {
                Ok(run) => run,
                Err(err) => {
                    log::debug!(
                        "{}: node '{}' attempt failed ({err}), falling through",
                        self.faction,
                        node.name
                    );
                    continue;
                }
            };

            match LegalityValidator::check(constraints, &action, &run.trace, run.world.resources()) {
                Ok(()) => {
                    log::debug!("{}: node '{}' accepted", self.faction, node.name);
                    return Decision::Act(action);
                }
                Err(reason) => {
                    log::debug!(
                        "{}: node '{}' rejected ({reason}), falling through",
                        self.faction,
                        node.name
                    );
                    continue;
                }
            }
        }

        Decision::Pass(if resource_gated {
            PassReason::ResourceGate
        } else {
            PassReason::NoValidCommand
        })
    }
}

/// True if resolving the card's event would change anything material.
///
/// Flowcharts skip events that would do nothing; this runs the event in
/// the sandbox and compares board-material state, ignoring history, RNG
/// position, and the turn trace.
#[must_use]
pub fn event_is_effective(
    world: &WorldState,
    faction: FactionId,
    side: EventSide,
    sandbox: &ActionSandbox<'_>,
) -> bool {
    match sandbox.attempt(world, &Action::event(faction, side)) {
        Ok(run) => !run.world.material_eq(world),
        Err(_) => false,
    }
}
