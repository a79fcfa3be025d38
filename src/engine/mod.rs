//! The turn engine: card flow, acting queue, and the
//! propose/attempt/validate/commit cycle.
//!
//! The engine owns the canonical `WorldState` and is its only writer.
//! Each card it reveals yields an acting queue from the card's printed
//! faction order, filtered to the factions currently eligible. Slots
//! resolve one at a time until the per-card action cap is reached;
//! eligible factions past the cap simply never get a slot.
//!
//! A faction's slot runs as: solicit a decision from its provider,
//! attempt the proposed action in the sandbox, check the sandbox trace
//! against the slot constraints, and only then commit the sandboxed
//! world as canonical. Proposals that fail validation never touch the
//! canonical state. Providers that re-solicit (human input) get the
//! rejection reported and a bounded number of fresh tries; everyone
//! else is converted to a forced pass carrying the rejection reason.
//!
//! Provider panics and content faults are contained the same way: the
//! slot resolves as a forced pass with a `BotError` reason, the fault
//! is logged, and the game continues.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::agent::{Decision, DecisionProvider};
use crate::core::{Action, ActionKind, Card, CardId, EventSide, FactionId, FactionMap, OpId, WorldState};
use crate::error::{AttemptError, PassReason, RejectReason};
use crate::handlers::HandlerRegistry;
use crate::history::HistoryRecord;
use crate::legality::{FirstAction, LegalityValidator, SlotConstraints};
use crate::sandbox::{panic_message, ActionSandbox, SandboxRun};

/// Engine tuning knobs, fixed at setup.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// How many factions act per card before the rest are shut out.
    pub actions_per_card: usize,

    /// Resources granted for passing, per faction.
    pub pass_rewards: FactionMap<i64>,

    /// How many fresh solicitations a re-soliciting provider gets after
    /// a rejection before the slot becomes a forced pass.
    pub max_reject_retries: usize,
}

impl EngineConfig {
    /// Defaults: two actions per card, pass reward 1, three retries.
    #[must_use]
    pub fn new(faction_count: usize) -> Self {
        Self {
            actions_per_card: 2,
            pass_rewards: FactionMap::with_value(faction_count, 1),
            max_reject_retries: 3,
        }
    }

    /// Override one faction's pass reward (builder style).
    #[must_use]
    pub fn with_pass_reward(mut self, faction: FactionId, reward: i64) -> Self {
        self.pass_rewards[faction] = reward;
        self
    }

    /// Override the per-card action cap (builder style).
    #[must_use]
    pub fn with_actions_per_card(mut self, cap: usize) -> Self {
        self.actions_per_card = cap;
        self
    }
}

/// What a faction's slot resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutedKind {
    /// The faction resolved the event.
    Event {
        /// The side resolved.
        side: EventSide,
    },
    /// The faction executed a command.
    Command {
        /// The operation run.
        op: OpId,
        /// Whether a special activity fired with it.
        used_special: bool,
    },
}

/// One faction's resolved slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnRecord {
    /// The acting faction.
    pub faction: FactionId,
    /// How the slot resolved.
    pub outcome: TurnOutcome,
}

/// Outcome of one slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// An action committed.
    Executed(ExecutedKind),
    /// The slot resolved as a pass (voluntary or forced).
    Passed(PassReason),
}

/// Everything that happened while one card resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardOutcome {
    /// The card that resolved.
    pub card: CardId,
    /// Slot results in acting order.
    pub turns: Vec<TurnRecord>,
    /// True if this was a winter-quarters card (no faction slots).
    pub winter_quarters: bool,
}

/// Owns the canonical world and drives the sequence of play.
pub struct TurnEngine {
    world: WorldState,
    handlers: HandlerRegistry,
    providers: BTreeMap<FactionId, Box<dyn DecisionProvider>>,
    config: EngineConfig,
}

impl TurnEngine {
    /// Create an engine around a set-up world and content registry.
    #[must_use]
    pub fn new(world: WorldState, handlers: HandlerRegistry, config: EngineConfig) -> Self {
        Self {
            world,
            handlers,
            providers: BTreeMap::new(),
            config,
        }
    }

    /// Install a faction's decision provider, replacing any previous
    /// one. Factions without a provider pass their slots.
    pub fn set_provider(&mut self, faction: FactionId, provider: Box<dyn DecisionProvider>) {
        self.providers.insert(faction, provider);
    }

    /// Install a provider (builder style).
    #[must_use]
    pub fn with_provider(mut self, faction: FactionId, provider: Box<dyn DecisionProvider>) -> Self {
        self.set_provider(faction, provider);
        self
    }

    /// The canonical world.
    #[must_use]
    pub fn world(&self) -> &WorldState {
        &self.world
    }

    /// The content registry.
    #[must_use]
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Consume the engine, yielding the final world.
    #[must_use]
    pub fn into_world(self) -> WorldState {
        self.world
    }

    /// Reveal the next card and resolve it. `None` when the deck is
    /// exhausted.
    pub fn play_next_card(&mut self) -> Option<CardOutcome> {
        let card = self.world.draw_card()?;
        Some(self.resolve_card(card))
    }

    /// Run the whole remaining deck.
    pub fn play_to_end(&mut self) -> Vec<CardOutcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.play_next_card() {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Resolve one card that is already current.
    fn resolve_card(&mut self, card: Card) -> CardOutcome {
        self.world.push_history(HistoryRecord::CardRevealed { card: card.id });
        log::info!("card {} \"{}\" revealed", card.id.0, card.title);

        if card.winter_quarters {
            // Winter quarters: no faction slots, and everyone starts
            // the new period eligible.
            self.world.eligibility_mut().reset_all();
            return CardOutcome {
                card: card.id,
                turns: Vec::new(),
                winter_quarters: true,
            };
        }

        self.world.eligibility_mut().begin_card();

        let queue: Vec<FactionId> = card
            .order
            .iter()
            .copied()
            .filter(|&f| self.world.eligibility().is_eligible(f))
            .collect();

        let mut first: Option<FirstAction> = None;
        let mut executed = 0usize;
        let mut turns = Vec::new();

        for faction in queue {
            if executed >= self.config.actions_per_card {
                break;
            }
            // An event resolved earlier this card may have revoked
            // eligibility mid-queue.
            if !self.world.eligibility().is_eligible(faction) {
                continue;
            }

            let constraints = SlotConstraints::following(first.as_ref());
            let record = self.play_slot(faction, &card, &constraints);

            if let TurnOutcome::Executed(kind) = &record.outcome {
                executed += 1;
                if first.is_none() {
                    first = Some(match kind {
                        ExecutedKind::Event { .. } => FirstAction::Event,
                        ExecutedKind::Command { used_special, .. } => FirstAction::Command {
                            used_special: *used_special,
                        },
                    });
                }
            }
            turns.push(record);
        }

        CardOutcome {
            card: card.id,
            turns,
            winter_quarters: false,
        }
    }

    /// Resolve one faction's slot.
    fn play_slot(&mut self, faction: FactionId, card: &Card, constraints: &SlotConstraints) -> TurnRecord {
        let mut decision = self.solicit(faction, card, constraints);
        let mut retries = self.config.max_reject_retries;

        loop {
            let action = match decision {
                Decision::Pass(reason) => return self.resolve_pass(faction, reason),
                Decision::Act(action) if action.is_pass() => {
                    return self.resolve_pass(faction, PassReason::Voluntary);
                }
                Decision::Act(action) => action,
            };

            // The slot belongs to one faction; a provider proposing on
            // another faction's behalf is a provider bug, not a move.
            if action.faction != faction {
                log::warn!(
                    "{faction}: provider proposed an action for {}, slot becomes a pass",
                    action.faction
                );
                return self.resolve_pass(
                    faction,
                    PassReason::BotError(format!("action proposed for {} out of turn", action.faction)),
                );
            }

            let sandbox = ActionSandbox::new(&self.handlers);
            let attempt = sandbox.attempt(&self.world, &action);

            let reason = match attempt {
                Ok(run) => {
                    match LegalityValidator::check(constraints, &action, &run.trace, run.world.resources()) {
                        Ok(()) => {
                            let kind = self.commit(faction, &action, run);
                            return TurnRecord {
                                faction,
                                outcome: TurnOutcome::Executed(kind),
                            };
                        }
                        Err(reason) => reason,
                    }
                }
                Err(AttemptError::Rejected(reason)) => reason,
                Err(AttemptError::Fault(fault)) => {
                    log::warn!("{faction}: content fault, slot becomes a pass: {fault}");
                    return self.resolve_pass(faction, PassReason::BotError(fault.to_string()));
                }
            };

            log::debug!("{faction}: proposal rejected: {reason}");
            if self.report_reject(faction, &action, &reason) && retries > 0 {
                retries -= 1;
                decision = self.solicit(faction, card, constraints);
            } else {
                return self.resolve_pass(faction, PassReason::IllegalAction(reason));
            }
        }
    }

    /// Ask the faction's provider for a decision, containing panics.
    fn solicit(&mut self, faction: FactionId, card: &Card, constraints: &SlotConstraints) -> Decision {
        let Some(provider) = self.providers.get_mut(&faction) else {
            log::warn!("{faction}: no decision provider installed");
            return Decision::Pass(PassReason::BotError("no decision provider".to_string()));
        };

        let sandbox = ActionSandbox::new(&self.handlers);
        let world = &self.world;
        let mut rng = world.rng().clone();

        let result = catch_unwind(AssertUnwindSafe(|| {
            provider.decide(world, card, constraints, &sandbox, &mut rng)
        }));

        // Decision draws stay on the canonical stream even when the
        // slot later resolves as a pass.
        self.world.set_rng(rng);

        match result {
            Ok(decision) => decision,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::warn!("{faction}: decision provider panicked: {message}");
                Decision::Pass(PassReason::BotError(message))
            }
        }
    }

    /// Report a rejection to the provider; true if it wants another try.
    fn report_reject(&mut self, faction: FactionId, action: &Action, reason: &RejectReason) -> bool {
        self.providers.get_mut(&faction).is_some_and(|provider| {
            provider.rejected(action, reason);
            provider.retry_on_reject()
        })
    }

    /// Adopt a validated sandbox run as canonical and log it.
    fn commit(&mut self, faction: FactionId, action: &Action, run: SandboxRun) -> ExecutedKind {
        let SandboxRun { world, trace } = run;
        self.world = world;

        let (kind, event_side, op_name) = match &action.kind {
            ActionKind::Event { side } => (ExecutedKind::Event { side: *side }, Some(*side), None),
            ActionKind::Command { op, .. } => (
                ExecutedKind::Command {
                    op: *op,
                    used_special: trace.used_special(),
                },
                None,
                self.handlers.op_name(*op).map(str::to_owned),
            ),
            // Pass proposals were peeled off before the sandbox ran.
            ActionKind::Pass => unreachable!("pass never reaches commit"),
        };

        self.world.push_history(HistoryRecord::Committed {
            faction,
            event_side,
            op: op_name,
            affected: trace.affected().collect(),
            used_special: trace.used_special(),
        });
        self.world.eligibility_mut().note_executed(faction);

        log::info!(
            "{faction}: committed ({} spaces affected{})",
            trace.affected_count(),
            if trace.used_special() { ", special used" } else { "" }
        );
        kind
    }

    /// Resolve a slot as a pass: pay the reward, record, keep eligible.
    fn resolve_pass(&mut self, faction: FactionId, reason: PassReason) -> TurnRecord {
        let reward = self.config.pass_rewards[faction];
        let gained = self.world.add_resources(faction, reward);

        self.world.push_history(HistoryRecord::Passed {
            faction,
            reason: reason.clone(),
            reward: gained,
        });
        self.world.eligibility_mut().note_passed(faction);

        log::info!("{faction}: passed ({reason}), reward {gained}");
        TurnRecord {
            faction,
            outcome: TurnOutcome::Passed(reason),
        }
    }
}
