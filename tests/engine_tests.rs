//! Full sequence-of-play tests over the bundled frontier pack.
//!
//! These drive the real engine end to end: card reveals, acting queues,
//! sandboxed attempts, slot constraints, commits, and forced passes.

use sop_engine::core::{Action, FactionId, WorldState};
use sop_engine::engine::{EngineConfig, TurnEngine, TurnOutcome};
use sop_engine::error::{AttemptError, HandlerError, PassReason, RejectReason};
use sop_engine::games::frontier::{
    self, CLANS, KORR_HIGHLANDS, LEGION, MUSTER, REBELS, REBEL_BAND, STRIKE, SYNDICATE, THE_REACH,
};
use sop_engine::history::HistoryRecord;
use sop_engine::legality::{LegalityValidator, SlotConstraints};
use sop_engine::sandbox::ActionSandbox;

/// A full playthrough never mints or destroys pieces.
#[test]
fn test_full_playthrough_conserves_pieces() {
    let mut engine = frontier::build_engine(42);
    let census_before = engine.world().piece_census();

    let outcomes = engine.play_to_end();
    assert_eq!(outcomes.len(), 4);

    assert_eq!(engine.world().piece_census(), census_before);
}

/// A full playthrough never drives any balance negative.
#[test]
fn test_balances_never_negative() {
    let mut engine = frontier::build_engine(17);
    engine.play_to_end();

    for (faction, balance) in engine.world().resources().iter() {
        assert!(balance >= 0, "{faction} ended at {balance}");
    }
}

/// The second eligible faction is held to one affected space when the
/// first executed an unadorned command.
#[test]
fn test_second_actor_limited_after_plain_command() {
    let mut world = frontier::build_world(5);
    let registry = frontier::build_registry();
    let sandbox = ActionSandbox::new(&registry);

    // Rebels muster broadly, as a first actor legally could.
    let first = Action::command(REBELS, MUSTER, &[THE_REACH, KORR_HIGHLANDS]);
    let run = sandbox.attempt(&world, &first).unwrap();
    LegalityValidator::check(
        &SlotConstraints::first_eligible(),
        &first,
        &run.trace,
        run.world.resources(),
    )
    .unwrap();
    world = run.world;

    // The follower proposing the same breadth is rejected.
    let constraints = SlotConstraints::following(Some(
        &sop_engine::legality::FirstAction::Command { used_special: false },
    ));
    let broad = Action::command(CLANS, MUSTER, &[THE_REACH, KORR_HIGHLANDS]);
    let run = sandbox.attempt(&world, &broad).unwrap();
    let verdict = LegalityValidator::check(&constraints, &broad, &run.trace, run.world.resources());
    assert_eq!(verdict, Err(RejectReason::LimitedWrongCount { affected: 2 }));

    // Scoped to one space it goes through.
    let narrow = Action::limited_command(CLANS, MUSTER, KORR_HIGHLANDS);
    let run = sandbox.attempt(&world, &narrow).unwrap();
    LegalityValidator::check(&constraints, &narrow, &run.trace, run.world.resources()).unwrap();
}

/// A rejected attempt leaves the canonical world untouched.
#[test]
fn test_rejected_attempt_is_invisible() {
    let mut world = frontier::build_world(6);
    world.set_resources(CLANS, 1);
    let registry = frontier::build_registry();
    let sandbox = ActionSandbox::new(&registry);
    let before = world.clone();

    // Three musters against one resource: shortfall mid-handler.
    let action = Action::command(CLANS, MUSTER, &[THE_REACH, KORR_HIGHLANDS, THE_REACH]);
    let err = sandbox.attempt(&world, &action).unwrap_err();
    assert_eq!(err, AttemptError::Rejected(RejectReason::InsufficientResources));

    assert_eq!(world, before);
}

/// The uprising event's free musters resolve in enqueue order, inside
/// the same turn, and charge nothing.
#[test]
fn test_free_operations_resolve_in_order() {
    let mut world = frontier::build_world(7);
    world.draw_card().unwrap(); // Supply Convoy
    world.draw_card().unwrap(); // Uprising becomes current

    let rebel_resources = world.resources().balance(REBELS);
    let registry = frontier::build_registry();
    let sandbox = ActionSandbox::new(&registry);

    let run = sandbox
        .attempt(&world, &Action::event(REBELS, sop_engine::core::EventSide::Unshaded))
        .unwrap();

    let free_ops: Vec<_> = run
        .world
        .history()
        .filter_map(|entry| match &entry.record {
            HistoryRecord::FreeOperation { space, .. } => Some(*space),
            _ => None,
        })
        .collect();
    assert_eq!(free_ops, vec![Some(THE_REACH), Some(KORR_HIGHLANDS)]);

    // Queue is empty, pieces landed, nothing was charged.
    assert!(run.world.free_ops().is_empty());
    assert_eq!(run.world.resources().balance(REBELS), rebel_resources);
    assert_eq!(
        run.world.space(THE_REACH).unwrap().piece_count(REBEL_BAND),
        world.space(THE_REACH).unwrap().piece_count(REBEL_BAND) + 1
    );
}

/// Executing costs next-card eligibility; passing does not.
#[test]
fn test_eligibility_follows_execution() {
    let mut engine = frontier::build_engine(11);

    let outcome = engine.play_next_card().unwrap();
    let executed: Vec<FactionId> = outcome
        .turns
        .iter()
        .filter(|t| matches!(t.outcome, TurnOutcome::Executed(_)))
        .map(|t| t.faction)
        .collect();
    assert!(!executed.is_empty());

    // Card 1's executors are filtered out of card 2's acting queue.
    let outcome = engine.play_next_card().unwrap();
    for turn in &outcome.turns {
        assert!(
            !executed.contains(&turn.faction),
            "{} acted on consecutive cards",
            turn.faction
        );
    }
}

/// An unaffordable slot becomes a recorded resource-gate pass that pays
/// the faction's reward.
#[test]
fn test_resource_gate_pass_is_recorded() {
    use sop_engine::agent::{FlowchartAgent, FlowchartNode, NodeKind};

    let mut world = frontier::build_world(13);
    world.set_resources(LEGION, 0);

    // Command-only agent: no event branch to fall back on for free.
    let broke_agent = FlowchartAgent::new(LEGION).with_node(FlowchartNode::new(
        "muster",
        NodeKind::Command,
        |_, _, _| true,
        |_, _, _| Some(Action::limited_command(LEGION, MUSTER, THE_REACH)),
    ));

    let mut engine = TurnEngine::new(world, frontier::build_registry(), frontier::build_config());
    engine.set_provider(LEGION, Box::new(broke_agent));
    for faction in [REBELS, SYNDICATE, CLANS] {
        engine.set_provider(faction, Box::new(frontier::build_agent(faction)));
    }

    engine.play_next_card().unwrap();

    let gated: Vec<_> = engine
        .world()
        .history()
        .filter_map(|e| match &e.record {
            HistoryRecord::Passed { faction, reason, reward } if *faction == LEGION => {
                Some((reason.clone(), *reward))
            }
            _ => None,
        })
        .collect();

    assert_eq!(gated, vec![(PassReason::ResourceGate, 2)]);
    assert_eq!(engine.world().resources().balance(LEGION), 2);
}

/// A handler that panics during sandboxing degrades the slot to a
/// bot-error pass; the board is untouched and the next faction acts.
#[test]
fn test_handler_panic_degrades_slot_to_pass() {
    use sop_engine::core::OpId;
    use sop_engine::handlers::HandlerContext;

    const BROKEN: OpId = OpId::new(99);

    struct Reckless;
    impl sop_engine::agent::DecisionProvider for Reckless {
        fn decide(
            &mut self,
            _: &WorldState,
            _: &sop_engine::core::Card,
            _: &SlotConstraints,
            _: &ActionSandbox<'_>,
            _: &mut sop_engine::core::GameRng,
        ) -> sop_engine::agent::Decision {
            sop_engine::agent::Decision::Act(Action::limited_command(LEGION, BROKEN, THE_REACH))
        }
    }

    let mut registry = frontier::build_registry();
    registry
        .register_command(
            BROKEN,
            "survey",
            |_: &mut WorldState, _: FactionId, _: &HandlerContext<'_>| -> Result<(), HandlerError> {
                panic!("torn map sheet");
            },
        )
        .unwrap();

    let world = frontier::build_world(19);
    let legion_resources = world.resources().balance(LEGION);
    let census = world.piece_census();

    let mut engine = TurnEngine::new(world, registry, frontier::build_config());
    engine.set_provider(LEGION, Box::new(Reckless));
    for faction in [REBELS, SYNDICATE, CLANS] {
        engine.set_provider(faction, Box::new(frontier::build_agent(faction)));
    }

    // Legion acts first on the opening card.
    let outcome = engine.play_next_card().unwrap();
    match &outcome.turns[0].outcome {
        TurnOutcome::Passed(PassReason::BotError(msg)) => assert!(msg.contains("torn map sheet")),
        other => panic!("expected bot-error pass, got {other:?}"),
    }

    // The fault left no committed entry for the Legion and only the
    // pass reward touched its ledger.
    assert!(!engine.world().history().any(|e| matches!(
        &e.record,
        HistoryRecord::Committed { faction, .. } if *faction == LEGION
    )));
    assert_eq!(
        engine.world().resources().balance(LEGION),
        legion_resources + 2
    );
    assert_eq!(engine.world().piece_census(), census);

    // The rebels' slot resolved normally after the fault.
    assert_eq!(outcome.turns[1].faction, REBELS);
    assert!(matches!(outcome.turns[1].outcome, TurnOutcome::Executed(_)));
}

/// Events remain available to the second actor only when the first
/// commanded with a special activity.
#[test]
fn test_event_window_follows_special_usage() {
    let plain = SlotConstraints::following(Some(&sop_engine::legality::FirstAction::Command {
        used_special: false,
    }));
    assert!(!plain.event_allowed);

    let with_special = SlotConstraints::following(Some(
        &sop_engine::legality::FirstAction::Command { used_special: true },
    ));
    assert!(with_special.event_allowed);
    assert!(with_special.limited_only);
}

/// A strike consumes RNG state through the world, so committed combat
/// is reproducible from the seed alone.
#[test]
fn test_strike_rolls_through_world_rng() {
    let mut world = frontier::build_world(23);
    let registry = frontier::build_registry();
    let sandbox = ActionSandbox::new(&registry);

    // Contest Meridian so the Legion garrison there has a target.
    world
        .place_from_available(REBEL_BAND, sop_engine::games::frontier::MERIDIAN, 2)
        .unwrap();

    let action = Action::command(LEGION, STRIKE, &[sop_engine::games::frontier::MERIDIAN]);
    let run_a = sandbox.attempt(&world, &action).unwrap();
    let run_b = sandbox.attempt(&world, &action).unwrap();

    // Identical start, identical stream, identical outcome.
    assert_eq!(run_a.world, run_b.world);
}

/// Winter quarters displaces the card it was revealed under and resets
/// everyone's eligibility.
#[test]
fn test_winter_quarters_period_boundary() {
    let mut world = frontier::build_world(31);
    world.set_deck(vec![
        frontier::deck().remove(0),
        frontier::deck().remove(3),
        frontier::deck().remove(1),
    ]);

    let mut engine = TurnEngine::new(world, frontier::build_registry(), frontier::build_config());
    for faction in FactionId::all(frontier::FACTION_COUNT) {
        engine.set_provider(faction, Box::new(frontier::build_agent(faction)));
    }

    // Winter quarters sits second in the deck, so it is revealed into
    // the upcoming slot on the first draw and jumps the queue.
    let outcome = engine.play_next_card().unwrap();
    assert!(outcome.winter_quarters);
    assert!(outcome.turns.is_empty());

    let outcome = engine.play_next_card().unwrap();
    assert!(!outcome.winter_quarters);
    assert_eq!(outcome.turns.len(), 2);
}

/// A pass proposal from a provider resolves as a voluntary pass.
#[test]
fn test_voluntary_pass_round_trips() {
    struct AlwaysPass(FactionId);
    impl sop_engine::agent::DecisionProvider for AlwaysPass {
        fn decide(
            &mut self,
            _: &WorldState,
            _: &sop_engine::core::Card,
            _: &SlotConstraints,
            _: &ActionSandbox<'_>,
            _: &mut sop_engine::core::GameRng,
        ) -> sop_engine::agent::Decision {
            sop_engine::agent::Decision::Act(Action::pass(self.0))
        }
    }

    let mut engine = TurnEngine::new(
        frontier::build_world(37),
        frontier::build_registry(),
        EngineConfig::new(frontier::FACTION_COUNT),
    );
    for faction in FactionId::all(frontier::FACTION_COUNT) {
        engine.set_provider(faction, Box::new(AlwaysPass(faction)));
    }

    let outcome = engine.play_next_card().unwrap();
    for turn in &outcome.turns {
        assert_eq!(turn.outcome, TurnOutcome::Passed(PassReason::Voluntary));
    }
    // Everyone passed, so everyone is still eligible next card.
    let outcome = engine.play_next_card().unwrap();
    assert_eq!(outcome.turns.len(), 4);
}

/// Syndicate is on the Legion's side of the strike table.
#[test]
fn test_coalitions_are_symmetric() {
    assert_eq!(frontier::enemies(LEGION), [REBELS, CLANS]);
    assert_eq!(frontier::enemies(SYNDICATE), [REBELS, CLANS]);
    assert_eq!(frontier::enemies(REBELS), [LEGION, SYNDICATE]);
}
