//! Flowchart agent behavior against the frontier pack.

use sop_engine::agent::{
    event_is_effective, Decision, DecisionProvider, FlowchartAgent, FlowchartNode, NodeKind,
};
use sop_engine::core::{Action, EventSide, GameRng};
use sop_engine::error::PassReason;
use sop_engine::games::frontier::{
    self, CLANS, KORR_HIGHLANDS, LEGION, MUSTER, REBELS, THE_REACH,
};
use sop_engine::legality::SlotConstraints;
use sop_engine::sandbox::ActionSandbox;

/// A broad first node falls through to a narrower second node in a
/// limited slot, and the second attempt is judged on its own trace with
/// no residue from the first.
#[test]
fn test_fallback_attempt_gets_fresh_trace() {
    let world = frontier::build_world(3);
    let registry = frontier::build_registry();
    let sandbox = ActionSandbox::new(&registry);

    let mut agent = FlowchartAgent::new(REBELS)
        .with_node(FlowchartNode::new(
            "muster-wide",
            NodeKind::Command,
            |_, _, _| true,
            |_, _, _| Some(Action::command(REBELS, MUSTER, &[THE_REACH, KORR_HIGHLANDS])),
        ))
        .with_node(FlowchartNode::new(
            "muster-narrow",
            NodeKind::Command,
            |_, _, _| true,
            |_, _, _| Some(Action::limited_command(REBELS, MUSTER, THE_REACH)),
        ));

    let constraints = SlotConstraints {
        event_allowed: false,
        special_allowed: false,
        limited_only: true,
    };
    let card = frontier::deck().remove(0);
    let mut rng = GameRng::new(1);

    // If trace residue leaked between attempts the narrow action would
    // be seen as touching three spaces and rejected too.
    let decision = agent.decide(&world, &card, &constraints, &sandbox, &mut rng);
    assert_eq!(
        decision,
        Decision::Act(Action::limited_command(REBELS, MUSTER, THE_REACH))
    );
}

/// With an empty purse and no event to play, the agent reports a
/// resource gate rather than an empty flowchart.
#[test]
fn test_resource_gate_beats_no_valid_command() {
    let mut world = frontier::build_world(4);
    world.set_resources(CLANS, 0);
    let registry = frontier::build_registry();
    let sandbox = ActionSandbox::new(&registry);

    let mut agent = FlowchartAgent::new(CLANS).with_node(FlowchartNode::new(
        "muster",
        NodeKind::Command,
        |_, _, _| true,
        |_, _, _| Some(Action::limited_command(CLANS, MUSTER, KORR_HIGHLANDS)),
    ));

    let card = frontier::deck().remove(0);
    let mut rng = GameRng::new(2);
    let decision = agent.decide(
        &world,
        &card,
        &SlotConstraints::first_eligible(),
        &sandbox,
        &mut rng,
    );
    assert_eq!(decision, Decision::Pass(PassReason::ResourceGate));
}

/// An agent with no nodes at all passes with `NoValidCommand`.
#[test]
fn test_empty_flowchart_passes() {
    let world = frontier::build_world(5);
    let registry = frontier::build_registry();
    let sandbox = ActionSandbox::new(&registry);

    let mut agent = FlowchartAgent::new(LEGION);
    let card = frontier::deck().remove(0);
    let mut rng = GameRng::new(3);

    let decision = agent.decide(
        &world,
        &card,
        &SlotConstraints::first_eligible(),
        &sandbox,
        &mut rng,
    );
    assert_eq!(decision, Decision::Pass(PassReason::NoValidCommand));
}

/// The effectiveness probe runs the event against a scratch copy: a
/// resource grant registers, and the caller's world is untouched.
#[test]
fn test_event_effectiveness_probe() {
    let mut world = frontier::build_world(6);
    world.draw_card().unwrap(); // Supply Convoy current
    let registry = frontier::build_registry();
    let sandbox = ActionSandbox::new(&registry);
    let before = world.clone();

    assert!(event_is_effective(&world, LEGION, EventSide::Unshaded, &sandbox));
    assert_eq!(world, before);

    // At the track maximum the grant changes nothing.
    world.set_resources(LEGION, world.resources().max());
    assert!(!event_is_effective(&world, LEGION, EventSide::Unshaded, &sandbox));
}

/// The default provider contract does not re-solicit after a rejection.
#[test]
fn test_flowchart_agent_does_not_retry() {
    let agent = FlowchartAgent::new(REBELS);
    assert!(!agent.retry_on_reject());
}

/// The pack agents make deterministic decisions from a given RNG state.
#[test]
fn test_pack_agent_is_deterministic() {
    let mut world = frontier::build_world(8);
    world.draw_card().unwrap();
    let card = world.current_card().cloned().unwrap();
    let registry = frontier::build_registry();
    let sandbox = ActionSandbox::new(&registry);

    let mut agent_a = frontier::build_agent(CLANS);
    let mut agent_b = frontier::build_agent(CLANS);
    let mut rng_a = world.rng().clone();
    let mut rng_b = world.rng().clone();

    let constraints = SlotConstraints::first_eligible();
    let a = agent_a.decide(&world, &card, &constraints, &sandbox, &mut rng_a);
    let b = agent_b.decide(&world, &card, &constraints, &sandbox, &mut rng_b);
    assert_eq!(a, b);
    assert_eq!(rng_a, rng_b);
}
