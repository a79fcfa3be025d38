//! "Frontier" demo pack: a four-faction scenario on an eight-space map.
//!
//! Two loose coalitions: the Legion and the Syndicate against the
//! Rebels and the Clans. Each faction fields one troop kind; the Legion
//! also builds forts. Three commands (Muster, Sweep, Strike) and two
//! special activities (Ambush, Requisition) are shared across factions,
//! with the acting faction deciding which troop kind they move.
//!
//! The pack registers a small event deck that exercises every engine
//! path: a dual resource event, a free-operations grant, an eligibility
//! strike, and a winter-quarters card.

use crate::agent::scan::{pick_max_by, rotation_scan};
use crate::agent::{event_is_effective, FlowchartAgent, FlowchartNode, NodeKind};
use crate::core::{
    Action, Card, CardId, EventSide, FactionId, OpId, PieceKind, Space, SpaceId, WorldState,
};
use crate::engine::{EngineConfig, TurnEngine};
use crate::error::HandlerError;
use crate::free_ops::FreeOperation;
use crate::handlers::{HandlerContext, HandlerRegistry};
use crate::history::HistoryRecord;

// Factions.
pub const LEGION: FactionId = FactionId::new(0);
pub const REBELS: FactionId = FactionId::new(1);
pub const SYNDICATE: FactionId = FactionId::new(2);
pub const CLANS: FactionId = FactionId::new(3);

/// Number of factions in the pack.
pub const FACTION_COUNT: usize = 4;

// Piece kinds.
pub const LEGIONNAIRE: PieceKind = PieceKind::new(0);
pub const FORT: PieceKind = PieceKind::new(1);
pub const REBEL_BAND: PieceKind = PieceKind::new(2);
pub const ENFORCER: PieceKind = PieceKind::new(3);
pub const WARBAND: PieceKind = PieceKind::new(4);

// Spaces.
pub const MERIDIAN: SpaceId = SpaceId::new(0);
pub const DUSTFALL: SpaceId = SpaceId::new(1);
pub const IRONVALE: SpaceId = SpaceId::new(2);
pub const THE_REACH: SpaceId = SpaceId::new(3);
pub const SALTMARSH: SpaceId = SpaceId::new(4);
pub const KORR_HIGHLANDS: SpaceId = SpaceId::new(5);
pub const GREYPORT: SpaceId = SpaceId::new(6);
pub const THE_BARRENS: SpaceId = SpaceId::new(7);

// Operations.
pub const MUSTER: OpId = OpId::new(0);
pub const SWEEP: OpId = OpId::new(1);
pub const STRIKE: OpId = OpId::new(2);
pub const AMBUSH: OpId = OpId::new(10);
pub const REQUISITION: OpId = OpId::new(11);

// Cards.
pub const SUPPLY_CONVOY: CardId = CardId::new(1);
pub const UPRISING: CardId = CardId::new(2);
pub const BLOOD_FEUD: CardId = CardId::new(3);
pub const WINTER_QUARTERS: CardId = CardId::new(72);

/// The troop kind a faction musters and moves.
#[must_use]
pub fn troops(faction: FactionId) -> PieceKind {
    match faction {
        REBELS => REBEL_BAND,
        SYNDICATE => ENFORCER,
        CLANS => WARBAND,
        _ => LEGIONNAIRE,
    }
}

/// The factions on the other side of the conflict.
#[must_use]
pub fn enemies(faction: FactionId) -> [FactionId; 2] {
    match faction {
        REBELS | CLANS => [LEGION, SYNDICATE],
        _ => [REBELS, CLANS],
    }
}

fn enemy_pieces_in(world: &WorldState, faction: FactionId, space: SpaceId) -> u32 {
    let Some(sp) = world.space(space) else { return 0 };
    enemies(faction)
        .into_iter()
        .map(|enemy| sp.piece_count(troops(enemy)))
        .sum()
}

fn own_troops_in(world: &WorldState, faction: FactionId, space: SpaceId) -> u32 {
    world
        .space(space)
        .map_or(0, |sp| sp.piece_count(troops(faction)))
}

/// Build the scenario's starting world.
#[must_use]
pub fn build_world(seed: u64) -> WorldState {
    let mut world = WorldState::new(FACTION_COUNT, seed);

    world.add_space(
        MERIDIAN,
        Space::new("Meridian", 3)
            .with_adjacent(vec![DUSTFALL, GREYPORT, SALTMARSH])
            .with_support(1),
    );
    world.add_space(
        DUSTFALL,
        Space::new("Dustfall", 1).with_adjacent(vec![MERIDIAN, IRONVALE, THE_BARRENS]),
    );
    world.add_space(
        IRONVALE,
        Space::new("Ironvale", 2)
            .with_adjacent(vec![DUSTFALL, THE_REACH])
            .with_support(1),
    );
    world.add_space(
        THE_REACH,
        Space::new("The Reach", 1)
            .with_adjacent(vec![IRONVALE, KORR_HIGHLANDS])
            .with_support(-1),
    );
    world.add_space(
        SALTMARSH,
        Space::new("Saltmarsh", 2).with_adjacent(vec![MERIDIAN, GREYPORT]),
    );
    world.add_space(
        KORR_HIGHLANDS,
        Space::new("Korr Highlands", 1)
            .with_adjacent(vec![THE_REACH, THE_BARRENS])
            .with_support(-2),
    );
    world.add_space(
        GREYPORT,
        Space::new("Greyport", 2).with_adjacent(vec![MERIDIAN, SALTMARSH]),
    );
    world.add_space(
        THE_BARRENS,
        Space::new("The Barrens", 0).with_adjacent(vec![DUSTFALL, KORR_HIGHLANDS]),
    );

    world.set_available(LEGIONNAIRE, 12);
    world.set_available(FORT, 3);
    world.set_available(REBEL_BAND, 10);
    world.set_available(ENFORCER, 8);
    world.set_available(WARBAND, 8);
    world.set_unavailable(LEGIONNAIRE, 4);

    world.setup_place(LEGIONNAIRE, MERIDIAN, 3).expect("setup");
    world.setup_place(LEGIONNAIRE, IRONVALE, 2).expect("setup");
    world.setup_place(FORT, MERIDIAN, 1).expect("setup");
    world.setup_place(REBEL_BAND, THE_REACH, 2).expect("setup");
    world.setup_place(REBEL_BAND, KORR_HIGHLANDS, 2).expect("setup");
    world.setup_place(ENFORCER, GREYPORT, 2).expect("setup");
    world.setup_place(WARBAND, THE_BARRENS, 2).expect("setup");

    world.set_resources(LEGION, 12);
    world.set_resources(REBELS, 6);
    world.set_resources(SYNDICATE, 8);
    world.set_resources(CLANS, 5);

    world.set_leader("Prefect Maro", Some(MERIDIAN));

    world.set_deck(deck());
    world
}

/// The scenario deck, in draw order.
#[must_use]
pub fn deck() -> Vec<Card> {
    vec![
        Card::new(SUPPLY_CONVOY, "Supply Convoy", &[LEGION, REBELS, SYNDICATE, CLANS]).dual(),
        Card::new(UPRISING, "Uprising", &[REBELS, CLANS, LEGION, SYNDICATE]),
        Card::new(BLOOD_FEUD, "Blood Feud", &[SYNDICATE, LEGION, CLANS, REBELS]),
        Card::new(
            WINTER_QUARTERS,
            "Winter Quarters",
            &[LEGION, REBELS, SYNDICATE, CLANS],
        )
        .winter_quarters(),
    ]
}

/// Register the pack's operation and event handlers.
#[must_use]
pub fn build_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    // Muster: place one troop per target, 1 resource each.
    registry
        .register_command(MUSTER, "muster", muster)
        .expect("register muster");

    // Sweep: pull own troops from spaces adjacent to each target,
    // 1 resource per target.
    registry
        .register_command(SWEEP, "sweep", sweep)
        .expect("register sweep");

    // Strike: roll against enemy troops in each target, 1 resource each.
    registry
        .register_command(STRIKE, "strike", strike)
        .expect("register strike");

    registry
        .register_special(AMBUSH, "ambush", ambush)
        .expect("register ambush");
    registry
        .register_special(REQUISITION, "requisition", requisition)
        .expect("register requisition");

    registry
        .register_event(SUPPLY_CONVOY, supply_convoy)
        .expect("register supply convoy");
    registry
        .register_event(UPRISING, uprising)
        .expect("register uprising");
    registry
        .register_event(BLOOD_FEUD, blood_feud)
        .expect("register blood feud");

    registry
}

fn muster(world: &mut WorldState, faction: FactionId, ctx: &HandlerContext<'_>) -> Result<(), HandlerError> {
    if ctx.targets.is_empty() {
        return Err(HandlerError::NoValidTarget);
    }
    let kind = troops(faction);
    for &target in ctx.targets {
        if !ctx.free {
            world.spend_resources(faction, 1)?;
        }
        world.place_from_available(kind, target, 1)?;
    }
    Ok(())
}

fn sweep(world: &mut WorldState, faction: FactionId, ctx: &HandlerContext<'_>) -> Result<(), HandlerError> {
    if ctx.targets.is_empty() {
        return Err(HandlerError::NoValidTarget);
    }
    let kind = troops(faction);
    for &target in ctx.targets {
        if !ctx.free {
            world.spend_resources(faction, 1)?;
        }
        let adjacent = world
            .space(target)
            .ok_or(HandlerError::NoValidTarget)?
            .adjacent
            .clone();
        let mut moved = 0;
        for origin in adjacent {
            let present = own_troops_in(world, faction, origin);
            if present > 0 {
                world.move_pieces(kind, origin, target, present)?;
                moved += present;
            }
        }
        if moved == 0 {
            return Err(HandlerError::NoValidTarget);
        }
    }
    Ok(())
}

fn strike(world: &mut WorldState, faction: FactionId, ctx: &HandlerContext<'_>) -> Result<(), HandlerError> {
    if ctx.targets.is_empty() {
        return Err(HandlerError::NoValidTarget);
    }
    for &target in ctx.targets {
        if own_troops_in(world, faction, target) == 0 {
            return Err(HandlerError::NoValidTarget);
        }
        if !ctx.free {
            world.spend_resources(faction, 1)?;
        }
        let roll = world.rng_mut().roll_d6();
        let hits: u32 = if roll >= 4 { 2 } else { 1 };
        remove_enemy_troops(world, faction, target, hits)?;
    }
    Ok(())
}

fn remove_enemy_troops(
    world: &mut WorldState,
    faction: FactionId,
    space: SpaceId,
    mut hits: u32,
) -> Result<(), HandlerError> {
    for enemy in enemies(faction) {
        if hits == 0 {
            break;
        }
        let kind = troops(enemy);
        let present = world
            .space(space)
            .ok_or(HandlerError::NoValidTarget)?
            .piece_count(kind);
        let taken = present.min(hits);
        if taken > 0 {
            world.remove_to_casualties(kind, space, taken)?;
            hits -= taken;
        }
    }
    // A strike that lands on an empty space still marks it contested.
    world.touch_space(space);
    Ok(())
}

fn ambush(world: &mut WorldState, faction: FactionId, ctx: &HandlerContext<'_>) -> Result<(), HandlerError> {
    let &target = ctx.targets.first().ok_or(HandlerError::NoValidTarget)?;
    if own_troops_in(world, faction, target) == 0 || enemy_pieces_in(world, faction, target) == 0 {
        return Err(HandlerError::NoValidTarget);
    }
    remove_enemy_troops(world, faction, target, 1)
}

fn requisition(world: &mut WorldState, faction: FactionId, _ctx: &HandlerContext<'_>) -> Result<(), HandlerError> {
    world.add_resources(faction, 2);
    Ok(())
}

fn supply_convoy(world: &mut WorldState, faction: FactionId, side: EventSide) -> Result<(), HandlerError> {
    match side {
        EventSide::Unshaded => {
            world.add_resources(faction, 4);
        }
        EventSide::Shaded => {
            let loss = world.resources().balance(LEGION).min(3);
            if loss > 0 {
                world.spend_resources(LEGION, loss)?;
            }
        }
    }
    Ok(())
}

fn uprising(world: &mut WorldState, _faction: FactionId, _side: EventSide) -> Result<(), HandlerError> {
    // Two free rebel musters, resolved in this order before the turn
    // completes.
    world.free_ops_mut().enqueue(FreeOperation {
        faction: REBELS,
        op: MUSTER,
        space: Some(THE_REACH),
    });
    world.free_ops_mut().enqueue(FreeOperation {
        faction: REBELS,
        op: MUSTER,
        space: Some(KORR_HIGHLANDS),
    });
    Ok(())
}

fn blood_feud(world: &mut WorldState, _faction: FactionId, _side: EventSide) -> Result<(), HandlerError> {
    world.eligibility_mut().mark_ineligible_through_next(CLANS);
    world.shift_support(KORR_HIGHLANDS, 1)?;
    world.push_history(HistoryRecord::Note(
        "blood feud erupts in the Korr Highlands".to_string(),
    ));
    Ok(())
}

/// Build the pack's flowchart agent for one faction.
///
/// Every faction runs the same node shape with its own troop kind:
/// take an effective event, strike where it has troops facing enemies,
/// otherwise muster into the highest-population space it can, limiting
/// itself to one space when the slot demands it.
#[must_use]
pub fn build_agent(faction: FactionId) -> FlowchartAgent {
    FlowchartAgent::new(faction)
        .with_node(FlowchartNode::new(
            "event-if-effective",
            NodeKind::Event,
            move |world, _, sandbox| {
                world.current_card().is_some()
                    && event_is_effective(world, faction, EventSide::Unshaded, sandbox)
            },
            move |_, _, _| Some(Action::event(faction, EventSide::Unshaded)),
        ))
        .with_node(FlowchartNode::new(
            "strike-contested",
            NodeKind::Command,
            move |world, _, _| {
                world
                    .space_ids()
                    .any(|id| own_troops_in(world, faction, id) > 0 && enemy_pieces_in(world, faction, id) > 0)
            },
            move |world, constraints, rng| {
                let target = pick_max_by(world, rng, |w, id| {
                    (own_troops_in(w, faction, id) > 0 && enemy_pieces_in(w, faction, id) > 0)
                        .then(|| i64::from(enemy_pieces_in(w, faction, id)))
                })?;
                Some(if constraints.limited_only {
                    Action::limited_command(faction, STRIKE, target)
                } else {
                    Action::command(faction, STRIKE, &[target])
                })
            },
        ))
        .with_node(FlowchartNode::new(
            "muster-populous",
            NodeKind::Command,
            |_, _, _| true,
            move |world, constraints, rng| {
                let target = rotation_scan(world, rng, |w, id| {
                    w.space(id).is_some_and(|sp| sp.population > 0)
                })?;
                Some(if constraints.limited_only {
                    Action::limited_command(faction, MUSTER, target)
                } else {
                    Action::command(faction, MUSTER, &[target])
                })
            },
        ))
}

/// Engine configuration the pack ships with: coalition-asymmetric pass
/// rewards.
#[must_use]
pub fn build_config() -> EngineConfig {
    EngineConfig::new(FACTION_COUNT)
        .with_pass_reward(LEGION, 2)
        .with_pass_reward(SYNDICATE, 2)
}

/// Assemble a ready-to-run engine for the scenario.
#[must_use]
pub fn build_engine(seed: u64) -> TurnEngine {
    let mut engine = TurnEngine::new(build_world(seed), build_registry(), build_config());
    for faction in FactionId::all(FACTION_COUNT) {
        engine.set_provider(faction, Box::new(build_agent(faction)));
    }
    engine
}
