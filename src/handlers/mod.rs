//! The handler contract: how content plugs into the engine.
//!
//! Command and event effect bodies (movement, combat, placement, card
//! text) are external collaborators. They implement the traits here and
//! are registered by ID; the engine invokes them only through the
//! sandbox, never directly against canonical state.
//!
//! Handlers mutate the world copy in place, route all resource changes
//! through `WorldState::spend_resources` / `add_resources`, and let the
//! world's mutating operations record affected spaces into the active
//! trace. Errors are returned, not panicked; the sandbox boundary
//! catches panics too and converts them into faults.

use rustc_hash::FxHashMap;

use crate::core::{CardId, EventSide, FactionId, OpId, SpaceId, WorldState};
use crate::error::{Fault, HandlerError, RegistryError};

/// Per-invocation context passed to operation handlers.
#[derive(Clone, Copy, Debug)]
pub struct HandlerContext<'a> {
    /// Target spaces chosen by the decision provider, in order.
    /// Empty when the handler is expected to choose for itself.
    pub targets: &'a [SpaceId],

    /// True for card-granted free operations: charge no resources.
    pub free: bool,

    /// True when the slot restricts this to a Limited Command; the
    /// handler must confine its effect to a single space.
    pub limited: bool,
}

/// A command or special-activity effect body.
pub trait OpHandler: Send + Sync {
    /// Execute the operation for `faction` against the (sandboxed)
    /// world.
    fn execute(
        &self,
        world: &mut WorldState,
        faction: FactionId,
        ctx: &HandlerContext<'_>,
    ) -> Result<(), HandlerError>;
}

impl<F> OpHandler for F
where
    F: Fn(&mut WorldState, FactionId, &HandlerContext<'_>) -> Result<(), HandlerError>
        + Send
        + Sync,
{
    fn execute(
        &self,
        world: &mut WorldState,
        faction: FactionId,
        ctx: &HandlerContext<'_>,
    ) -> Result<(), HandlerError> {
        self(world, faction, ctx)
    }
}

/// A card event effect body.
pub trait EventHandler: Send + Sync {
    /// Resolve the event for the faction that played it.
    fn resolve(
        &self,
        world: &mut WorldState,
        faction: FactionId,
        side: EventSide,
    ) -> Result<(), HandlerError>;
}

impl<F> EventHandler for F
where
    F: Fn(&mut WorldState, FactionId, EventSide) -> Result<(), HandlerError> + Send + Sync,
{
    fn resolve(
        &self,
        world: &mut WorldState,
        faction: FactionId,
        side: EventSide,
    ) -> Result<(), HandlerError> {
        self(world, faction, side)
    }
}

struct RegisteredOp {
    name: String,
    handler: Box<dyn OpHandler>,
}

/// Maps operation and card IDs to their effect bodies.
///
/// Commands and special activities live in separate tables (a special
/// may not be proposed as a command), but free operations resolve
/// against either.
#[derive(Default)]
pub struct HandlerRegistry {
    commands: FxHashMap<OpId, RegisteredOp>,
    specials: FxHashMap<OpId, RegisteredOp>,
    events: FxHashMap<CardId, Box<dyn EventHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. Registering the same ID twice is a setup bug.
    pub fn register_command(
        &mut self,
        op: OpId,
        name: impl Into<String>,
        handler: impl OpHandler + 'static,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.commands.contains_key(&op) {
            return Err(RegistryError::DuplicateOp(name));
        }
        self.commands.insert(
            op,
            RegisteredOp {
                name,
                handler: Box::new(handler),
            },
        );
        Ok(())
    }

    /// Register a special activity.
    pub fn register_special(
        &mut self,
        op: OpId,
        name: impl Into<String>,
        handler: impl OpHandler + 'static,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.specials.contains_key(&op) {
            return Err(RegistryError::DuplicateOp(name));
        }
        self.specials.insert(
            op,
            RegisteredOp {
                name,
                handler: Box::new(handler),
            },
        );
        Ok(())
    }

    /// Register a card's event handler.
    pub fn register_event(
        &mut self,
        card: CardId,
        handler: impl EventHandler + 'static,
    ) -> Result<(), RegistryError> {
        if self.events.contains_key(&card) {
            return Err(RegistryError::DuplicateEvent(card));
        }
        self.events.insert(card, Box::new(handler));
        Ok(())
    }

    /// Look up a command handler.
    pub fn command(&self, op: OpId) -> Result<(&str, &dyn OpHandler), Fault> {
        self.commands
            .get(&op)
            .map(|r| (r.name.as_str(), r.handler.as_ref()))
            .ok_or(Fault::UnknownOp(op))
    }

    /// Look up a special-activity handler.
    pub fn special(&self, op: OpId) -> Result<(&str, &dyn OpHandler), Fault> {
        self.specials
            .get(&op)
            .map(|r| (r.name.as_str(), r.handler.as_ref()))
            .ok_or(Fault::UnknownOp(op))
    }

    /// Look up either table: free operations may name a command or a
    /// special activity.
    pub fn operation(&self, op: OpId) -> Result<(&str, &dyn OpHandler), Fault> {
        self.commands
            .get(&op)
            .or_else(|| self.specials.get(&op))
            .map(|r| (r.name.as_str(), r.handler.as_ref()))
            .ok_or(Fault::UnknownOp(op))
    }

    /// Look up a card's event handler.
    pub fn event(&self, card: CardId) -> Result<&dyn EventHandler, Fault> {
        self.events
            .get(&card)
            .map(Box::as_ref)
            .ok_or(Fault::UnknownEvent(card))
    }

    /// The registered name of an operation, for history entries.
    #[must_use]
    pub fn op_name(&self, op: OpId) -> Option<&str> {
        self.commands
            .get(&op)
            .or_else(|| self.specials.get(&op))
            .map(|r| r.name.as_str())
    }
}
