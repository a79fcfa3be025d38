//! Event cards and the per-card faction order.
//!
//! Cards carry no effect bodies; event behavior lives in content handlers
//! registered by `CardId` (see `handlers::HandlerRegistry`). The engine
//! only reads the faction order, the dual-event flag, and the
//! winter-quarters flag.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::faction::FactionId;

/// Card identifier, matching the published card number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub u16);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }
}

/// Which side of a dual event is being resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSide {
    /// The plain-text side.
    Unshaded,
    /// The shaded side (dual cards only).
    Shaded,
}

/// An event card as the engine sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Card identifier.
    pub id: CardId,

    /// Display title.
    pub title: String,

    /// Faction symbols in printed order; drives the acting queue.
    pub order: SmallVec<[FactionId; 4]>,

    /// True if the card has both an unshaded and a shaded event.
    pub dual: bool,

    /// True for winter-quarters cards, which end the period when revealed.
    pub winter_quarters: bool,
}

impl Card {
    /// Create a card with the given faction order.
    #[must_use]
    pub fn new(id: CardId, title: impl Into<String>, order: &[FactionId]) -> Self {
        Self {
            id,
            title: title.into(),
            order: SmallVec::from_slice(order),
            dual: false,
            winter_quarters: false,
        }
    }

    /// Mark the card as a dual event (builder style).
    #[must_use]
    pub fn dual(mut self) -> Self {
        self.dual = true;
        self
    }

    /// Mark the card as winter quarters (builder style).
    #[must_use]
    pub fn winter_quarters(mut self) -> Self {
        self.winter_quarters = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_builder() {
        let order = [FactionId::new(1), FactionId::new(0)];
        let card = Card::new(CardId::new(7), "Forced March", &order).dual();

        assert_eq!(card.id, CardId::new(7));
        assert_eq!(card.order.as_slice(), &order);
        assert!(card.dual);
        assert!(!card.winter_quarters);
    }
}
