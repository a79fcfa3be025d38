//! Per-faction resource ledger.
//!
//! Every resource change in the game routes through this type, so
//! sandboxed deltas are fully observable to the legality validator.
//! `spend` refuses to drive a balance negative; `add` clamps at the
//! configured maximum.

use serde::{Deserialize, Serialize};

use crate::core::{FactionId, FactionMap};
use crate::error::LedgerError;

/// Default resource track maximum.
pub const DEFAULT_MAX_RESOURCES: i64 = 50;

/// Spendable per-faction balances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger {
    balances: FactionMap<i64>,
    max: i64,
}

impl ResourceLedger {
    /// Create a ledger with all balances at zero.
    #[must_use]
    pub fn new(faction_count: usize) -> Self {
        Self {
            balances: FactionMap::with_value(faction_count, 0),
            max: DEFAULT_MAX_RESOURCES,
        }
    }

    /// Override the track maximum (builder style, for setup code).
    #[must_use]
    pub fn with_max(mut self, max: i64) -> Self {
        self.max = max;
        self
    }

    /// Current balance.
    #[must_use]
    pub fn balance(&self, faction: FactionId) -> i64 {
        self.balances[faction]
    }

    /// Track maximum.
    #[must_use]
    pub fn max(&self) -> i64 {
        self.max
    }

    /// True if the faction holds at least `amount`.
    #[must_use]
    pub fn can_afford(&self, faction: FactionId, amount: i64) -> bool {
        self.balances[faction] >= amount
    }

    /// Set a balance directly (setup only), clamped to `0..=max`.
    pub fn set(&mut self, faction: FactionId, amount: i64) {
        self.balances[faction] = amount.clamp(0, self.max);
    }

    /// Spend resources. Fails without mutating if the faction cannot
    /// afford the amount; a committed balance is never negative.
    pub fn spend(&mut self, faction: FactionId, amount: i64) -> Result<(), LedgerError> {
        debug_assert!(amount >= 0, "spend amount must be non-negative");
        let balance = self.balances[faction];
        if balance < amount {
            return Err(LedgerError::InsufficientResources {
                faction,
                cost: amount,
                balance,
            });
        }
        self.balances[faction] = balance - amount;
        Ok(())
    }

    /// Add resources, clamped to the track maximum. Returns the amount
    /// actually gained.
    pub fn add(&mut self, faction: FactionId, amount: i64) -> i64 {
        debug_assert!(amount >= 0, "add amount must be non-negative");
        let before = self.balances[faction];
        let after = (before + amount).min(self.max);
        self.balances[faction] = after;
        after - before
    }

    /// Iterate over `(faction, balance)` pairs in faction order.
    pub fn iter(&self) -> impl Iterator<Item = (FactionId, i64)> + '_ {
        self.balances.iter().map(|(f, b)| (f, *b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CROWN: FactionId = FactionId::new(0);
    const REBELS: FactionId = FactionId::new(1);

    #[test]
    fn test_spend_within_balance() {
        let mut ledger = ResourceLedger::new(2);
        ledger.set(CROWN, 10);

        assert!(ledger.spend(CROWN, 4).is_ok());
        assert_eq!(ledger.balance(CROWN), 6);
    }

    #[test]
    fn test_spend_never_goes_negative() {
        let mut ledger = ResourceLedger::new(2);
        ledger.set(REBELS, 2);

        let err = ledger.spend(REBELS, 3).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientResources { cost: 3, balance: 2, .. }
        ));
        // Failed spend leaves the balance untouched.
        assert_eq!(ledger.balance(REBELS), 2);
    }

    #[test]
    fn test_add_clamps_at_max() {
        let mut ledger = ResourceLedger::new(2).with_max(50);
        ledger.set(CROWN, 48);

        let gained = ledger.add(CROWN, 6);
        assert_eq!(gained, 2);
        assert_eq!(ledger.balance(CROWN), 50);
    }

    #[test]
    fn test_can_afford() {
        let mut ledger = ResourceLedger::new(2);
        ledger.set(CROWN, 3);

        assert!(ledger.can_afford(CROWN, 3));
        assert!(!ledger.can_afford(CROWN, 4));
        assert!(ledger.can_afford(REBELS, 0));
    }
}
