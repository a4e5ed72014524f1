// crates/shoal-ledger/src/treasury.rs
//
// Protocol treasury for the Shoal staking ledger.
//
// The treasury receives:
//   - integer-division dust from reward distribution and streaming emission
//   - the effective value removed from active stake by slashing
//   - the slash shortfall realized when a queued unstake completes at a
//     lower scale than its request-time snapshot
//
// Nothing that enters the ledger is ever silently dropped; anything not
// attributable to a specific account lands here and stays auditable.
//
// Reference: ARCHITECTURE.md Section 10

use serde::{Deserialize, Serialize};

use shoal_core::LedgerError;

use crate::token::Motes;

/// The protocol treasury.
///
/// Tracks the total balance of $SHO held by the protocol (in motes).
/// Withdrawals are owner-gated at the service layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Treasury {
    /// Current balance in motes.
    balance: Motes,
}

impl Treasury {
    /// Create a new treasury with zero balance.
    pub fn new() -> Self {
        Self { balance: 0 }
    }

    /// Create a treasury with an initial balance (in motes).
    pub fn with_balance(balance: Motes) -> Self {
        Self { balance }
    }

    /// Deposit motes into the treasury.
    pub fn deposit(&mut self, amount: Motes) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Withdraw motes from the treasury.
    ///
    /// # Errors
    /// Returns `LedgerError::InvalidState` if the balance is insufficient.
    pub fn withdraw(&mut self, amount: Motes) -> Result<(), LedgerError> {
        if amount > self.balance {
            return Err(LedgerError::InvalidState(format!(
                "Insufficient treasury balance: requested {} motes but only {} motes available",
                amount, self.balance
            )));
        }
        self.balance -= amount;
        Ok(())
    }

    /// Get the current treasury balance (in motes).
    pub fn balance(&self) -> Motes {
        self.balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::MOTES_PER_SHO;

    #[test]
    fn test_new_treasury_has_zero_balance() {
        assert_eq!(Treasury::new().balance(), 0);
    }

    #[test]
    fn test_deposit() {
        let mut treasury = Treasury::new();
        treasury.deposit(100 * MOTES_PER_SHO);
        treasury.deposit(30 * MOTES_PER_SHO);
        assert_eq!(treasury.balance(), 130 * MOTES_PER_SHO);
    }

    #[test]
    fn test_withdraw_success() {
        let mut treasury = Treasury::with_balance(100 * MOTES_PER_SHO);
        assert!(treasury.withdraw(40 * MOTES_PER_SHO).is_ok());
        assert_eq!(treasury.balance(), 60 * MOTES_PER_SHO);
    }

    #[test]
    fn test_withdraw_insufficient_balance() {
        let mut treasury = Treasury::with_balance(50 * MOTES_PER_SHO);
        assert!(treasury.withdraw(100 * MOTES_PER_SHO).is_err());
        // Balance unchanged on error
        assert_eq!(treasury.balance(), 50 * MOTES_PER_SHO);
    }
}
