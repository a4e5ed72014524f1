// crates/shoal-service/src/vault.rs
//
// In-memory asset custody. Implements the Custody trait for tests and
// embedded deployments; production bridges the same trait to the chain's
// token module. One mutex guards balances and the custody pool together
// so a transfer is atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use shoal_core::{account_to_hex, AccountId, Custody, LedgerError};
use shoal_ledger::Motes;

#[derive(Debug, Default)]
struct VaultState {
    /// Free balances per account.
    balances: HashMap<AccountId, Motes>,
    /// Motes held in ledger custody.
    custody: Motes,
}

/// In-memory vault.
#[derive(Debug, Default)]
pub struct InMemoryVault {
    state: Mutex<VaultState>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` motes to an account's free balance (genesis/test
    /// funding).
    pub async fn mint(&self, account: &AccountId, amount: Motes) {
        let mut state = self.state.lock().await;
        *state.balances.entry(*account).or_insert(0) += amount;
    }

    /// An account's free balance.
    pub async fn balance_of(&self, account: &AccountId) -> Motes {
        self.state
            .lock()
            .await
            .balances
            .get(account)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Custody for InMemoryVault {
    async fn transfer_in(&self, from: &AccountId, amount: Motes) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        let balance = state.balances.entry(*from).or_insert(0);
        if *balance < amount {
            return Err(LedgerError::Custody(format!(
                "Account {} holds {} motes, needs {}",
                account_to_hex(from),
                balance,
                amount
            )));
        }
        *balance -= amount;
        state.custody += amount;
        Ok(())
    }

    async fn transfer_out(&self, to: &AccountId, amount: Motes) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        if state.custody < amount {
            return Err(LedgerError::Custody(format!(
                "Custody holds {} motes, cannot pay out {}",
                state.custody, amount
            )));
        }
        state.custody -= amount;
        *state.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }

    async fn custody_balance(&self) -> Result<Motes, LedgerError> {
        Ok(self.state.lock().await.custody)
    }
}
