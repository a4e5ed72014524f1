// crates/shoal-service/src/shared.rs
//
// SharedLedgerState: the locking layout for the concurrent ledger.
//
// Correctness requires serialized mutation per prover account, while
// operations on different provers stay fully independent. Each account
// therefore lives behind its own async mutex; the registry map itself is
// only read-locked long enough to clone the Arc. Globals (treasury,
// emission pool, parameters) sit behind one further lock, always acquired
// after the prover's own, never the other way around.
//
// Reference: ARCHITECTURE.md Section 11

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use shoal_core::{account_to_hex, AccountId, LedgerError};
use shoal_ledger::{GlobalLedger, ProverAccount};

/// Shared mutable ledger state, cloneable across tasks.
#[derive(Clone)]
pub struct SharedLedgerState {
    /// One entry per prover, each serialized by its own mutex.
    accounts: Arc<RwLock<HashMap<AccountId, Arc<Mutex<ProverAccount>>>>>,
    /// Treasury, emission pool, and parameters.
    pub globals: Arc<Mutex<GlobalLedger>>,
}

impl SharedLedgerState {
    /// Create shared state around the given globals.
    pub fn new(globals: GlobalLedger) -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
            globals: Arc::new(Mutex::new(globals)),
        }
    }

    /// Fetch the handle for an existing prover.
    pub async fn account(
        &self,
        prover: &AccountId,
    ) -> Result<Arc<Mutex<ProverAccount>>, LedgerError> {
        self.accounts
            .read()
            .await
            .get(prover)
            .cloned()
            .ok_or_else(|| {
                LedgerError::NotFound(format!(
                    "No prover account for {}",
                    account_to_hex(prover)
                ))
            })
    }

    /// Fetch the handle for a prover, creating an unregistered (Null)
    /// shell if none exists yet. Used by registration.
    pub async fn account_or_shell(&self, prover: &AccountId) -> Arc<Mutex<ProverAccount>> {
        if let Some(existing) = self.accounts.read().await.get(prover) {
            return existing.clone();
        }
        let mut map = self.accounts.write().await;
        map.entry(*prover)
            .or_insert_with(|| Arc::new(Mutex::new(ProverAccount::new(*prover))))
            .clone()
    }

    /// All registered prover keys. Dashboard use only.
    pub async fn prover_keys(&self) -> Vec<AccountId> {
        self.accounts.read().await.keys().copied().collect()
    }

    /// Number of prover entries in the registry.
    pub async fn prover_count(&self) -> usize {
        self.accounts.read().await.len()
    }
}
