// crates/shoal-core/src/traits.rs

use async_trait::async_trait;

use crate::error::LedgerError;
use crate::identity::AccountId;

/// The contract the proof marketplace consumes.
///
/// Implemented by shoal-service. All amounts are in motes; `now` is a
/// monotonically increasing Unix timestamp supplied by the caller. The
/// ledger keeps no internal clock.
#[async_trait]
pub trait MarketplaceLedger: Send + Sync {
    /// Whether the prover is Active with at least `minimum_effective` motes
    /// of effective stake. Returns the eligibility flag together with the
    /// prover's current effective stake.
    async fn is_eligible(
        &self,
        prover: &AccountId,
        minimum_effective: u128,
    ) -> Result<(bool, u128), LedgerError>;

    /// Credit `amount` motes of job rewards to the prover, pulling the
    /// backing asset from `caller`. Returns `(commission, stakers_portion)`.
    async fn credit_rewards(
        &self,
        caller: &AccountId,
        prover: &AccountId,
        amount: u128,
        now: u64,
    ) -> Result<(u128, u128), LedgerError>;

    /// Slash the prover by a fraction expressed in parts per million.
    /// Requires the slashing capability. Returns the effective motes
    /// removed from active stake.
    async fn slash_by_percentage(
        &self,
        caller: &AccountId,
        prover: &AccountId,
        ppm: u32,
        now: u64,
    ) -> Result<u128, LedgerError>;

    /// Slash the prover by an absolute effective amount, converted
    /// internally to a fraction of current effective stake. Requires the
    /// slashing capability. Returns the effective motes actually removed.
    async fn slash_by_amount(
        &self,
        caller: &AccountId,
        prover: &AccountId,
        amount: u128,
        now: u64,
    ) -> Result<u128, LedgerError>;
}

/// Asset custody for the ledger.
///
/// The ledger never moves tokens itself; it instructs a `Custody`
/// implementation after all bookkeeping for an operation is finalized
/// (transfer-last ordering). Implemented in-memory by shoal-service's
/// vault; production deployments bridge this to the chain's token module.
#[async_trait]
pub trait Custody: Send + Sync {
    /// Pull `amount` motes from `from` into ledger custody.
    async fn transfer_in(&self, from: &AccountId, amount: u128) -> Result<(), LedgerError>;

    /// Pay `amount` motes out of ledger custody to `to`.
    async fn transfer_out(&self, to: &AccountId, amount: u128) -> Result<(), LedgerError>;

    /// Motes currently held in ledger custody.
    async fn custody_balance(&self) -> Result<u128, LedgerError>;
}
