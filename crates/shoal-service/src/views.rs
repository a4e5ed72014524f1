// crates/shoal-service/src/views.rs
//
// Read-only dashboard views. Everything here is derived from the account
// aggregates and globals without iterating stakers internally; the
// staker enumeration set is surfaced for UX, never consulted for sums.

use serde::{Deserialize, Serialize};

use shoal_ledger::{Motes, ProverState, Shares, Sho, Timestamp};

/// Protocol-wide totals for dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkTotals {
    /// Registered prover entries (any state).
    pub prover_count: usize,
    /// Sum of effective stake over Active provers.
    pub total_effective_active_stake: Motes,
    /// Treasury balance in motes.
    pub treasury_balance: Motes,
    /// Remaining streaming-emission budget in motes.
    pub emission_budget_remaining: Motes,
    /// Streaming emission rate, motes per second.
    pub emission_rate_per_second: Motes,
}

/// One prover's headline numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProverOverview {
    /// Hex-encoded prover coldkey.
    pub coldkey: String,
    /// Lifecycle state.
    pub state: ProverState,
    /// Commission rate in basis points.
    pub commission_rate_bps: u16,
    /// Scale factor in 1e18 units.
    pub scale: u128,
    /// Total raw shares outstanding.
    pub total_raw_shares: Shares,
    /// Total effective stake in motes.
    pub effective_stake: Motes,
    /// Effective stake in SHO (for display).
    pub effective_stake_sho: f64,
    /// The prover's own effective self-stake.
    pub self_effective: Motes,
    /// Minimum self-stake currently in force.
    pub min_self_stake: Motes,
    /// Number of stakers with active shares.
    pub staker_count: usize,
    /// Unclaimed commission in motes.
    pub pending_commission: Motes,
}

/// One staker's position on one prover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakerPosition {
    /// Hex-encoded staker coldkey.
    pub staker: String,
    /// Active raw shares.
    pub raw_shares: Shares,
    /// Effective value of the active shares, in motes.
    pub effective: Motes,
    /// Claimable rewards (settled plus unsettled), in motes.
    pub pending_rewards: Motes,
    /// Queued unstake requests, oldest first.
    pub pending_unstakes: Vec<PendingUnstakeView>,
}

/// A queued unstake request as a dashboard row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingUnstakeView {
    /// Raw shares queued.
    pub raw_shares: Shares,
    /// Value at the current scale, in motes: what completion would pay
    /// if no further slash lands.
    pub current_value: Motes,
    /// When the request was made.
    pub requested_at: Timestamp,
    /// When the request becomes completable.
    pub eligible_at: Timestamp,
}

impl ProverOverview {
    pub(crate) fn display_sho(motes: Motes) -> f64 {
        Sho::from_motes(motes).to_sho()
    }
}
