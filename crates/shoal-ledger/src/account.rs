// crates/shoal-ledger/src/account.rs
//
// The per-prover account aggregate: lifecycle state, share totals, scale
// factor, reward accumulator, and the keyed stake records of every staker
// delegating to this prover.
//
// All ledger operations take the aggregate by exclusive reference and
// derive every quantity (effective stake, pending entitlement) from it on
// demand; nothing derived is cached elsewhere. Reward distribution and
// slashing touch only prover-wide fields, so their cost is independent of
// the number of stakers.
//
// Reference: ARCHITECTURE.md Sections 4, 5

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use shoal_core::{AccountId, LedgerError};

use crate::globals::GlobalLedger;
use crate::token::{Motes, Shares, Timestamp, BPS_DENOM, SCALE_ONE};

/// Lifecycle state of a prover account. A closed state machine; every
/// operation validates the tag before mutating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProverState {
    /// Created but not yet registered. No operation other than
    /// registration is valid.
    Null,
    /// Registered, accepting stake, accruing streaming emission.
    Active,
    /// Exited cleanly: zero shares, zero pending commission. May be
    /// reborn by self-staking, which starts a fresh accounting epoch.
    Retired,
    /// Pushed out by slashing (soft threshold) or by the owner. Existing
    /// stake may leave; new stake may not enter.
    Deactivated,
}

/// A single delayed withdrawal awaiting its unstake delay.
///
/// The entry stores raw shares, not motes: the eventual payout is
/// re-derived from the prover's scale at completion time, so a slash
/// during the delay still applies. The request-time scale snapshot bounds
/// the payout and lets the completion attribute any slash shortfall to the
/// treasury.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingUnstake {
    /// Raw shares removed from active stake by this request.
    pub raw_shares: Shares,
    /// When the request was made.
    pub requested_at: Timestamp,
    /// The prover's scale at request time (1e18 units).
    pub scale_snapshot: u128,
}

/// Per-staker state on one prover.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StakeRecord {
    /// Active raw shares. Constant between stake/unstake events.
    pub raw_shares: Shares,
    /// `raw_shares * acc_reward_per_share / SCALE_ONE` at the last
    /// settlement — the baseline that prevents double payment.
    pub reward_debt: Motes,
    /// Settled but unclaimed rewards.
    pub pending_rewards: Motes,
    /// Delayed withdrawals, oldest first. Bounded per LedgerParams.
    pub pending_unstakes: Vec<PendingUnstake>,
}

impl StakeRecord {
    /// True when the record holds nothing worth keeping.
    pub fn is_empty(&self) -> bool {
        self.raw_shares == 0 && self.pending_rewards == 0 && self.pending_unstakes.is_empty()
    }
}

/// A scheduled decrease of the prover's minimum self-stake. Increases
/// apply immediately; decreases wait out the unstake delay so delegators
/// see them coming.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MinSelfStakeUpdate {
    /// The new minimum, in motes.
    pub target: Motes,
    /// When the decrease takes effect.
    pub effective_at: Timestamp,
}

/// One prover's complete ledger state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProverAccount {
    /// The prover's coldkey — the identity the account is stored under.
    pub coldkey: AccountId,
    pub(crate) state: ProverState,
    pub(crate) commission_rate_bps: u16,
    pub(crate) min_self_stake: Motes,
    pub(crate) pending_min_self_stake_update: Option<MinSelfStakeUpdate>,
    /// Sum of all stake records' raw shares, including the prover's own.
    pub(crate) total_raw_shares: Shares,
    /// Fixed-point slashing multiplier (1e18 units). Starts at 1.0,
    /// monotonically non-increasing within an accounting epoch.
    pub(crate) scale: u128,
    /// Cumulative motes distributed per raw share (1e18 fixed point).
    /// Monotonically non-decreasing within an accounting epoch.
    pub(crate) acc_reward_per_share: u128,
    /// Unclaimed commission, in motes.
    pub(crate) pending_commission: Motes,
    /// Streaming-emission debt offset (motes). See emission.rs.
    pub(crate) stream_debt: Motes,
    /// Outstanding pending-unstake entries across all stakers. Lets
    /// retirement refuse while withdrawals are in flight without scanning
    /// records.
    pub(crate) pending_unstake_count: u32,
    /// Stakers with non-zero active raw shares. Enumeration/UX only,
    /// never consulted by accounting.
    pub(crate) stakers: BTreeSet<AccountId>,
    /// Stake records keyed by staker coldkey.
    pub(crate) stakes: HashMap<AccountId, StakeRecord>,
}

impl ProverAccount {
    /// Create an unregistered (Null) account shell.
    pub fn new(coldkey: AccountId) -> Self {
        Self {
            coldkey,
            state: ProverState::Null,
            commission_rate_bps: 0,
            min_self_stake: 0,
            pending_min_self_stake_update: None,
            total_raw_shares: 0,
            scale: SCALE_ONE,
            acc_reward_per_share: 0,
            pending_commission: 0,
            stream_debt: 0,
            pending_unstake_count: 0,
            stakers: BTreeSet::new(),
            stakes: HashMap::new(),
        }
    }

    pub fn state(&self) -> ProverState {
        self.state
    }

    pub fn scale(&self) -> u128 {
        self.scale
    }

    pub fn total_raw_shares(&self) -> Shares {
        self.total_raw_shares
    }

    pub fn acc_reward_per_share(&self) -> u128 {
        self.acc_reward_per_share
    }

    pub fn pending_commission(&self) -> Motes {
        self.pending_commission
    }

    pub fn commission_rate_bps(&self) -> u16 {
        self.commission_rate_bps
    }

    /// Number of stakers with non-zero active shares.
    pub fn staker_count(&self) -> usize {
        self.stakers.len()
    }

    /// Stakers with non-zero active shares, in key order. UX only.
    pub fn stakers(&self) -> impl Iterator<Item = &AccountId> {
        self.stakers.iter()
    }

    /// The stake record for a staker, if one exists.
    pub fn stake_record(&self, staker: &AccountId) -> Option<&StakeRecord> {
        self.stakes.get(staker)
    }

    /// Convert raw shares to effective motes at the current scale.
    pub fn effective_of(&self, raw: Shares) -> Motes {
        raw * self.scale / SCALE_ONE
    }

    /// Convert motes to raw shares at the current scale. Shares minted
    /// against the current scale are untouched by damage that predates
    /// them.
    pub fn shares_of(&self, amount: Motes) -> Shares {
        amount * SCALE_ONE / self.scale
    }

    /// The prover's total effective stake (all stakers, active shares).
    pub fn effective_total(&self) -> Motes {
        self.effective_of(self.total_raw_shares)
    }

    /// The prover's own active raw shares.
    pub fn self_raw_shares(&self) -> Shares {
        self.stakes
            .get(&self.coldkey)
            .map(|r| r.raw_shares)
            .unwrap_or(0)
    }

    /// The prover's own effective self-stake.
    pub fn self_effective(&self) -> Motes {
        self.effective_of(self.self_raw_shares())
    }

    /// The minimum self-stake in force at `now`, applying any scheduled
    /// decrease whose time has come.
    pub fn min_self_stake_at(&mut self, now: Timestamp) -> Motes {
        if let Some(update) = self.pending_min_self_stake_update {
            if now >= update.effective_at {
                self.min_self_stake = update.target;
                self.pending_min_self_stake_update = None;
            }
        }
        self.min_self_stake
    }

    /// Read-only variant of [`min_self_stake_at`] for views.
    pub fn min_self_stake_effective(&self, now: Timestamp) -> Motes {
        match self.pending_min_self_stake_update {
            Some(update) if now >= update.effective_at => update.target,
            _ => self.min_self_stake,
        }
    }

    /// Eligibility check for the marketplace: Active with at least
    /// `minimum_effective` motes of effective stake. Returns the flag and
    /// the current effective stake.
    pub fn is_eligible(&self, minimum_effective: Motes) -> (bool, Motes) {
        let effective = self.effective_total();
        (
            self.state == ProverState::Active && effective >= minimum_effective,
            effective,
        )
    }

    /// Update the commission rate. Applies to future rewards only; nothing
    /// already settled moves.
    pub fn set_commission_rate(&mut self, bps: u16) -> Result<(), LedgerError> {
        if bps as u128 > BPS_DENOM {
            return Err(LedgerError::InvalidCommissionRate(bps));
        }
        self.commission_rate_bps = bps;
        Ok(())
    }

    /// Change the minimum self-stake. Increases apply immediately and
    /// cancel any scheduled decrease; decreases take effect after the
    /// unstake delay.
    pub fn request_min_self_stake(
        &mut self,
        target: Motes,
        now: Timestamp,
        unstake_delay_secs: Timestamp,
    ) {
        let current = self.min_self_stake_at(now);
        if target >= current {
            self.min_self_stake = target;
            self.pending_min_self_stake_update = None;
        } else {
            self.pending_min_self_stake_update = Some(MinSelfStakeUpdate {
                target,
                effective_at: now + unstake_delay_secs,
            });
        }
    }

    /// Retire the prover. Valid only once every share has left, no
    /// commission is owed, and no unstake request is still in flight.
    pub fn retire(
        &mut self,
        globals: &mut GlobalLedger,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        match self.state {
            ProverState::Active | ProverState::Deactivated => {}
            other => {
                return Err(LedgerError::InvalidState(format!(
                    "Cannot retire a prover in state {:?}",
                    other
                )))
            }
        }
        if self.total_raw_shares != 0 || self.pending_commission != 0 {
            return Err(LedgerError::InvalidState(format!(
                "Cannot retire with {} raw shares and {} motes of commission outstanding",
                self.total_raw_shares, self.pending_commission
            )));
        }
        if self.pending_unstake_count != 0 {
            return Err(LedgerError::InvalidState(format!(
                "Cannot retire with {} pending unstake requests in flight",
                self.pending_unstake_count
            )));
        }
        self.settle_stream(globals, now);
        if self.state == ProverState::Active {
            self.leave_stream(globals);
        }
        self.state = ProverState::Retired;
        Ok(())
    }

    /// Administratively deactivate an Active prover. Settles streaming
    /// accrual at the boundary and removes the prover's effective stake
    /// from the active total.
    pub fn deactivate(
        &mut self,
        globals: &mut GlobalLedger,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        if self.state != ProverState::Active {
            return Err(LedgerError::InvalidState(format!(
                "Cannot deactivate a prover in state {:?}",
                self.state
            )));
        }
        self.settle_stream(globals, now);
        self.leave_stream(globals);
        self.state = ProverState::Deactivated;
        Ok(())
    }

    /// Administratively return a Deactivated prover to Active. Streaming
    /// accrual resumes from the accumulator's current value, never
    /// retroactively.
    pub fn reactivate(
        &mut self,
        globals: &mut GlobalLedger,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        if self.state != ProverState::Deactivated {
            return Err(LedgerError::InvalidState(format!(
                "Cannot reactivate a prover in state {:?}",
                self.state
            )));
        }
        globals.emission.update(now, &mut globals.treasury);
        self.state = ProverState::Active;
        self.join_stream(globals);
        Ok(())
    }

    /// Begin a fresh accounting epoch for a Retired prover that is staking
    /// again: scale back to 1.0, accumulators cleared. Only safe with zero
    /// shares outstanding, since every exited record settled down to zero
    /// debt on its way out.
    pub(crate) fn reset_for_reactivation(&mut self) {
        debug_assert_eq!(self.total_raw_shares, 0);
        self.scale = SCALE_ONE;
        self.acc_reward_per_share = 0;
        self.stream_debt = 0;
        self.state = ProverState::Active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::MOTES_PER_SHO;

    fn coldkey(byte: u8) -> AccountId {
        [byte; 32]
    }

    #[test]
    fn test_new_account_is_null() {
        let acct = ProverAccount::new(coldkey(1));
        assert_eq!(acct.state(), ProverState::Null);
        assert_eq!(acct.scale(), SCALE_ONE);
        assert_eq!(acct.total_raw_shares(), 0);
        assert_eq!(acct.staker_count(), 0);
    }

    #[test]
    fn test_effective_conversion_at_full_scale() {
        let acct = ProverAccount::new(coldkey(1));
        assert_eq!(acct.shares_of(500 * MOTES_PER_SHO), 500 * MOTES_PER_SHO);
        assert_eq!(acct.effective_of(500 * MOTES_PER_SHO), 500 * MOTES_PER_SHO);
    }

    #[test]
    fn test_effective_conversion_after_haircut() {
        let mut acct = ProverAccount::new(coldkey(1));
        acct.scale = SCALE_ONE / 2;
        // 100 motes buys 200 raw shares at scale 0.5
        assert_eq!(acct.shares_of(100), 200);
        // and 200 raw shares are worth 100 motes
        assert_eq!(acct.effective_of(200), 100);
    }

    #[test]
    fn test_commission_rate_bounds() {
        let mut acct = ProverAccount::new(coldkey(1));
        assert!(acct.set_commission_rate(10_000).is_ok());
        assert!(matches!(
            acct.set_commission_rate(10_001),
            Err(LedgerError::InvalidCommissionRate(10_001))
        ));
        assert_eq!(acct.commission_rate_bps(), 10_000);
    }

    #[test]
    fn test_min_self_stake_increase_is_immediate() {
        let mut acct = ProverAccount::new(coldkey(1));
        acct.request_min_self_stake(5 * MOTES_PER_SHO, 1_000, 600);
        assert_eq!(acct.min_self_stake_at(1_000), 5 * MOTES_PER_SHO);
    }

    #[test]
    fn test_min_self_stake_decrease_is_delayed() {
        let mut acct = ProverAccount::new(coldkey(1));
        acct.request_min_self_stake(5 * MOTES_PER_SHO, 1_000, 600);
        acct.request_min_self_stake(MOTES_PER_SHO, 2_000, 600);
        // Still the old value before the delay elapses
        assert_eq!(acct.min_self_stake_at(2_500), 5 * MOTES_PER_SHO);
        assert_eq!(acct.min_self_stake_effective(2_599), 5 * MOTES_PER_SHO);
        // New value once it does
        assert_eq!(acct.min_self_stake_effective(2_600), MOTES_PER_SHO);
        assert_eq!(acct.min_self_stake_at(2_600), MOTES_PER_SHO);
        assert!(acct.pending_min_self_stake_update.is_none());
    }

    #[test]
    fn test_retire_requires_null_balances() {
        let mut globals = GlobalLedger::default();
        let mut acct = ProverAccount::new(coldkey(1));
        acct.state = ProverState::Active;
        acct.total_raw_shares = 1;
        assert!(acct.retire(&mut globals, 0).is_err());
        acct.total_raw_shares = 0;
        acct.pending_commission = 1;
        assert!(acct.retire(&mut globals, 0).is_err());
        acct.pending_commission = 0;
        acct.pending_unstake_count = 1;
        assert!(acct.retire(&mut globals, 0).is_err());
        acct.pending_unstake_count = 0;
        assert!(acct.retire(&mut globals, 0).is_ok());
        assert_eq!(acct.state(), ProverState::Retired);
    }

    #[test]
    fn test_deactivate_reactivate_round_trip() {
        let mut globals = GlobalLedger::default();
        let mut acct = ProverAccount::new(coldkey(1));
        assert!(acct.deactivate(&mut globals, 0).is_err());
        acct.state = ProverState::Active;
        assert!(acct.deactivate(&mut globals, 0).is_ok());
        assert_eq!(acct.state(), ProverState::Deactivated);
        assert!(acct.reactivate(&mut globals, 0).is_ok());
        assert_eq!(acct.state(), ProverState::Active);
    }

    #[test]
    fn test_eligibility() {
        let mut acct = ProverAccount::new(coldkey(1));
        assert_eq!(acct.is_eligible(0), (false, 0));
        acct.state = ProverState::Active;
        acct.total_raw_shares = 10 * MOTES_PER_SHO;
        let (ok, eff) = acct.is_eligible(10 * MOTES_PER_SHO);
        assert!(ok);
        assert_eq!(eff, 10 * MOTES_PER_SHO);
        let (ok, _) = acct.is_eligible(10 * MOTES_PER_SHO + 1);
        assert!(!ok);
    }
}
