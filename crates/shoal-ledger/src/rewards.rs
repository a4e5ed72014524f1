// crates/shoal-ledger/src/rewards.rs
//
// Event-reward distribution and lazy per-staker settlement.
//
// Rewards enter as a lump sum per prover. Commission comes off the top;
// the remainder raises a single prover-wide accumulator, so the cost of a
// credit is independent of the staker count. Individual entitlement is
// materialized lazily via each record's reward debt. The integer remainder
// of the distribution division (the dust) is booked to the treasury,
// never to a staker and never dropped.
//
// Reference: ARCHITECTURE.md Section 6

use serde::{Deserialize, Serialize};

use shoal_core::{AccountId, LedgerError};

use crate::account::{ProverAccount, ProverState};
use crate::globals::GlobalLedger;
use crate::math::mul_div;
use crate::token::{Motes, Timestamp, BPS_DENOM, SCALE_ONE};
use crate::treasury::Treasury;

/// Exact decomposition of one reward credit.
/// `commission + stakers_portion + dust` always equals the credited amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    /// Motes credited to the prover's pending commission.
    pub commission: Motes,
    /// Motes distributed to stakers through the accumulator.
    pub stakers_portion: Motes,
    /// Division remainder booked to the treasury.
    pub dust: Motes,
}

impl RewardBreakdown {
    /// The credited total this breakdown decomposes.
    pub fn total(&self) -> Motes {
        self.commission + self.stakers_portion + self.dust
    }
}

impl ProverAccount {
    /// Split `amount` into commission, staker distribution, and dust, and
    /// apply all three. With no shares outstanding the whole amount
    /// becomes commission, since nobody else exists to receive it, and the
    /// credit still succeeds.
    pub(crate) fn distribute(&mut self, amount: Motes, treasury: &mut Treasury) -> RewardBreakdown {
        let commission = amount * self.commission_rate_bps as u128 / BPS_DENOM;
        let remainder = amount - commission;

        if self.total_raw_shares == 0 {
            self.pending_commission += amount;
            return RewardBreakdown {
                commission: amount,
                stakers_portion: 0,
                dust: 0,
            };
        }

        self.pending_commission += commission;
        let delta = mul_div(remainder, SCALE_ONE, self.total_raw_shares);
        self.acc_reward_per_share += delta;
        let distributed = mul_div(delta, self.total_raw_shares, SCALE_ONE);
        let dust = remainder - distributed;
        treasury.deposit(dust);
        RewardBreakdown {
            commission,
            stakers_portion: distributed,
            dust,
        }
    }

    /// Credit `amount` motes of job rewards to this prover.
    ///
    /// Valid for Active and Deactivated provers: work settled before a
    /// deactivation still pays out. The backing asset is pulled into
    /// custody by the service layer.
    pub fn credit_rewards(
        &mut self,
        globals: &mut GlobalLedger,
        amount: Motes,
    ) -> Result<RewardBreakdown, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        match self.state {
            ProverState::Active | ProverState::Deactivated => {}
            other => {
                return Err(LedgerError::InvalidState(format!(
                    "Cannot credit rewards to a prover in state {:?}",
                    other
                )))
            }
        }
        Ok(self.distribute(amount, &mut globals.treasury))
    }

    /// Materialize a staker's entitlement into their pending balance and
    /// advance their debt baseline. Must run before any operation that
    /// changes the record's raw shares.
    pub(crate) fn settle_staker(&mut self, staker: &AccountId) {
        let acc = self.acc_reward_per_share;
        if let Some(record) = self.stakes.get_mut(staker) {
            let accrued = mul_div(record.raw_shares, acc, SCALE_ONE);
            record.pending_rewards += accrued.saturating_sub(record.reward_debt);
            record.reward_debt = accrued;
        }
    }

    /// A staker's total claimable rewards right now (settled plus
    /// unsettled), without mutating anything. Excludes commission.
    pub fn pending_rewards_of(&self, staker: &AccountId) -> Motes {
        match self.stakes.get(staker) {
            Some(record) => {
                let accrued = mul_div(record.raw_shares, self.acc_reward_per_share, SCALE_ONE);
                record.pending_rewards + accrued.saturating_sub(record.reward_debt)
            }
            None => 0,
        }
    }

    /// Withdraw everything claimable by `caller`: settled rewards, plus
    /// pending commission when the caller is the prover itself. Returns
    /// the payout; the service layer transfers it out of custody last.
    ///
    /// # Errors
    /// `NoRewardsAvailable` when the total payout would be zero. A
    /// repeated withdrawal yields this error, never an under-funded
    /// payment.
    pub fn withdraw_rewards(
        &mut self,
        globals: &mut GlobalLedger,
        caller: &AccountId,
        now: Timestamp,
    ) -> Result<Motes, LedgerError> {
        if self.state == ProverState::Null {
            return Err(LedgerError::InvalidState(
                "Prover is not registered".to_string(),
            ));
        }
        // Streaming accrual may still be ticking; fold it in first so the
        // caller receives everything earned up to `now`.
        self.settle_stream(globals, now);
        self.settle_staker(caller);

        let mut payout: Motes = 0;
        if let Some(record) = self.stakes.get_mut(caller) {
            payout += record.pending_rewards;
            record.pending_rewards = 0;
        }
        if *caller == self.coldkey {
            payout += self.pending_commission;
            self.pending_commission = 0;
        }
        if payout == 0 {
            return Err(LedgerError::NoRewardsAvailable);
        }
        if let Some(record) = self.stakes.get(caller) {
            if record.is_empty() {
                self.stakes.remove(caller);
            }
        }
        Ok(payout)
    }
}
