// crates/shoal-ledger/src/staking.rs
//
// Stake-side operations: prover registration (with its atomic initial
// self-stake) and delegation. Staking mints raw shares against the
// prover's current scale, so a staker joining after a slash is untouched
// by damage that predates them.
//
// Asset movement is the caller's job: the service layer pulls the staked
// amount into custody around these book-keeping updates.
//
// Reference: ARCHITECTURE.md Section 5

use shoal_core::{AccountId, LedgerError};

use crate::account::{ProverAccount, ProverState, StakeRecord};
use crate::globals::GlobalLedger;
use crate::math::mul_div;
use crate::token::{Motes, Shares, Timestamp, BPS_DENOM, SCALE_ONE};

impl ProverAccount {
    /// Register the prover: Null -> Active, scale 1.0, with the initial
    /// self-stake applied atomically. Returns the raw shares minted.
    ///
    /// # Errors
    /// - `InvalidState` if the account is already registered.
    /// - `InvalidCommissionRate` above 100%.
    /// - `ZeroAmount` / `BelowMinSelfStake` on a missing or undersized
    ///   initial self-stake (checked against the global minimum in force
    ///   at registration time; later changes never reach back).
    pub fn register(
        &mut self,
        globals: &mut GlobalLedger,
        commission_rate_bps: u16,
        min_self_stake: Motes,
        initial_self_stake: Motes,
        now: Timestamp,
    ) -> Result<Shares, LedgerError> {
        if self.state != ProverState::Null {
            return Err(LedgerError::InvalidState(format!(
                "Prover is already registered (state {:?})",
                self.state
            )));
        }
        if commission_rate_bps as u128 > BPS_DENOM {
            return Err(LedgerError::InvalidCommissionRate(commission_rate_bps));
        }
        if initial_self_stake == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if initial_self_stake < globals.params.global_min_self_stake {
            return Err(LedgerError::BelowMinSelfStake {
                remaining: initial_self_stake,
                minimum: globals.params.global_min_self_stake,
            });
        }

        globals.emission.update(now, &mut globals.treasury);

        self.commission_rate_bps = commission_rate_bps;
        self.min_self_stake = min_self_stake;
        self.scale = SCALE_ONE;
        self.state = ProverState::Active;

        // Scale is 1.0 at registration, so shares mint 1:1 with motes.
        let minted = initial_self_stake;
        self.stakes.insert(
            self.coldkey,
            StakeRecord {
                raw_shares: minted,
                ..StakeRecord::default()
            },
        );
        self.stakers.insert(self.coldkey);
        self.total_raw_shares = minted;
        self.join_stream(globals);
        Ok(minted)
    }

    /// Stake `amount` motes from `staker` onto this prover. Returns the
    /// raw shares minted.
    ///
    /// A Retired prover staking onto itself is reborn first: scale back to
    /// 1.0 and cleared accumulators, a fresh accounting epoch with no
    /// retroactive accrual.
    ///
    /// # Errors
    /// - `ZeroAmount` on a zero stake.
    /// - `InvalidState` unless the prover is Active (or Retired and the
    ///   staker is the prover itself).
    /// - `BelowMinSelfStake` when a third party delegates to a prover
    ///   whose own effective self-stake does not meet its minimum.
    pub fn stake(
        &mut self,
        globals: &mut GlobalLedger,
        staker: AccountId,
        amount: Motes,
        now: Timestamp,
    ) -> Result<Shares, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        match self.state {
            ProverState::Active => {}
            ProverState::Retired if staker == self.coldkey => {
                self.reset_for_reactivation();
            }
            other => {
                return Err(LedgerError::InvalidState(format!(
                    "Prover in state {:?} cannot accept stake",
                    other
                )))
            }
        }
        if staker != self.coldkey {
            let minimum = self.min_self_stake_at(now);
            let self_effective = self.self_effective();
            if self_effective < minimum {
                return Err(LedgerError::BelowMinSelfStake {
                    remaining: self_effective,
                    minimum,
                });
            }
        }

        // Settle streaming accrual before the effective stake moves, and
        // the staker's event-reward entitlement before their shares move.
        self.settle_stream(globals, now);
        let eff_before = self.effective_total();
        self.settle_staker(&staker);

        let minted = self.shares_of(amount);
        let acc = self.acc_reward_per_share;
        let record = self.stakes.entry(staker).or_default();
        let was_zero = record.raw_shares == 0;
        record.raw_shares += minted;
        record.reward_debt = mul_div(record.raw_shares, acc, SCALE_ONE);
        self.total_raw_shares += minted;
        if was_zero {
            self.stakers.insert(staker);
        }

        self.sync_stream(globals, eff_before);
        Ok(minted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::MOTES_PER_SHO;

    fn coldkey(byte: u8) -> AccountId {
        [byte; 32]
    }

    fn registered(initial: Motes) -> (GlobalLedger, ProverAccount) {
        let mut globals = GlobalLedger::default();
        let mut acct = ProverAccount::new(coldkey(1));
        acct.register(&mut globals, 1_000, MOTES_PER_SHO, initial, 0)
            .unwrap();
        (globals, acct)
    }

    #[test]
    fn test_register_activates_with_self_stake() {
        let (globals, acct) = registered(100 * MOTES_PER_SHO);
        assert_eq!(acct.state(), ProverState::Active);
        assert_eq!(acct.total_raw_shares(), 100 * MOTES_PER_SHO);
        assert_eq!(acct.self_effective(), 100 * MOTES_PER_SHO);
        assert_eq!(acct.staker_count(), 1);
        assert_eq!(
            globals.emission.total_effective_active,
            100 * MOTES_PER_SHO
        );
    }

    #[test]
    fn test_register_twice_rejected() {
        let (mut globals, mut acct) = registered(100 * MOTES_PER_SHO);
        assert!(matches!(
            acct.register(&mut globals, 0, 0, MOTES_PER_SHO, 0),
            Err(LedgerError::InvalidState(_))
        ));
    }

    #[test]
    fn test_register_below_global_minimum() {
        let mut globals = GlobalLedger::default();
        globals.params.global_min_self_stake = 10 * MOTES_PER_SHO;
        let mut acct = ProverAccount::new(coldkey(1));
        assert!(matches!(
            acct.register(&mut globals, 0, 0, 5 * MOTES_PER_SHO, 0),
            Err(LedgerError::BelowMinSelfStake { .. })
        ));
        assert_eq!(acct.state(), ProverState::Null);
    }

    #[test]
    fn test_register_commission_above_100_percent() {
        let mut globals = GlobalLedger::default();
        let mut acct = ProverAccount::new(coldkey(1));
        assert!(matches!(
            acct.register(&mut globals, 10_001, 0, MOTES_PER_SHO, 0),
            Err(LedgerError::InvalidCommissionRate(_))
        ));
    }

    #[test]
    fn test_delegation_adds_shares() {
        let (mut globals, mut acct) = registered(10 * MOTES_PER_SHO);
        let minted = acct
            .stake(&mut globals, coldkey(2), 5 * MOTES_PER_SHO, 10)
            .unwrap();
        assert_eq!(minted, 5 * MOTES_PER_SHO);
        assert_eq!(acct.total_raw_shares(), 15 * MOTES_PER_SHO);
        assert_eq!(acct.staker_count(), 2);
        assert_eq!(globals.emission.total_effective_active, 15 * MOTES_PER_SHO);
    }

    #[test]
    fn test_delegation_requires_prover_self_stake() {
        let mut globals = GlobalLedger::default();
        let mut acct = ProverAccount::new(coldkey(1));
        // Prover requires 50 SHO of itself but bonded only 10.
        acct.register(&mut globals, 0, 50 * MOTES_PER_SHO, 10 * MOTES_PER_SHO, 0)
            .unwrap();
        assert!(matches!(
            acct.stake(&mut globals, coldkey(2), MOTES_PER_SHO, 0),
            Err(LedgerError::BelowMinSelfStake { .. })
        ));
        // The prover itself may keep adding stake.
        assert!(acct.stake(&mut globals, coldkey(1), MOTES_PER_SHO, 0).is_ok());
    }

    #[test]
    fn test_zero_stake_rejected() {
        let (mut globals, mut acct) = registered(10 * MOTES_PER_SHO);
        assert!(matches!(
            acct.stake(&mut globals, coldkey(2), 0, 0),
            Err(LedgerError::ZeroAmount)
        ));
    }

    #[test]
    fn test_stake_on_deactivated_rejected() {
        let (mut globals, mut acct) = registered(10 * MOTES_PER_SHO);
        acct.deactivate(&mut globals, 5).unwrap();
        assert!(matches!(
            acct.stake(&mut globals, coldkey(2), MOTES_PER_SHO, 10),
            Err(LedgerError::InvalidState(_))
        ));
    }

    #[test]
    fn test_shares_minted_at_current_scale() {
        let (mut globals, mut acct) = registered(100 * MOTES_PER_SHO);
        // Halve the scale: 50% slash territory.
        acct.slash_by_ppm(&mut globals, 500_000, 10).unwrap();
        assert_eq!(acct.scale(), SCALE_ONE / 2);
        // A new 10 SHO delegation buys 20 SHO worth of raw shares, so its
        // effective value is exactly 10 SHO, undiluted by the old slash.
        let minted = acct
            .stake(&mut globals, coldkey(2), 10 * MOTES_PER_SHO, 20)
            .unwrap();
        assert_eq!(minted, 20 * MOTES_PER_SHO);
        assert_eq!(acct.effective_of(minted), 10 * MOTES_PER_SHO);
    }
}
