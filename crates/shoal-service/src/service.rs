// crates/shoal-service/src/service.rs
//
// StakingService: the concurrent, capability-checked API over the ledger
// engine. One instance serves every prover; operations on distinct
// provers run in parallel, operations on the same prover serialize on its
// mutex.
//
// Ordering discipline per operation: validate, mutate ledger state, then
// move assets. Inbound transfers are pulled before book-keeping (they
// double as caller-funds validation) and refunded if validation fails;
// outbound transfers run strictly after book-keeping is final.
//
// Reference: ARCHITECTURE.md Sections 11, 12

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use shoal_core::{account_to_hex, AccountId, Custody, LedgerError, MarketplaceLedger};
use shoal_ledger::{GlobalLedger, Motes, ProverState, Shares, Timestamp};

use crate::config::ServiceConfig;
use crate::shared::SharedLedgerState;
use crate::views::{NetworkTotals, PendingUnstakeView, ProverOverview, StakerPosition};

/// The marketplace-facing staking service.
pub struct StakingService {
    state: SharedLedgerState,
    custody: Arc<dyn Custody>,
    owner: AccountId,
    slashing_authority: AccountId,
}

impl StakingService {
    /// Build a service from configuration, anchoring the emission clock at
    /// `now`.
    pub fn new(
        config: &ServiceConfig,
        custody: Arc<dyn Custody>,
        now: Timestamp,
    ) -> Result<Self, LedgerError> {
        config.validate()?;
        let globals = GlobalLedger::new(
            config.ledger_params(),
            config.emission_rate_per_second,
            now,
        );
        Ok(Self {
            state: SharedLedgerState::new(globals),
            custody,
            owner: config.owner_key()?,
            slashing_authority: config.slashing_authority_key()?,
        })
    }

    /// The shared state, for embedders that need direct read access.
    pub fn shared(&self) -> &SharedLedgerState {
        &self.state
    }

    fn require_owner(&self, caller: &AccountId) -> Result<(), LedgerError> {
        if *caller != self.owner {
            return Err(LedgerError::Unauthorized(
                "Operation requires the service owner".to_string(),
            ));
        }
        Ok(())
    }

    /// Return pulled-in funds when validation fails after the transfer.
    /// The vault necessarily holds them, so a refund failure indicates a
    /// broken custody implementation.
    async fn refund(&self, to: &AccountId, amount: Motes) {
        if amount == 0 {
            return;
        }
        if let Err(e) = self.custody.transfer_out(to, amount).await {
            error!(
                "Refund of {} motes to {} failed: {}",
                amount,
                account_to_hex(to),
                e
            );
        }
    }

    // -----------------------------------------------------------------
    // Prover lifecycle and staking
    // -----------------------------------------------------------------

    /// Register a new prover with its atomic initial self-stake.
    pub async fn register_prover(
        &self,
        prover: AccountId,
        commission_rate_bps: u16,
        min_self_stake: Motes,
        initial_self_stake: Motes,
        now: Timestamp,
    ) -> Result<Shares, LedgerError> {
        let handle = self.state.account_or_shell(&prover).await;
        self.custody.transfer_in(&prover, initial_self_stake).await?;
        let mut account = handle.lock().await;
        let mut globals = self.state.globals.lock().await;
        match account.register(
            &mut globals,
            commission_rate_bps,
            min_self_stake,
            initial_self_stake,
            now,
        ) {
            Ok(minted) => {
                info!(
                    "Registered prover {} with {} motes of self-stake",
                    account_to_hex(&prover),
                    initial_self_stake
                );
                Ok(minted)
            }
            Err(e) => {
                drop(globals);
                drop(account);
                self.refund(&prover, initial_self_stake).await;
                Err(e)
            }
        }
    }

    /// Stake `amount` motes from `staker` onto `prover`.
    pub async fn stake(
        &self,
        staker: AccountId,
        prover: AccountId,
        amount: Motes,
        now: Timestamp,
    ) -> Result<Shares, LedgerError> {
        let handle = self.state.account(&prover).await?;
        self.custody.transfer_in(&staker, amount).await?;
        let mut account = handle.lock().await;
        let mut globals = self.state.globals.lock().await;
        match account.stake(&mut globals, staker, amount, now) {
            Ok(minted) => {
                info!(
                    "Staked {} motes from {} to prover {} ({} raw shares)",
                    amount,
                    account_to_hex(&staker),
                    account_to_hex(&prover),
                    minted
                );
                Ok(minted)
            }
            Err(e) => {
                drop(globals);
                drop(account);
                self.refund(&staker, amount).await;
                Err(e)
            }
        }
    }

    /// Queue a delayed withdrawal of `amount` effective motes.
    pub async fn request_unstake(
        &self,
        staker: AccountId,
        prover: AccountId,
        amount: Motes,
        now: Timestamp,
    ) -> Result<Shares, LedgerError> {
        let handle = self.state.account(&prover).await?;
        let mut account = handle.lock().await;
        let mut globals = self.state.globals.lock().await;
        let queued = account.request_unstake(&mut globals, staker, amount, now)?;
        info!(
            "Unstake of {} motes queued for {} on prover {}",
            amount,
            account_to_hex(&staker),
            account_to_hex(&prover)
        );
        Ok(queued)
    }

    /// Complete every unstake request whose delay has elapsed and pay the
    /// aggregate out in one transfer.
    pub async fn complete_unstake(
        &self,
        staker: AccountId,
        prover: AccountId,
        now: Timestamp,
    ) -> Result<Motes, LedgerError> {
        let handle = self.state.account(&prover).await?;
        let payout = {
            let mut account = handle.lock().await;
            let mut globals = self.state.globals.lock().await;
            account.complete_unstake(&mut globals, &staker, now)?
        };
        // Book-keeping is final; conservation guarantees custody covers it.
        self.custody.transfer_out(&staker, payout).await?;
        info!(
            "Unstake completed: {} motes paid to {}",
            payout,
            account_to_hex(&staker)
        );
        Ok(payout)
    }

    /// Withdraw settled rewards (plus commission for the prover itself).
    pub async fn withdraw_rewards(
        &self,
        caller: AccountId,
        prover: AccountId,
        now: Timestamp,
    ) -> Result<Motes, LedgerError> {
        let handle = self.state.account(&prover).await?;
        let payout = {
            let mut account = handle.lock().await;
            let mut globals = self.state.globals.lock().await;
            account.withdraw_rewards(&mut globals, &caller, now)?
        };
        self.custody.transfer_out(&caller, payout).await?;
        info!(
            "Rewards withdrawn: {} motes to {}",
            payout,
            account_to_hex(&caller)
        );
        Ok(payout)
    }

    /// Retire a prover. Allowed for the prover itself or the owner.
    pub async fn retire_prover(
        &self,
        caller: AccountId,
        prover: AccountId,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        if caller != prover {
            self.require_owner(&caller)?;
        }
        let handle = self.state.account(&prover).await?;
        let mut account = handle.lock().await;
        let mut globals = self.state.globals.lock().await;
        account.retire(&mut globals, now)?;
        info!("Prover {} retired", account_to_hex(&prover));
        Ok(())
    }

    /// Administratively deactivate a prover. Owner only.
    pub async fn deactivate_prover(
        &self,
        caller: AccountId,
        prover: AccountId,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.require_owner(&caller)?;
        let handle = self.state.account(&prover).await?;
        let mut account = handle.lock().await;
        let mut globals = self.state.globals.lock().await;
        account.deactivate(&mut globals, now)?;
        warn!("Prover {} deactivated by owner", account_to_hex(&prover));
        Ok(())
    }

    /// Return a deactivated prover to Active. Owner only.
    pub async fn reactivate_prover(
        &self,
        caller: AccountId,
        prover: AccountId,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.require_owner(&caller)?;
        let handle = self.state.account(&prover).await?;
        let mut account = handle.lock().await;
        let mut globals = self.state.globals.lock().await;
        account.reactivate(&mut globals, now)?;
        info!("Prover {} reactivated", account_to_hex(&prover));
        Ok(())
    }

    /// Prover self-service: change the commission rate (future rewards
    /// only).
    pub async fn set_commission_rate(
        &self,
        prover: AccountId,
        bps: u16,
    ) -> Result<(), LedgerError> {
        let handle = self.state.account(&prover).await?;
        let mut account = handle.lock().await;
        account.set_commission_rate(bps)
    }

    /// Prover self-service: change the minimum self-stake. Decreases wait
    /// out the unstake delay.
    pub async fn set_min_self_stake(
        &self,
        prover: AccountId,
        target: Motes,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        let handle = self.state.account(&prover).await?;
        let mut account = handle.lock().await;
        let delay = self.state.globals.lock().await.params.unstake_delay_secs;
        account.request_min_self_stake(target, now, delay);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Owner parameters, treasury, emission
    // -----------------------------------------------------------------

    /// Owner: change the unstake delay (bounded at 30 days).
    pub async fn set_unstake_delay(
        &self,
        caller: AccountId,
        secs: Timestamp,
    ) -> Result<(), LedgerError> {
        self.require_owner(&caller)?;
        let mut globals = self.state.globals.lock().await;
        globals.params.set_unstake_delay(secs)
    }

    /// Owner: change the minimum self-stake for future registrations.
    pub async fn set_global_min_self_stake(
        &self,
        caller: AccountId,
        motes: Motes,
    ) -> Result<(), LedgerError> {
        self.require_owner(&caller)?;
        let mut globals = self.state.globals.lock().await;
        globals.params.set_global_min_self_stake(motes);
        Ok(())
    }

    /// Owner: change the streaming emission rate. The elapsed interval is
    /// settled at the old rate first.
    pub async fn set_emission_rate(
        &self,
        caller: AccountId,
        rate_per_second: Motes,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.require_owner(&caller)?;
        let mut guard = self.state.globals.lock().await;
        let globals = &mut *guard;
        globals
            .emission
            .set_rate(rate_per_second, now, &mut globals.treasury);
        Ok(())
    }

    /// Owner: pay motes out of the treasury.
    pub async fn withdraw_treasury(
        &self,
        caller: AccountId,
        to: AccountId,
        amount: Motes,
    ) -> Result<(), LedgerError> {
        self.require_owner(&caller)?;
        {
            let mut globals = self.state.globals.lock().await;
            globals.treasury.withdraw(amount)?;
        }
        self.custody.transfer_out(&to, amount).await?;
        info!(
            "Treasury paid {} motes to {}",
            amount,
            account_to_hex(&to)
        );
        Ok(())
    }

    /// Top up the streaming emission budget. Permissionless.
    pub async fn fund_emission(
        &self,
        caller: AccountId,
        amount: Motes,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        self.custody.transfer_in(&caller, amount).await?;
        let mut globals = self.state.globals.lock().await;
        globals.emission.fund(amount);
        info!(
            "Emission budget funded with {} motes by {}",
            amount,
            account_to_hex(&caller)
        );
        Ok(())
    }

    /// Advance the global emission accumulator to `now`. Callable by
    /// anyone; every mutating operation also does this implicitly.
    pub async fn update_emission(&self, now: Timestamp) {
        let mut guard = self.state.globals.lock().await;
        let globals = &mut *guard;
        globals.emission.update(now, &mut globals.treasury);
    }

    // -----------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------

    /// Protocol-wide totals.
    pub async fn network_totals(&self) -> NetworkTotals {
        let prover_count = self.state.prover_count().await;
        let globals = self.state.globals.lock().await;
        NetworkTotals {
            prover_count,
            total_effective_active_stake: globals.emission.total_effective_active,
            treasury_balance: globals.treasury.balance(),
            emission_budget_remaining: globals.emission.budget_remaining,
            emission_rate_per_second: globals.emission.rate_per_second,
        }
    }

    /// One prover's headline numbers.
    pub async fn prover_overview(
        &self,
        prover: AccountId,
        now: Timestamp,
    ) -> Result<ProverOverview, LedgerError> {
        let handle = self.state.account(&prover).await?;
        let account = handle.lock().await;
        let effective = account.effective_total();
        Ok(ProverOverview {
            coldkey: account_to_hex(&prover),
            state: account.state(),
            commission_rate_bps: account.commission_rate_bps(),
            scale: account.scale(),
            total_raw_shares: account.total_raw_shares(),
            effective_stake: effective,
            effective_stake_sho: ProverOverview::display_sho(effective),
            self_effective: account.self_effective(),
            min_self_stake: account.min_self_stake_effective(now),
            staker_count: account.staker_count(),
            pending_commission: account.pending_commission(),
        })
    }

    /// One staker's position on one prover, including the unstake
    /// schedule.
    pub async fn staker_position(
        &self,
        prover: AccountId,
        staker: AccountId,
        _now: Timestamp,
    ) -> Result<StakerPosition, LedgerError> {
        let handle = self.state.account(&prover).await?;
        let account = handle.lock().await;
        let delay = self.state.globals.lock().await.params.unstake_delay_secs;
        let (raw_shares, pending_unstakes) = match account.stake_record(&staker) {
            Some(record) => (
                record.raw_shares,
                record
                    .pending_unstakes
                    .iter()
                    .map(|req| PendingUnstakeView {
                        raw_shares: req.raw_shares,
                        current_value: account
                            .effective_of(req.raw_shares)
                            .min(req.raw_shares * req.scale_snapshot / shoal_ledger::SCALE_ONE),
                        requested_at: req.requested_at,
                        eligible_at: req.requested_at + delay,
                    })
                    .collect(),
            ),
            None => (0, Vec::new()),
        };
        Ok(StakerPosition {
            staker: account_to_hex(&staker),
            raw_shares,
            effective: account.effective_of(raw_shares),
            pending_rewards: account.pending_rewards_of(&staker),
            pending_unstakes,
        })
    }
}

#[async_trait]
impl MarketplaceLedger for StakingService {
    async fn is_eligible(
        &self,
        prover: &AccountId,
        minimum_effective: u128,
    ) -> Result<(bool, u128), LedgerError> {
        let handle = self.state.account(prover).await?;
        let account = handle.lock().await;
        Ok(account.is_eligible(minimum_effective))
    }

    async fn credit_rewards(
        &self,
        caller: &AccountId,
        prover: &AccountId,
        amount: u128,
        now: u64,
    ) -> Result<(u128, u128), LedgerError> {
        let handle = self.state.account(prover).await?;
        self.custody.transfer_in(caller, amount).await?;
        let mut account = handle.lock().await;
        let mut globals = self.state.globals.lock().await;
        account.settle_stream(&mut globals, now);
        match account.credit_rewards(&mut globals, amount) {
            Ok(split) => {
                info!(
                    "Credited {} motes to prover {} (commission {}, stakers {})",
                    amount,
                    account_to_hex(prover),
                    split.commission,
                    split.stakers_portion
                );
                Ok((split.commission, split.stakers_portion))
            }
            Err(e) => {
                drop(globals);
                drop(account);
                self.refund(caller, amount).await;
                Err(e)
            }
        }
    }

    async fn slash_by_percentage(
        &self,
        caller: &AccountId,
        prover: &AccountId,
        ppm: u32,
        now: u64,
    ) -> Result<u128, LedgerError> {
        if *caller != self.slashing_authority {
            return Err(LedgerError::Unauthorized(
                "Caller does not hold the slashing capability".to_string(),
            ));
        }
        let handle = self.state.account(prover).await?;
        let mut account = handle.lock().await;
        let mut globals = self.state.globals.lock().await;
        let slashed = account.slash_by_ppm(&mut globals, ppm, now)?;
        warn!(
            "Prover {} slashed {} ppm ({} motes removed)",
            account_to_hex(prover),
            ppm,
            slashed
        );
        if account.state() == ProverState::Deactivated {
            warn!(
                "Prover {} fell below the soft scale threshold and was deactivated",
                account_to_hex(prover)
            );
        }
        Ok(slashed)
    }

    async fn slash_by_amount(
        &self,
        caller: &AccountId,
        prover: &AccountId,
        amount: u128,
        now: u64,
    ) -> Result<u128, LedgerError> {
        if *caller != self.slashing_authority {
            return Err(LedgerError::Unauthorized(
                "Caller does not hold the slashing capability".to_string(),
            ));
        }
        let handle = self.state.account(prover).await?;
        let mut account = handle.lock().await;
        let mut globals = self.state.globals.lock().await;
        let slashed = account.slash_by_amount(&mut globals, amount, now)?;
        warn!(
            "Prover {} slashed by amount: {} motes removed",
            account_to_hex(prover),
            slashed
        );
        Ok(slashed)
    }
}
