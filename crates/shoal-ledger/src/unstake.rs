// crates/shoal-ledger/src/unstake.rs
//
// Delayed unstaking. A request removes raw shares from active stake and
// parks them in a bounded, chronological per-staker queue together with a
// scale snapshot. Completion re-derives the payout from the *current*
// scale, so a slash during the delay period still bites; a staker cannot
// dodge a slash by getting in line first.
//
// Reference: ARCHITECTURE.md Section 8

use shoal_core::{AccountId, LedgerError};

use crate::account::{PendingUnstake, ProverAccount, ProverState};
use crate::globals::GlobalLedger;
use crate::math::mul_div;
use crate::token::{Motes, Shares, Timestamp, SCALE_ONE};

impl ProverAccount {
    /// Request withdrawal of `amount` effective motes for `staker`.
    /// Converts to raw shares at the current scale and queues them.
    /// Returns the raw shares queued.
    ///
    /// A request that would leave the record's remaining shares worth
    /// zero motes takes all of them, so no dust shares linger. The prover
    /// itself may always exit to exactly zero, but a partial exit may not
    /// leave its effective self-stake strictly between zero and its
    /// minimum.
    pub fn request_unstake(
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
            ProverState::Active | ProverState::Deactivated => {}
            other => {
                return Err(LedgerError::InvalidState(format!(
                    "Cannot unstake from a prover in state {:?}",
                    other
                )))
            }
        }

        let limit = globals.params.max_pending_unstakes;
        let available = match self.stakes.get(&staker) {
            Some(record) => {
                if record.pending_unstakes.len() >= limit {
                    return Err(LedgerError::TooManyPendingUnstakes { limit });
                }
                record.raw_shares
            }
            None => {
                return Err(LedgerError::NotFound(format!(
                    "No stake record for staker on prover {}",
                    shoal_core::account_to_hex(&self.coldkey)
                )))
            }
        };

        let mut raw = self.shares_of(amount);
        if raw > available {
            return Err(LedgerError::InsufficientStake {
                requested: amount,
                available: self.effective_of(available),
            });
        }
        // Snap to a full exit when the remainder would be worthless.
        if self.effective_of(available - raw) == 0 {
            raw = available;
        }

        if staker == self.coldkey {
            let remaining = self.effective_of(available - raw);
            let minimum = self.min_self_stake_at(now);
            if remaining > 0 && remaining < minimum {
                return Err(LedgerError::BelowMinSelfStake { remaining, minimum });
            }
        }

        self.settle_stream(globals, now);
        let eff_before = self.effective_total();
        self.settle_staker(&staker);

        let acc = self.acc_reward_per_share;
        let snapshot = self.scale;
        // Validated above; the record cannot have vanished.
        if let Some(record) = self.stakes.get_mut(&staker) {
            record.raw_shares -= raw;
            record.reward_debt = mul_div(record.raw_shares, acc, SCALE_ONE);
            record.pending_unstakes.push(PendingUnstake {
                raw_shares: raw,
                requested_at: now,
                scale_snapshot: snapshot,
            });
            if record.raw_shares == 0 {
                self.stakers.remove(&staker);
            }
        }
        self.total_raw_shares -= raw;
        self.pending_unstake_count += 1;

        self.sync_stream(globals, eff_before);
        Ok(raw)
    }

    /// Complete every queued request whose delay has elapsed, oldest
    /// first, stopping at the first that has not; the queue is
    /// chronological, so nothing behind it can be ready either. Returns
    /// the aggregate payout in motes; the service layer pays it out of
    /// custody in a single transfer.
    ///
    /// The payout prices raw shares at the current scale (capped by the
    /// request-time snapshot); the gap the slash opened is booked to the
    /// treasury.
    pub fn complete_unstake(
        &mut self,
        globals: &mut GlobalLedger,
        staker: &AccountId,
        now: Timestamp,
    ) -> Result<Motes, LedgerError> {
        if self.state == ProverState::Null {
            return Err(LedgerError::InvalidState(
                "Prover is not registered".to_string(),
            ));
        }
        let delay = globals.params.unstake_delay_secs;
        let scale = self.scale;

        let record = match self.stakes.get_mut(staker) {
            Some(record) if !record.pending_unstakes.is_empty() => record,
            _ => return Err(LedgerError::NoUnstakeRequest),
        };

        let mut payout: Motes = 0;
        let mut shortfall: Motes = 0;
        let mut completed = 0usize;
        for request in &record.pending_unstakes {
            if now < request.requested_at + delay {
                break;
            }
            let pay_scale = scale.min(request.scale_snapshot);
            let owed = request.raw_shares * request.scale_snapshot / SCALE_ONE;
            let paid = request.raw_shares * pay_scale / SCALE_ONE;
            payout += paid;
            shortfall += owed - paid;
            completed += 1;
        }
        if completed == 0 {
            return Err(LedgerError::UnstakeNotReady);
        }
        record.pending_unstakes.drain(..completed);
        if record.is_empty() {
            self.stakes.remove(staker);
        }
        self.pending_unstake_count -= completed as u32;
        globals.treasury.deposit(shortfall);
        Ok(payout)
    }
}
