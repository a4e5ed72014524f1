// crates/shoal-ledger/src/slashing.rs
//
// Slashing: punitive, proportional stake reduction applied through the
// prover's scale factor. One O(1) multiplication reprices every active
// stake and every in-flight pending unstake simultaneously; no per-staker
// balance is ever touched. The effective value removed from active stake
// flows to the treasury.
//
// Guards (all fail with SlashTooHigh, never clamp):
//   - a 100% slash is never accepted
//   - a single event may not exceed the configured maximum (default 50%)
//   - once the scale sits at or below the hard floor (default 20%), no
//     further slashing is accepted
// Crossing the soft threshold (default 40%) auto-deactivates the prover.
//
// Reference: ARCHITECTURE.md Section 7

use shoal_core::LedgerError;

use crate::account::{ProverAccount, ProverState};
use crate::globals::GlobalLedger;
use crate::token::{Motes, Timestamp, PPM_DENOM};

impl ProverAccount {
    /// Slash this prover by `ppm` parts per million. Returns the effective
    /// motes removed from active stake (queued unstakes lose value too,
    /// realized when they complete).
    pub fn slash_by_ppm(
        &mut self,
        globals: &mut GlobalLedger,
        ppm: u32,
        now: Timestamp,
    ) -> Result<Motes, LedgerError> {
        match self.state {
            ProverState::Active | ProverState::Deactivated => {}
            other => {
                return Err(LedgerError::InvalidState(format!(
                    "Cannot slash a prover in state {:?}",
                    other
                )))
            }
        }
        if ppm == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if ppm as u128 >= PPM_DENOM {
            return Err(LedgerError::SlashTooHigh(
                "A 100% slash is never accepted".to_string(),
            ));
        }
        if ppm > globals.params.max_slash_ppm {
            return Err(LedgerError::SlashTooHigh(format!(
                "{} ppm exceeds the {} ppm single-event maximum",
                ppm, globals.params.max_slash_ppm
            )));
        }
        if self.scale <= globals.params.scale_hard_floor {
            return Err(LedgerError::SlashTooHigh(format!(
                "Scale {} already sits at or below the hard floor {}",
                self.scale, globals.params.scale_hard_floor
            )));
        }

        self.settle_stream(globals, now);
        let eff_before = self.effective_total();
        self.scale = self.scale * (PPM_DENOM - ppm as u128) / PPM_DENOM;
        let eff_after = self.effective_total();
        let slashed = eff_before - eff_after;
        globals.treasury.deposit(slashed);
        self.sync_stream(globals, eff_before);

        if self.scale < globals.params.scale_soft_floor && self.state == ProverState::Active {
            self.leave_stream(globals);
            self.state = ProverState::Deactivated;
        }
        Ok(slashed)
    }

    /// Slash an absolute effective amount, converted to a fraction of the
    /// prover's current effective stake (rounded up, so at least the
    /// requested value is removed). Subject to the same guards as
    /// [`slash_by_ppm`]. Returns the effective motes actually removed.
    pub fn slash_by_amount(
        &mut self,
        globals: &mut GlobalLedger,
        amount: Motes,
        now: Timestamp,
    ) -> Result<Motes, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let effective = self.effective_total();
        if effective == 0 {
            return Err(LedgerError::InsufficientStake {
                requested: amount,
                available: 0,
            });
        }
        let ppm = (amount * PPM_DENOM + effective - 1) / effective;
        if ppm >= PPM_DENOM {
            return Err(LedgerError::SlashTooHigh(format!(
                "{} motes is the prover's entire effective stake of {} motes",
                amount, effective
            )));
        }
        self.slash_by_ppm(globals, ppm as u32, now)
    }
}
