// crates/shoal-ledger/src/emission.rs
//
// Streaming emission: a protocol-wide budget streamed out at a fixed rate
// per second across all Active provers, proportional to effective stake.
//
// The pool keeps a single accumulator, `acc_per_effective` (1e18 fixed
// point): the cumulative motes emitted per mote of effective active stake.
// Each prover carries a `stream_debt` offset against it, settled whenever
// the prover's effective stake or lifecycle state changes, so accrual is
// O(1) and never retroactive.
//
// Reference: ARCHITECTURE.md Section 9

use serde::{Deserialize, Serialize};

use crate::account::{ProverAccount, ProverState};
use crate::globals::GlobalLedger;
use crate::math::mul_div;
use crate::token::{Motes, Timestamp, SCALE_ONE};
use crate::treasury::Treasury;

/// Protocol-wide streaming emission state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionPool {
    /// Motes emitted per second while budget remains.
    pub rate_per_second: Motes,
    /// Motes left in the emission budget. Anyone may top this up.
    pub budget_remaining: Motes,
    /// Cumulative motes emitted per mote of effective active stake
    /// (1e18 fixed point). Monotonically non-decreasing.
    pub acc_per_effective: u128,
    /// Sum of effective stake over all Active provers.
    pub total_effective_active: Motes,
    /// Timestamp of the last accumulator update.
    pub last_update: Timestamp,
}

impl EmissionPool {
    /// Create a new pool with the given rate, an empty budget, and the
    /// clock anchored at `now`.
    pub fn new(rate_per_second: Motes, now: Timestamp) -> Self {
        Self {
            rate_per_second,
            budget_remaining: 0,
            acc_per_effective: 0,
            total_effective_active: 0,
            last_update: now,
        }
    }

    /// Top up the emission budget. Permissionless; the backing asset is
    /// pulled into custody by the caller before this is recorded.
    pub fn fund(&mut self, amount: Motes) {
        self.budget_remaining = self.budget_remaining.saturating_add(amount);
    }

    /// Change the emission rate. Settles the accumulator up to `now` first
    /// so the old rate applies to the elapsed interval.
    pub fn set_rate(&mut self, rate_per_second: Motes, now: Timestamp, treasury: &mut Treasury) {
        self.update(now, treasury);
        self.rate_per_second = rate_per_second;
    }

    /// Advance the accumulator to `now`.
    ///
    /// Emits `min(elapsed * rate, budget_remaining)` motes across the
    /// current effective active stake. The clock always advances; when no
    /// active stake exists the budget is preserved rather than burned, and
    /// nothing accrues for the idle interval. Division dust goes to the
    /// treasury so the decremented budget is fully accounted.
    pub fn update(&mut self, now: Timestamp, treasury: &mut Treasury) {
        if now <= self.last_update {
            return;
        }
        let elapsed = (now - self.last_update) as u128;
        self.last_update = now;

        if self.rate_per_second == 0 || self.budget_remaining == 0 {
            return;
        }
        let emitted = (elapsed * self.rate_per_second).min(self.budget_remaining);
        if emitted == 0 || self.total_effective_active == 0 {
            return;
        }

        let delta = mul_div(emitted, SCALE_ONE, self.total_effective_active);
        if delta == 0 {
            // Emission too small to move the accumulator; leave the budget
            // intact and let a longer interval pick it up.
            return;
        }
        self.acc_per_effective += delta;
        let distributed = mul_div(delta, self.total_effective_active, SCALE_ONE);
        self.budget_remaining -= emitted;
        treasury.deposit(emitted - distributed);
    }

    /// Entitlement of `effective` motes of stake against the accumulator.
    pub(crate) fn entitlement(&self, effective: Motes) -> Motes {
        mul_div(effective, self.acc_per_effective, SCALE_ONE)
    }
}

impl ProverAccount {
    /// Settle this prover's streaming accrual up to `now`.
    ///
    /// Runs automatically before any operation that changes the prover's
    /// effective stake or lifecycle state; callable directly to realize
    /// accrual during a quiet period. The settled amount flows through the
    /// same commission/per-share/dust split as an event reward, using the
    /// prover's separate stream debt so the two reward paths never corrupt
    /// each other.
    pub fn settle_stream(&mut self, globals: &mut GlobalLedger, now: Timestamp) {
        globals.emission.update(now, &mut globals.treasury);
        if self.state() != ProverState::Active {
            return;
        }
        let entitled = globals.emission.entitlement(self.effective_total());
        let accrued = entitled.saturating_sub(self.stream_debt);
        if accrued > 0 {
            self.distribute(accrued, &mut globals.treasury);
        }
        self.stream_debt = entitled;
    }

    /// Re-sync the global effective-stake total and this prover's stream
    /// debt after a mutation. `eff_before` is the prover's effective stake
    /// captured after `settle_stream` but before the mutation.
    pub(crate) fn sync_stream(&mut self, globals: &mut GlobalLedger, eff_before: Motes) {
        if self.state() != ProverState::Active {
            return;
        }
        let eff_after = self.effective_total();
        globals.emission.total_effective_active = globals
            .emission
            .total_effective_active
            .saturating_sub(eff_before)
            .saturating_add(eff_after);
        self.stream_debt = globals.emission.entitlement(eff_after);
    }

    /// Move this prover out of the Active streaming set. Assumes
    /// `settle_stream` already ran for `now`.
    pub(crate) fn leave_stream(&mut self, globals: &mut GlobalLedger) {
        globals.emission.total_effective_active = globals
            .emission
            .total_effective_active
            .saturating_sub(self.effective_total());
        self.stream_debt = 0;
    }

    /// Enter the Active streaming set at the accumulator's current value,
    /// so no retroactive accrual occurs. Assumes the pool was updated for
    /// `now`.
    pub(crate) fn join_stream(&mut self, globals: &mut GlobalLedger) {
        let eff = self.effective_total();
        globals.emission.total_effective_active = globals
            .emission
            .total_effective_active
            .saturating_add(eff);
        self.stream_debt = globals.emission.entitlement(eff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::MOTES_PER_SHO;

    #[test]
    fn test_update_before_funding_is_noop() {
        let mut pool = EmissionPool::new(10, 100);
        let mut treasury = Treasury::new();
        pool.update(200, &mut treasury);
        assert_eq!(pool.acc_per_effective, 0);
        assert_eq!(pool.last_update, 200);
    }

    #[test]
    fn test_idle_interval_preserves_budget() {
        let mut pool = EmissionPool::new(10, 100);
        let mut treasury = Treasury::new();
        pool.fund(1_000);
        // No active stake: the clock advances, the budget does not burn.
        pool.update(200, &mut treasury);
        assert_eq!(pool.budget_remaining, 1_000);
        assert_eq!(pool.acc_per_effective, 0);
        assert_eq!(pool.last_update, 200);
    }

    #[test]
    fn test_emission_rate_times_elapsed() {
        let mut pool = EmissionPool::new(10, 100);
        let mut treasury = Treasury::new();
        pool.fund(1_000_000);
        pool.total_effective_active = 500 * MOTES_PER_SHO;
        pool.update(160, &mut treasury);
        // 60 seconds at 10 motes/sec = 600 motes emitted
        assert_eq!(pool.budget_remaining, 1_000_000 - 600);
        let entitled = pool.entitlement(500 * MOTES_PER_SHO);
        assert_eq!(entitled + treasury.balance(), 600);
    }

    #[test]
    fn test_emission_capped_by_budget() {
        let mut pool = EmissionPool::new(10, 100);
        let mut treasury = Treasury::new();
        pool.fund(50);
        pool.total_effective_active = 1_000;
        pool.update(1_000_000, &mut treasury);
        assert_eq!(pool.budget_remaining, 0);
        let entitled = pool.entitlement(1_000);
        assert_eq!(entitled + treasury.balance(), 50);
    }

    #[test]
    fn test_clock_never_runs_backwards() {
        let mut pool = EmissionPool::new(10, 100);
        let mut treasury = Treasury::new();
        pool.fund(1_000);
        pool.total_effective_active = 1_000;
        pool.update(150, &mut treasury);
        let acc = pool.acc_per_effective;
        pool.update(140, &mut treasury);
        assert_eq!(pool.acc_per_effective, acc);
        assert_eq!(pool.last_update, 150);
    }

    #[test]
    fn test_set_rate_settles_first() {
        let mut pool = EmissionPool::new(10, 100);
        let mut treasury = Treasury::new();
        pool.fund(10_000);
        pool.total_effective_active = 1_000;
        pool.set_rate(100, 110, &mut treasury);
        // The first 10 seconds ran at the old rate of 10 motes/sec.
        assert_eq!(pool.budget_remaining, 10_000 - 100);
        assert_eq!(pool.rate_per_second, 100);
    }
}
