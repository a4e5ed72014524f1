// crates/shoal-ledger/src/params.rs
//
// Owner-controlled ledger parameters. All of these gate effects only; no
// internal algorithm depends on being able to change them.
//
// Reference: ARCHITECTURE.md Section 12

use serde::{Deserialize, Serialize};

use shoal_core::LedgerError;

use crate::token::{Motes, Timestamp, SCALE_ONE};

/// Upper bound on the unstake delay: 30 days.
pub const MAX_UNSTAKE_DELAY_SECS: u64 = 30 * 24 * 3600;

/// Default unstake delay: 7 days.
pub const DEFAULT_UNSTAKE_DELAY_SECS: u64 = 7 * 24 * 3600;

/// Default bound on pending unstake requests per staker per prover.
pub const DEFAULT_MAX_PENDING_UNSTAKES: usize = 10;

/// Default hard floor for the scale factor: 20%. Once a prover's scale sits
/// at or below this, further slashing is rejected.
pub const DEFAULT_SCALE_HARD_FLOOR: u128 = SCALE_ONE / 5;

/// Default soft threshold for the scale factor: 40%. A slash that lands the
/// scale below this auto-deactivates the prover.
pub const DEFAULT_SCALE_SOFT_FLOOR: u128 = SCALE_ONE * 2 / 5;

/// Default maximum for a single slash event: 50% (in ppm).
pub const DEFAULT_MAX_SLASH_PPM: u32 = 500_000;

/// Owner-controlled ledger parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerParams {
    /// Seconds between an unstake request and its earliest completion.
    pub unstake_delay_secs: Timestamp,
    /// Minimum initial self-stake for new prover registrations (in motes).
    /// Changing this never affects already-registered provers.
    pub global_min_self_stake: Motes,
    /// Scale floor below which no further slashing is accepted (1e18 units).
    pub scale_hard_floor: u128,
    /// Scale threshold below which a prover is auto-deactivated (1e18 units).
    pub scale_soft_floor: u128,
    /// Maximum single slash event, in parts per million.
    pub max_slash_ppm: u32,
    /// Maximum pending unstake requests per staker per prover.
    pub max_pending_unstakes: usize,
}

impl Default for LedgerParams {
    fn default() -> Self {
        Self {
            unstake_delay_secs: DEFAULT_UNSTAKE_DELAY_SECS,
            global_min_self_stake: 0,
            scale_hard_floor: DEFAULT_SCALE_HARD_FLOOR,
            scale_soft_floor: DEFAULT_SCALE_SOFT_FLOOR,
            max_slash_ppm: DEFAULT_MAX_SLASH_PPM,
            max_pending_unstakes: DEFAULT_MAX_PENDING_UNSTAKES,
        }
    }
}

impl LedgerParams {
    /// Update the unstake delay. Delays above 30 days are rejected.
    pub fn set_unstake_delay(&mut self, secs: Timestamp) -> Result<(), LedgerError> {
        if secs > MAX_UNSTAKE_DELAY_SECS {
            return Err(LedgerError::InvalidState(format!(
                "Unstake delay of {} seconds exceeds the {} second maximum",
                secs, MAX_UNSTAKE_DELAY_SECS
            )));
        }
        self.unstake_delay_secs = secs;
        Ok(())
    }

    /// Update the minimum self-stake for future registrations.
    pub fn set_global_min_self_stake(&mut self, motes: Motes) {
        self.global_min_self_stake = motes;
    }

    /// Sanity-check the floor ordering: 0 < hard < soft <= 1.0.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.scale_hard_floor == 0
            || self.scale_hard_floor >= self.scale_soft_floor
            || self.scale_soft_floor > SCALE_ONE
        {
            return Err(LedgerError::InvalidState(format!(
                "Scale floors must satisfy 0 < hard ({}) < soft ({}) <= {}",
                self.scale_hard_floor, self.scale_soft_floor, SCALE_ONE
            )));
        }
        if self.max_slash_ppm as u128 >= crate::token::PPM_DENOM {
            return Err(LedgerError::InvalidState(
                "Maximum single slash must be below 100%".to_string(),
            ));
        }
        if self.max_pending_unstakes == 0 {
            return Err(LedgerError::InvalidState(
                "Pending unstake bound must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
