// crates/shoal-ledger/src/token.rs
//
// $SHO token units and fixed-point constants.
//
// The smallest unit of $SHO is the "mote". 1 SHO = 10^9 motes. All internal
// accounting uses integer motes to avoid floating-point precision issues in
// economic calculations; floats appear only in display helpers.
//
// Reference: ARCHITECTURE.md Section 3

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Number of motes in one SHO. 1 SHO = 10^9 motes.
pub const MOTES_PER_SHO: u128 = 1_000_000_000;

/// Maximum supply of $SHO in motes. 100,000,000 SHO * 10^9 motes/SHO.
pub const MAX_SUPPLY_MOTES: u128 = 100_000_000 * MOTES_PER_SHO;

/// Fixed-point unit for the per-prover scale factor and the reward
/// accumulators: 10^18. A scale of `SCALE_ONE` means 1.0 — no slashing
/// history.
pub const SCALE_ONE: u128 = 1_000_000_000_000_000_000;

/// Denominator for commission rates expressed in basis points.
pub const BPS_DENOM: u128 = 10_000;

/// Denominator for slash percentages expressed in parts per million.
pub const PPM_DENOM: u128 = 1_000_000;

/// Type alias for motes — the smallest unit of $SHO.
pub type Motes = u128;

/// Type alias for raw shares. Raw shares are invariant to slashing history;
/// only stake/unstake events change them.
pub type Shares = u128;

/// Unix timestamp in seconds, supplied by the caller on every time-gated
/// operation. The ledger keeps no internal clock.
pub type Timestamp = u64;

/// A $SHO token amount.
///
/// Wraps an amount in motes (the smallest denomination). Arithmetic is
/// performed in integer motes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Sho {
    /// Amount in motes (1 SHO = 10^9 motes).
    pub motes: Motes,
}

impl Sho {
    /// Create a Sho amount from a whole SHO value (as f64). Display-side
    /// helper; never used in ledger arithmetic.
    pub fn from_sho(amount: f64) -> Self {
        Self {
            motes: (amount * MOTES_PER_SHO as f64) as u128,
        }
    }

    /// Create a Sho amount from a mote value.
    pub fn from_motes(motes: Motes) -> Self {
        Self { motes }
    }

    /// Convert this amount to SHO as a floating-point value (display only).
    pub fn to_sho(&self) -> f64 {
        self.motes as f64 / MOTES_PER_SHO as f64
    }

    /// Returns zero SHO.
    pub fn zero() -> Self {
        Self { motes: 0 }
    }
}

impl Add for Sho {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            motes: self.motes + rhs.motes,
        }
    }
}

impl Sub for Sho {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            motes: self.motes.saturating_sub(rhs.motes),
        }
    }
}

impl fmt::Display for Sho {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.motes / MOTES_PER_SHO;
        let frac = self.motes % MOTES_PER_SHO;
        if frac == 0 {
            write!(f, "{} SHO", whole)
        } else {
            // Display up to 9 decimal places, trimming trailing zeros
            let frac_str = format!("{:09}", frac);
            let trimmed = frac_str.trim_end_matches('0');
            write!(f, "{}.{} SHO", whole, trimmed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motes_per_sho() {
        assert_eq!(MOTES_PER_SHO, 1_000_000_000);
    }

    #[test]
    fn test_max_supply() {
        assert_eq!(MAX_SUPPLY_MOTES, 100_000_000 * MOTES_PER_SHO);
    }

    #[test]
    fn test_from_sho() {
        assert_eq!(Sho::from_sho(1.0).motes, MOTES_PER_SHO);
        assert_eq!(Sho::from_sho(0.5).motes, 500_000_000);
    }

    #[test]
    fn test_to_sho() {
        let amount = Sho::from_motes(1_500_000_000);
        assert!((amount.to_sho() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_add_sub() {
        let a = Sho::from_sho(1.0);
        let b = Sho::from_sho(2.5);
        assert_eq!((a + b).motes, 3_500_000_000);
        assert_eq!((b - a).motes, 1_500_000_000);
    }

    #[test]
    fn test_sub_saturating() {
        let a = Sho::from_sho(1.0);
        let b = Sho::from_sho(2.0);
        assert_eq!((a - b).motes, 0);
    }

    #[test]
    fn test_display_whole() {
        assert_eq!(format!("{}", Sho::from_sho(42.0)), "42 SHO");
    }

    #[test]
    fn test_display_fractional() {
        assert_eq!(format!("{}", Sho::from_motes(1_500_000_000)), "1.5 SHO");
    }

    #[test]
    fn test_display_zero() {
        assert_eq!(format!("{}", Sho::zero()), "0 SHO");
    }
}
