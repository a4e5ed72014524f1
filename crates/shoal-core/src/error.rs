// crates/shoal-core/src/error.rs

use thiserror::Error;

/// Ledger-wide error types for the Shoal Protocol.
///
/// Every public ledger operation validates its inputs and the account's
/// lifecycle state before mutating anything, so an `Err` always means the
/// ledger is unchanged. Nothing is retried internally; callers may retry
/// after the triggering condition clears (e.g. waiting out an unstake
/// delay).
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Operation not valid for the account's current lifecycle state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Referenced prover or stake record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A zero amount was supplied where a positive amount is required.
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// The staker holds fewer shares than the operation requires.
    #[error("Insufficient stake: requested {requested} motes, available {available} motes")]
    InsufficientStake { requested: u128, available: u128 },

    /// The prover's effective self-stake would land in (0, minimum).
    /// A full exit to exactly zero is always permitted.
    #[error("Self-stake of {remaining} motes would fall below the minimum of {minimum} motes")]
    BelowMinSelfStake { remaining: u128, minimum: u128 },

    /// The per-staker pending-unstake queue is full.
    #[error("Pending unstake limit of {limit} requests reached")]
    TooManyPendingUnstakes { limit: usize },

    /// Unstake requests exist but none has served its delay yet.
    #[error("No unstake request has completed its delay")]
    UnstakeNotReady,

    /// No pending unstake request exists for this staker.
    #[error("No pending unstake request")]
    NoUnstakeRequest,

    /// The slash would breach the hard floor or exceeds the configured
    /// maximum for a single event. Slashes fail explicitly rather than
    /// clamping.
    #[error("Slash rejected: {0}")]
    SlashTooHigh(String),

    /// Commission rate above 100% (10,000 basis points).
    #[error("Invalid commission rate: {0} bps exceeds 10000")]
    InvalidCommissionRate(u16),

    /// Withdrawal requested with nothing settled or pending.
    #[error("No rewards available")]
    NoRewardsAvailable,

    /// The caller lacks the capability this operation requires
    /// (slashing authority, owner).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Asset custody failure (transfer in/out of ledger custody).
    #[error("Custody error: {0}")]
    Custody(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}
