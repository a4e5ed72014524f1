// crates/shoal-ledger/src/lib.rs
//
// shoal-ledger: delegated staking, rewards, slashing, and emission
// accounting for the Shoal Protocol.
//
// One ProverAccount aggregate per registered prover carries the dual
// share/scale-factor model: stake is stored as raw shares, a prover-wide
// scale factor converts them to effective motes, and a single accumulator
// distributes rewards. Stake, reward, and slash operations are all O(1) in
// the staker count; no code path here iterates stakers for accounting.
//
// Reference: ARCHITECTURE.md Sections 3-10

pub mod account;
pub mod emission;
pub mod globals;
pub mod math;
pub mod params;
pub mod rewards;
pub mod slashing;
pub mod staking;
pub mod token;
pub mod treasury;
pub mod unstake;

// Re-exports for ergonomic access from downstream crates.
// Usage: `use shoal_ledger::ProverAccount;`

pub use account::{
    MinSelfStakeUpdate, PendingUnstake, ProverAccount, ProverState, StakeRecord,
};
pub use emission::EmissionPool;
pub use globals::GlobalLedger;
pub use params::LedgerParams;
pub use rewards::RewardBreakdown;
pub use token::{
    Motes, Shares, Sho, Timestamp, BPS_DENOM, MAX_SUPPLY_MOTES, MOTES_PER_SHO, PPM_DENOM,
    SCALE_ONE,
};
pub use treasury::Treasury;
