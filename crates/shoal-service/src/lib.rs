// crates/shoal-service/src/lib.rs
//
// shoal-service: the concurrent, marketplace-facing surface of the Shoal
// staking ledger.
//
// The ledger engine in shoal-ledger is pure and synchronous; this crate
// supplies what a running deployment needs around it: per-prover
// serialization (one async mutex per prover account, a second lock for
// globals), TOML configuration, asset custody wiring with transfer-last
// ordering, structured logging, and read-only dashboard views.

pub mod config;
pub mod service;
pub mod shared;
pub mod vault;
pub mod views;

pub use config::ServiceConfig;
pub use service::StakingService;
pub use shared::SharedLedgerState;
pub use vault::InMemoryVault;
pub use views::{NetworkTotals, PendingUnstakeView, ProverOverview, StakerPosition};

/// Wall-clock Unix timestamp in seconds, for embedders that drive the
/// ledger in real time. Tests pass explicit timestamps instead.
pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
