// crates/shoal-core/src/lib.rs
//
// shoal-core: Core types, traits, and error definitions for the Shoal
// Protocol staking ledger.
//
// This is the leaf crate that the other crates in the workspace depend on.
// It defines account identities, the ledger error taxonomy, and the trait
// interfaces through which the proof marketplace drives the ledger.

pub mod error;
pub mod identity;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use shoal_core::LedgerError;`

pub use error::LedgerError;
pub use identity::{account_from_hex, account_to_hex, AccountId, ProverIdentity};
pub use traits::{Custody, MarketplaceLedger};
