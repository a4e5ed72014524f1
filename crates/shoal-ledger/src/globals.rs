// crates/shoal-ledger/src/globals.rs
//
// Shared global ledger state: parameters, treasury, and the streaming
// emission pool. Touched by every prover operation but mutated far less
// often than per-prover state; the service layer guards it with a single
// lock acquired after the prover's own.
//
// Reference: ARCHITECTURE.md Section 11

use serde::{Deserialize, Serialize};

use crate::emission::EmissionPool;
use crate::params::LedgerParams;
use crate::token::{Motes, Timestamp};
use crate::treasury::Treasury;

/// Global ledger state shared across all provers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalLedger {
    /// Owner-controlled parameters.
    pub params: LedgerParams,
    /// The protocol treasury (dust, slashed value).
    pub treasury: Treasury,
    /// Streaming emission pool and its accumulator.
    pub emission: EmissionPool,
}

impl GlobalLedger {
    /// Create global state with the given parameters and emission rate,
    /// anchoring the emission clock at `now`.
    pub fn new(params: LedgerParams, emission_rate_per_second: Motes, now: Timestamp) -> Self {
        Self {
            params,
            treasury: Treasury::new(),
            emission: EmissionPool::new(emission_rate_per_second, now),
        }
    }
}

impl Default for GlobalLedger {
    fn default() -> Self {
        Self::new(LedgerParams::default(), 0, 0)
    }
}
