// crates/shoal-core/src/identity.rs

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// A 32-byte account identifier. Provers and stakers are both keyed by an
/// `AccountId`; for a prover this is its coldkey.
pub type AccountId = [u8; 32];

/// Identity of a prover node on the Shoal network.
///
/// Follows the coldkey/hotkey pattern:
/// - **Coldkey**: Long-term staking identity, kept offline. Owns bonded
///   funds and receives rewards; the ledger stores accounts under it.
/// - **Hotkey**: Operational key the prover runs with. Signs job
///   acknowledgements and proofs.
///
/// Compromising the hotkey does not put staked funds at risk; only the
/// coldkey can unstake or withdraw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProverIdentity {
    /// Coldkey public key. Long-term staking identity.
    pub coldkey: AccountId,
    /// Hotkey public key. Operational identity.
    pub hotkey: AccountId,
}

/// Render an account id as lowercase hex (no prefix).
pub fn account_to_hex(id: &AccountId) -> String {
    id.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Parse a 64-character hex string into an account id.
pub fn account_from_hex(s: &str) -> Result<AccountId, LedgerError> {
    let s = s.trim_start_matches("0x");
    if s.len() != 64 || !s.is_ascii() {
        return Err(LedgerError::Serialization(format!(
            "Account id must be 64 hex characters, got {}",
            s.len()
        )));
    }
    let mut out = [0u8; 32];
    for (i, byte) in out.iter_mut().enumerate() {
        let chunk = &s[i * 2..i * 2 + 2];
        *byte = u8::from_str_radix(chunk, 16).map_err(|e| {
            LedgerError::Serialization(format!("Invalid hex in account id: {}", e))
        })?;
    }
    Ok(out)
}
