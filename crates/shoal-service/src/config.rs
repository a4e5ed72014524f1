// crates/shoal-service/src/config.rs
//
// Runtime configuration for the staking ledger service.
// Loaded from a TOML file or populated with sensible defaults.

use serde::Deserialize;
use std::fs;

use shoal_core::{account_from_hex, AccountId, LedgerError};
use shoal_ledger::params::MAX_UNSTAKE_DELAY_SECS;
use shoal_ledger::{LedgerParams, Motes};

/// Runtime configuration for the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Hex-encoded coldkey of the service owner (parameter updates,
    /// treasury withdrawals, administrative state transitions).
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Hex-encoded coldkey holding the slashing capability. Normally the
    /// marketplace settlement component.
    #[serde(default = "default_slashing_authority")]
    pub slashing_authority: String,

    /// Seconds between an unstake request and its earliest completion.
    #[serde(default = "default_unstake_delay_secs")]
    pub unstake_delay_secs: u64,

    /// Minimum initial self-stake for new prover registrations, in motes.
    #[serde(default)]
    pub global_min_self_stake: Motes,

    /// Streaming emission rate, in motes per second.
    #[serde(default)]
    pub emission_rate_per_second: Motes,

    /// Maximum single slash event, in parts per million.
    #[serde(default = "default_max_slash_ppm")]
    pub max_slash_ppm: u32,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_owner() -> String {
    "00".repeat(32)
}

fn default_slashing_authority() -> String {
    "00".repeat(32)
}

fn default_unstake_delay_secs() -> u64 {
    shoal_ledger::params::DEFAULT_UNSTAKE_DELAY_SECS
}

fn default_max_slash_ppm() -> u32 {
    shoal_ledger::params::DEFAULT_MAX_SLASH_PPM
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            slashing_authority: default_slashing_authority(),
            unstake_delay_secs: default_unstake_delay_secs(),
            global_min_self_stake: 0,
            emission_rate_per_second: 0,
            max_slash_ppm: default_max_slash_ppm(),
            log_level: default_log_level(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &str) -> Result<Self, LedgerError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| LedgerError::InvalidState(format!("Cannot read config {}: {}", path, e)))?;
        let config: ServiceConfig = toml::from_str(&contents)
            .map_err(|e| LedgerError::Serialization(format!("Cannot parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field combinations that serde cannot express.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.unstake_delay_secs > MAX_UNSTAKE_DELAY_SECS {
            return Err(LedgerError::InvalidState(format!(
                "unstake_delay_secs {} exceeds the {} second maximum",
                self.unstake_delay_secs, MAX_UNSTAKE_DELAY_SECS
            )));
        }
        self.owner_key()?;
        self.slashing_authority_key()?;
        Ok(())
    }

    /// The owner coldkey, decoded.
    pub fn owner_key(&self) -> Result<AccountId, LedgerError> {
        account_from_hex(&self.owner)
    }

    /// The slashing-authority coldkey, decoded.
    pub fn slashing_authority_key(&self) -> Result<AccountId, LedgerError> {
        account_from_hex(&self.slashing_authority)
    }

    /// Ledger parameters derived from this configuration.
    pub fn ledger_params(&self) -> LedgerParams {
        LedgerParams {
            unstake_delay_secs: self.unstake_delay_secs,
            global_min_self_stake: self.global_min_self_stake,
            max_slash_ppm: self.max_slash_ppm,
            ..LedgerParams::default()
        }
    }
}
