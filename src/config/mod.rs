//! Configuration for the intents swap client

pub mod near;

use crate::intents::relay::DEFAULT_RELAY_URL;
use crate::tokens::contracts;
use crate::wallet::TGAS;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// Re-export NEAR connection config
pub use near::NearConfig;

/// Settlement contract that verifies signed intents
pub const DEFAULT_VERIFYING_CONTRACT: &str = "intents.near";

/// Validity window of a signed commitment (milliseconds)
pub const DEFAULT_COMMITMENT_TTL_MS: u64 = 120_000;

/// Deposit covering one account's storage on a NEP-141 contract (yoctoNEAR)
pub const DEFAULT_STORAGE_DEPOSIT_YOCTO: u128 = 1_250_000_000_000_000_000_000;

/// Main configuration
///
/// Built once and handed to each component by value; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Solver relay JSON-RPC endpoint
    pub relay_url: String,
    /// Settlement contract commitments are addressed to
    pub verifying_contract: String,
    /// Contract wrapping the native token into NEP-141
    pub wrap_contract: String,
    /// Gas attached to every change call
    pub gas: u64,
    /// Minimum quote validity requested from solvers (milliseconds)
    pub min_deadline_ms: u64,
    /// Validity window of signed commitments (milliseconds)
    pub commitment_ttl_ms: u64,
    /// `storage_deposit` amount for token registration (yoctoNEAR, decimal string)
    pub storage_deposit_yocto: String,
    /// Path to audit log file
    pub audit_log_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            verifying_contract: DEFAULT_VERIFYING_CONTRACT.to_string(),
            wrap_contract: contracts::WRAP_NEAR.to_string(),
            gas: 300 * TGAS,
            min_deadline_ms: crate::intents::types::DEFAULT_MIN_DEADLINE_MS,
            commitment_ttl_ms: DEFAULT_COMMITMENT_TTL_MS,
            storage_deposit_yocto: DEFAULT_STORAGE_DEPOSIT_YOCTO.to_string(),
            audit_log_path: Some("audit.jsonl".to_string()),
        }
    }
}

impl Config {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no component could work with
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.relay_url)
            .map_err(|e| Error::Config(format!("Invalid relay_url '{}': {}", self.relay_url, e)))?;
        if self.verifying_contract.is_empty() {
            return Err(Error::Config("verifying_contract must not be empty".to_string()));
        }
        if self.gas == 0 {
            return Err(Error::Config("gas must be positive".to_string()));
        }
        if self.commitment_ttl_ms == 0 {
            return Err(Error::Config("commitment_ttl_ms must be positive".to_string()));
        }
        self.storage_deposit()?;
        Ok(())
    }

    /// Parsed `storage_deposit_yocto`
    pub fn storage_deposit(&self) -> Result<u128> {
        self.storage_deposit_yocto.parse().map_err(|_| {
            Error::Config(format!(
                "Invalid storage_deposit_yocto '{}'",
                self.storage_deposit_yocto
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_settlement_conventions() {
        let config = Config::default();
        assert_eq!(config.verifying_contract, "intents.near");
        assert_eq!(config.wrap_contract, "wrap.near");
        assert_eq!(config.gas, 300_000_000_000_000);
        assert_eq!(config.commitment_ttl_ms, 120_000);
        assert_eq!(config.storage_deposit().unwrap(), 1_250_000_000_000_000_000_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_takes_defaults() {
        let parsed: Config = serde_json::from_value(serde_json::json!({
            "relay_url": "http://localhost:3000/rpc",
            "audit_log_path": null
        }))
        .expect("parse config");
        assert_eq!(parsed.relay_url, "http://localhost:3000/rpc");
        assert_eq!(parsed.audit_log_path, None);
        assert_eq!(parsed.verifying_contract, DEFAULT_VERIFYING_CONTRACT);
    }

    #[test]
    fn from_file_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"relay_url": "not a url"}}"#).unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"gas": 100000000000000}}"#).unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.gas, 100 * TGAS);
    }

    #[test]
    fn rejects_bad_storage_deposit() {
        let config = Config {
            storage_deposit_yocto: "lots".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
