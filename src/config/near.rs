//! NEAR connection settings
//!
//! Read from the environment (a `.env` file is loaded by the binary):
//!
//! ```bash
//! # Required
//! export NEAR_ADDRESS="alice.near"
//! export NEAR_WALLET_SECRET_KEY="ed25519:..."
//!
//! # Optional
//! export NEAR_NETWORK="mainnet"                    # or testnet
//! export NEAR_RPC_URL="https://rpc.mainnet.near.org"
//! ```

use crate::{Error, Result};
use secrecy::SecretString;

/// Environment variable names
pub mod env_vars {
    pub const NEAR_ADDRESS: &str = "NEAR_ADDRESS";
    pub const NEAR_WALLET_SECRET_KEY: &str = "NEAR_WALLET_SECRET_KEY";
    pub const NEAR_NETWORK: &str = "NEAR_NETWORK";
    pub const NEAR_RPC_URL: &str = "NEAR_RPC_URL";
}

/// Defaults applied when optional settings are absent
mod defaults {
    pub const NETWORK: &str = "mainnet";
    pub const MAINNET_RPC: &str = "https://rpc.mainnet.near.org";
    pub const TESTNET_RPC: &str = "https://rpc.testnet.near.org";
}

/// Account and connection settings for NEAR
#[derive(Debug)]
pub struct NearConfig {
    pub account_id: String,
    pub secret_key: SecretString,
    pub network_id: String,
    pub rpc_url: String,
}

impl NearConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key/value source
    ///
    /// Every missing required key is reported at once.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let account_id = get(env_vars::NEAR_ADDRESS);
        let secret_key = get(env_vars::NEAR_WALLET_SECRET_KEY);

        let missing: Vec<&str> = [
            (env_vars::NEAR_ADDRESS, account_id.is_none()),
            (env_vars::NEAR_WALLET_SECRET_KEY, secret_key.is_none()),
        ]
        .into_iter()
        .filter_map(|(key, absent)| absent.then_some(key))
        .collect();

        let (Some(account_id), Some(secret_key)) = (account_id, secret_key) else {
            return Err(Error::Config(format!(
                "Missing required settings: {}",
                missing.join(", ")
            )));
        };

        let network_id = get(env_vars::NEAR_NETWORK).unwrap_or_else(|| {
            tracing::debug!("NEAR_NETWORK not set, defaulting to {}", defaults::NETWORK);
            defaults::NETWORK.to_string()
        });

        let rpc_url = match get(env_vars::NEAR_RPC_URL) {
            Some(url) => url,
            None => match network_id.as_str() {
                "testnet" => defaults::TESTNET_RPC.to_string(),
                "mainnet" => defaults::MAINNET_RPC.to_string(),
                other => {
                    return Err(Error::Config(format!(
                        "NEAR_RPC_URL is required for network '{}'",
                        other
                    )))
                }
            },
        };
        url::Url::parse(&rpc_url)
            .map_err(|e| Error::Config(format!("Invalid NEAR_RPC_URL '{}': {}", rpc_url, e)))?;

        Ok(Self {
            account_id,
            secret_key: SecretString::from(secret_key),
            network_id,
            rpc_url,
        })
    }
}
