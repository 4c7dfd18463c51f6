//! Shared asset registry
//!
//! Centralizes token metadata (contract ids, decimals, relay identifiers) so the
//! quote client, commitment signer and settlement client agree on every token.
//!
//! This module is the single source of truth for token information.

use crate::{Error, Result};
use std::collections::HashMap;

/// Namespace prefix the solver relay uses for NEP-141 fungible tokens
pub const NEP141_PREFIX: &str = "nep141";

/// Relay identifier of the native NEAR token
pub const NATIVE_ASSET_ID: &str = "near";

/// Token metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    /// Canonical uppercase symbol (e.g., "ZEC", "USDC")
    pub symbol: &'static str,
    /// NEP-141 contract account holding balances for this token
    pub contract_id: &'static str,
    /// Number of decimals
    pub decimals: u32,
    /// Omni-bridge representation, when the token is bridged from another chain
    pub bridge_id: Option<&'static str>,
    /// Whether this is the chain's native token (wrapped by `contract_id`)
    pub is_native: bool,
}

impl Asset {
    /// Create a fungible token entry
    pub const fn fungible(symbol: &'static str, contract_id: &'static str, decimals: u32) -> Self {
        Self {
            symbol,
            contract_id,
            decimals,
            bridge_id: None,
            is_native: false,
        }
    }

    /// Create a bridged fungible token entry
    pub const fn bridged(
        symbol: &'static str,
        contract_id: &'static str,
        bridge_id: &'static str,
        decimals: u32,
    ) -> Self {
        Self {
            symbol,
            contract_id,
            decimals,
            bridge_id: Some(bridge_id),
            is_native: false,
        }
    }

    /// Create the native token entry; `wrap_contract` is its NEP-141 wrapper
    pub const fn native(symbol: &'static str, wrap_contract: &'static str, decimals: u32) -> Self {
        Self {
            symbol,
            contract_id: wrap_contract,
            decimals,
            bridge_id: None,
            is_native: true,
        }
    }

    /// Identifier the solver relay and token diffs use for this asset
    pub fn asset_identifier(&self) -> String {
        if self.is_native {
            NATIVE_ASSET_ID.to_string()
        } else {
            nep141_identifier(self.contract_id)
        }
    }
}

fn nep141_identifier(contract_id: &str) -> String {
    format!("{}:{}", NEP141_PREFIX, contract_id)
}

/// Well-known NEAR contract accounts
pub mod contracts {
    pub const ZEC: &str = "zec-token.near";
    pub const USDC: &str = "a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48.factory.bridge.near";
    pub const USDC_OMFT: &str = "eth-0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48.omft.near";
    pub const WRAP_NEAR: &str = "wrap.near";
}

/// Asset registry providing lookups by symbol
#[derive(Debug, Clone)]
pub struct AssetRegistry {
    /// Assets keyed by uppercase symbol
    assets: HashMap<&'static str, Asset>,
    /// Symbols in display order
    order: Vec<&'static str>,
}

impl AssetRegistry {
    /// Create a new registry with all known tokens
    pub fn new() -> Self {
        Self::from_assets([
            Asset::fungible("ZEC", contracts::ZEC, 8),
            Asset::bridged("USDC", contracts::USDC, contracts::USDC_OMFT, 6),
            Asset::native("NEAR", contracts::WRAP_NEAR, 24),
        ])
    }

    /// Build a registry from an explicit asset list
    pub fn from_assets(assets: impl IntoIterator<Item = Asset>) -> Self {
        let mut map = HashMap::new();
        let mut order = Vec::new();
        for asset in assets {
            if map.insert(asset.symbol, asset).is_none() {
                order.push(asset.symbol);
            }
        }
        Self { assets: map, order }
    }

    /// Get an asset by symbol (case-insensitive)
    pub fn lookup(&self, symbol: &str) -> Option<&Asset> {
        self.assets.get(symbol.trim().to_uppercase().as_str())
    }

    /// Get an asset by symbol, failing with `UnsupportedAsset` when unknown
    pub fn require(&self, symbol: &str) -> Result<&Asset> {
        self.lookup(symbol).ok_or_else(|| Error::UnsupportedAsset {
            symbol: symbol.to_string(),
            supported: self.supported_symbols(),
        })
    }

    /// Relay identifier for a symbol
    ///
    /// Symbols outside the registry are treated as a raw contract account under
    /// the NEP-141 namespace so tokens missing from the static table can still
    /// be quoted.
    pub fn asset_identifier_for(&self, symbol: &str) -> String {
        match self.lookup(symbol) {
            Some(asset) => asset.asset_identifier(),
            None => nep141_identifier(symbol),
        }
    }

    /// Iterate assets in display order
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.order.iter().filter_map(|symbol| self.assets.get(symbol))
    }

    /// Comma separated list of supported symbols
    pub fn supported_symbols(&self) -> String {
        self.order.join(", ")
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global asset registry (lazy initialized)
static REGISTRY: std::sync::OnceLock<AssetRegistry> = std::sync::OnceLock::new();

/// Get the global asset registry
pub fn registry() -> &'static AssetRegistry {
    REGISTRY.get_or_init(AssetRegistry::new)
}
