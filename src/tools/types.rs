//! Structured action inputs and replies
//!
//! Inputs arrive already parsed into fields but not yet trusted. Each one is
//! validated against the asset registry before any network call is made.

use crate::amount::parse_amount;
use crate::swap::SwapRequest;
use crate::tokens::AssetRegistry;
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Human-readable status plus a structured payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionReply {
    pub success: bool,
    pub text: String,
    #[serde(default)]
    pub data: Value,
}

impl ActionReply {
    pub fn success(text: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            text: text.into(),
            data,
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            success: false,
            text: text.into(),
            data: Value::Null,
        }
    }
}

/// Parse a strictly positive amount
pub fn positive_amount(raw: &str) -> Result<Decimal> {
    match parse_amount(raw) {
        Ok(amount) if amount > Decimal::ZERO => Ok(amount),
        _ => Err(Error::InvalidAmount(format!(
            "{}. Please provide a positive number.",
            raw.trim()
        ))),
    }
}

/// Swap (or quote) request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapInput {
    pub input_token: String,
    pub output_token: String,
    pub amount: String,
}

impl SwapInput {
    pub fn validate(&self, registry: &AssetRegistry) -> Result<SwapRequest> {
        let asset_in = registry.require(self.input_token.trim())?.symbol;
        let asset_out = registry.require(self.output_token.trim())?.symbol;
        if asset_in == asset_out {
            return Err(Error::InvalidArgument(format!(
                "Input and output token are both {}",
                asset_in
            )));
        }
        Ok(SwapRequest {
            asset_in: asset_in.to_string(),
            asset_out: asset_out.to_string(),
            amount_in: positive_amount(&self.amount)?,
        })
    }
}

/// Validated deposit
#[derive(Debug, Clone, PartialEq)]
pub struct DepositRequest {
    pub symbol: &'static str,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositInput {
    pub token: String,
    pub amount: String,
}

impl DepositInput {
    pub fn validate(&self, registry: &AssetRegistry) -> Result<DepositRequest> {
        let asset = registry.require(&self.token)?;
        Ok(DepositRequest {
            symbol: asset.symbol,
            amount: positive_amount(&self.amount)?,
        })
    }
}

/// Balance query; no token means every registered asset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceInput {
    #[serde(default)]
    pub token: Option<String>,
}

impl BalanceInput {
    pub fn validate(&self, registry: &AssetRegistry) -> Result<Option<&'static str>> {
        match self.token.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(token) => Ok(Some(registry.require(token)?.symbol)),
        }
    }
}
