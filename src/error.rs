//! Error types for the intents swap client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Token '{symbol}' is not supported. Supported tokens: {supported}")]
    UnsupportedAsset { symbol: String, supported: String },

    #[error("No valid swap options available from solver relay")]
    NoQuoteAvailable,

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Failed to publish intent: {0}")]
    Publish(String),

    #[error("Contract call {contract}.{method} failed: {reason}")]
    ChainCall {
        contract: String,
        method: String,
        reason: String,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Swap cancelled while {0}")]
    Cancelled(&'static str),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn chain_call(contract: &str, method: &str, reason: impl Into<String>) -> Self {
        Error::ChainCall {
            contract: contract.to_string(),
            method: method.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
