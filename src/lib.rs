//! NEAR Intents swap client
//!
//! Swaps fungible tokens through the NEAR Intents solver relay:
//! - Request quotes for a trade and pick the best one
//! - Sign a short-lived token-diff commitment for it
//! - Publish the signed commitment to the relay
//!
//! Direct settlement-contract calls (deposits, key and storage registration,
//! balance checks) are available through [`intents::SettlementClient`].
//!
//! # Security Model
//!
//! - Private keys never leave [`wallet::KeyPairSigner`]
//! - Every user action is validated against the asset registry before any
//!   network call and recorded in the audit trail

pub mod amount;
pub mod config;
pub mod intents;
pub mod interceptors;
pub mod swap;
pub mod tokens;
pub mod tools;
pub mod wallet;

mod error;

// Re-export commonly used types
pub use config::{Config, NearConfig};
pub use error::{Error, Result};
pub use swap::{SwapExecutor, SwapOutcome, SwapRequest};
pub use tokens::{registry, Asset, AssetRegistry};
