//! Chain account capability
//!
//! The swap core only ever sees this narrow interface: an identity, a way to
//! send a function call, a way to run a view call, and the account's signer.
//! Nonce handling and transaction serialization belong to the implementation.

use super::signer::MessageSigner;
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Deposit required by `ft_transfer_call` and other payable NEP-141 methods
pub const ONE_YOCTO: u128 = 1;

/// One teragas
pub const TGAS: u64 = 1_000_000_000_000;

/// A state-changing contract call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    pub contract_id: String,
    pub method_name: String,
    pub args: Value,
    pub gas: u64,
    /// Attached deposit in yoctoNEAR
    pub deposit: u128,
}

impl FunctionCall {
    pub fn new(contract_id: impl Into<String>, method_name: impl Into<String>, args: Value) -> Self {
        Self {
            contract_id: contract_id.into(),
            method_name: method_name.into(),
            args,
            gas: 300 * TGAS,
            deposit: 0,
        }
    }

    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = gas;
        self
    }

    pub fn deposit(mut self, deposit: u128) -> Self {
        self.deposit = deposit;
        self
    }
}

/// Account able to call contracts on the settlement chain
#[async_trait]
pub trait ChainAccount: Send + Sync {
    /// Account that signs and pays for calls
    fn account_id(&self) -> &str;

    /// Network the account lives on (e.g. "mainnet")
    fn network_id(&self) -> &str;

    /// Signing capability bound to this account
    fn signer(&self) -> &dyn MessageSigner;

    /// Sign and submit a function call, returning the execution outcome
    async fn call(&self, call: FunctionCall) -> Result<Value>;

    /// Run a read-only view call and return its decoded JSON result
    async fn view(&self, contract_id: &str, method_name: &str, args: Value) -> Result<Value>;
}
