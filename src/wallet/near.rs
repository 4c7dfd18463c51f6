//! NEAR account backed by JSON-RPC views and the `near` CLI
//!
//! View calls go straight to the RPC node. Change calls are signed and sent by
//! `near contract call-function as-transaction ... sign-with-keychain`, so
//! nonce and block-hash bookkeeping stays with the CLI. The account's full
//! access key must be in the CLI's keychain (`near account import-account`);
//! the in-process key never appears on a child process command line.

use super::account::{ChainAccount, FunctionCall, TGAS};
use super::signer::{KeyPairSigner, MessageSigner};
use crate::config::NearConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, error};

/// Binary used for change calls
const NEAR_CLI: &str = "near";

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: Option<CallResult>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CallResult {
    #[serde(default)]
    result: Vec<u8>,
    /// Contract panics surface here rather than in the envelope's `error`
    error: Option<String>,
}

/// NEAR account with an in-process key
#[derive(Clone)]
pub struct NearRpcAccount {
    client: Client,
    rpc_url: String,
    account_id: String,
    network_id: String,
    signer: Arc<KeyPairSigner>,
}

impl NearRpcAccount {
    pub fn new(
        rpc_url: impl Into<String>,
        account_id: impl Into<String>,
        network_id: impl Into<String>,
        signer: Arc<KeyPairSigner>,
    ) -> Self {
        Self {
            client: Client::new(),
            rpc_url: rpc_url.into(),
            account_id: account_id.into(),
            network_id: network_id.into(),
            signer,
        }
    }

    /// Build from loaded connection settings
    pub fn from_config(config: &NearConfig) -> Result<Self> {
        let signer = KeyPairSigner::from_secret(&config.secret_key)?;
        Ok(Self::new(
            config.rpc_url.clone(),
            config.account_id.clone(),
            config.network_id.clone(),
            Arc::new(signer),
        ))
    }

    /// Arguments for `near contract call-function as-transaction`
    fn cli_args(&self, call: &FunctionCall) -> Result<Vec<String>> {
        let args_json = serde_json::to_string(&call.args)?;
        Ok(vec![
            "contract".to_string(),
            "call-function".to_string(),
            "as-transaction".to_string(),
            call.contract_id.clone(),
            call.method_name.clone(),
            "json-args".to_string(),
            args_json,
            "prepaid-gas".to_string(),
            format_gas(call.gas),
            "attached-deposit".to_string(),
            format!("{} yoctoNEAR", call.deposit),
            "sign-as".to_string(),
            self.account_id.clone(),
            "network-config".to_string(),
            self.network_id.clone(),
            "sign-with-keychain".to_string(),
            "send".to_string(),
        ])
    }
}

impl std::fmt::Debug for NearRpcAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NearRpcAccount")
            .field("rpc_url", &self.rpc_url)
            .field("account_id", &self.account_id)
            .field("network_id", &self.network_id)
            .field("signer", &self.signer)
            .finish()
    }
}

/// Render gas as the CLI expects it, e.g. `300 Tgas`
fn format_gas(gas: u64) -> String {
    let tgas = Decimal::from_i128_with_scale(gas as i128, TGAS.ilog10()).normalize();
    format!("{} Tgas", tgas)
}

/// Pull the transaction hash out of CLI output, if it printed one
fn parse_transaction_id(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (_, rest) = line.split_once("Transaction ID:")?;
        rest.split_whitespace().next().map(str::to_string)
    })
}

#[async_trait]
impl ChainAccount for NearRpcAccount {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    fn network_id(&self) -> &str {
        &self.network_id
    }

    fn signer(&self) -> &dyn MessageSigner {
        self.signer.as_ref()
    }

    async fn call(&self, call: FunctionCall) -> Result<Value> {
        debug!(
            contract = %call.contract_id,
            method = %call.method_name,
            deposit = %call.deposit,
            "Sending function call"
        );

        let output = Command::new(NEAR_CLI)
            .args(self.cli_args(&call)?)
            .output()
            .await
            .map_err(|e| {
                Error::chain_call(
                    &call.contract_id,
                    &call.method_name,
                    format!("failed to execute near CLI, ensure it is installed: {}", e),
                )
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            error!(
                contract = %call.contract_id,
                method = %call.method_name,
                "Function call failed"
            );
            return Err(Error::chain_call(
                &call.contract_id,
                &call.method_name,
                format!("stdout: {} stderr: {}", stdout.trim(), stderr.trim()),
            ));
        }

        let transaction_id =
            parse_transaction_id(&stdout).or_else(|| parse_transaction_id(&stderr));
        Ok(json!({
            "transaction_id": transaction_id,
            "output": stdout.trim(),
        }))
    }

    async fn view(&self, contract_id: &str, method_name: &str, args: Value) -> Result<Value> {
        let args_base64 = STANDARD.encode(serde_json::to_vec(&args)?);
        let request = json!({
            "jsonrpc": "2.0",
            "id": "dontcare",
            "method": "query",
            "params": {
                "request_type": "call_function",
                "finality": "final",
                "account_id": contract_id,
                "method_name": method_name,
                "args_base64": args_base64
            }
        });

        let envelope: RpcEnvelope = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::chain_call(contract_id, method_name, e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::chain_call(contract_id, method_name, e.to_string()))?;

        if let Some(err) = envelope.error {
            return Err(Error::chain_call(contract_id, method_name, err.to_string()));
        }
        let result = envelope.result.ok_or_else(|| {
            Error::chain_call(contract_id, method_name, "RPC response missing 'result'")
        })?;
        if let Some(err) = result.error {
            return Err(Error::chain_call(contract_id, method_name, err));
        }
        if result.result.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&result.result)?)
    }
}
