//! On-chain settlement client
//!
//! Direct calls to the settlement contract and token contracts: executing a
//! signed commitment, depositing tokens, registering the signing key and token
//! storage, and reading balances.

use super::types::Commitment;
use crate::amount::{from_base_units, to_base_units};
use crate::config::Config;
use crate::tokens::{Asset, AssetRegistry};
use crate::wallet::{encode_ed25519, ChainAccount, FunctionCall, ONE_YOCTO};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

/// Outcome of a storage registration request
#[derive(Debug, Clone, PartialEq)]
pub enum StorageRegistration {
    /// Account already had storage; carries `storage_balance_of`'s result
    Existing(Value),
    /// A `storage_deposit` call was made; carries its outcome
    Registered(Value),
}

/// Token balance held by an account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenBalance {
    pub symbol: String,
    pub amount: Decimal,
}

/// Settlement contract client
#[derive(Debug, Clone)]
pub struct SettlementClient {
    registry: AssetRegistry,
    verifying_contract: String,
    wrap_contract: String,
    gas: u64,
    storage_deposit: u128,
}

impl SettlementClient {
    pub fn new(registry: AssetRegistry, config: &Config) -> Result<Self> {
        Ok(Self {
            registry,
            verifying_contract: config.verifying_contract.clone(),
            wrap_contract: config.wrap_contract.clone(),
            gas: config.gas,
            storage_deposit: config.storage_deposit()?,
        })
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    fn call(&self, contract_id: &str, method_name: &str, args: Value) -> FunctionCall {
        FunctionCall::new(contract_id, method_name, args).gas(self.gas)
    }

    /// Execute a signed commitment on the settlement contract, bypassing the relay
    pub async fn submit_on_chain(
        &self,
        account: &dyn ChainAccount,
        signed: &Commitment,
    ) -> Result<Value> {
        let call = self.call(
            &self.verifying_contract,
            "execute_intents",
            json!({ "signed": [signed] }),
        );
        account.call(call).await.map_err(|e| {
            error!(error = %e, "Error submitting signed intent");
            e
        })
    }

    /// Move `amount` of a token into the settlement contract
    ///
    /// The native token is wrapped first with the exact amount attached.
    pub async fn deposit(
        &self,
        account: &dyn ChainAccount,
        symbol: &str,
        amount: Decimal,
    ) -> Result<Value> {
        let asset = *self.registry.require(symbol)?;
        let raw = to_base_units(amount, asset.decimals)?;
        if raw == "0" {
            return Err(Error::InvalidAmount(format!(
                "{} {} is below the smallest unit of the token",
                amount, asset.symbol
            )));
        }

        info!(
            token = asset.symbol,
            amount = %amount,
            raw_amount = %raw,
            "Depositing into settlement contract"
        );

        let token_contract = if asset.is_native {
            let attached: u128 = raw
                .parse()
                .map_err(|_| Error::InvalidAmount(format!("{} overflows u128", raw)))?;
            let wrap = self
                .call(&self.wrap_contract, "near_deposit", json!({}))
                .deposit(attached);
            account.call(wrap).await.map_err(|e| {
                error!(token = asset.symbol, error = %e, "Error wrapping native token");
                e
            })?;
            self.wrap_contract.as_str()
        } else {
            asset.contract_id
        };

        let transfer = self
            .call(
                token_contract,
                "ft_transfer_call",
                json!({
                    "receiver_id": self.verifying_contract,
                    "amount": raw,
                    "msg": "",
                }),
            )
            .deposit(ONE_YOCTO);
        account.call(transfer).await.map_err(|e| {
            error!(token = asset.symbol, error = %e, "Error depositing token");
            e
        })
    }

    /// Register the account's signing key with the settlement contract
    pub async fn register_public_key(&self, account: &dyn ChainAccount) -> Result<Value> {
        let public_key = account
            .signer()
            .public_key(account.account_id(), account.network_id())
            .await?;
        let call = self
            .call(
                &self.verifying_contract,
                "add_public_key",
                json!({ "public_key": encode_ed25519(&public_key) }),
            )
            .deposit(ONE_YOCTO);
        account.call(call).await.map_err(|e| {
            error!(error = %e, "Error registering public key");
            e
        })
    }

    /// Make sure `on_behalf_of` (or the account itself) has storage on a token contract
    pub async fn register_token_storage(
        &self,
        account: &dyn ChainAccount,
        symbol: &str,
        on_behalf_of: Option<&str>,
    ) -> Result<StorageRegistration> {
        let asset = *self.registry.require(symbol)?;
        let account_id = on_behalf_of.unwrap_or_else(|| account.account_id());

        let balance = account
            .view(
                asset.contract_id,
                "storage_balance_of",
                json!({ "account_id": account_id }),
            )
            .await?;
        if !balance.is_null() {
            return Ok(StorageRegistration::Existing(balance));
        }

        info!(account_id, token = asset.symbol, "Registering token storage");
        let call = self
            .call(
                asset.contract_id,
                "storage_deposit",
                json!({ "account_id": account_id }),
            )
            .deposit(self.storage_deposit);
        let outcome = account.call(call).await.map_err(|e| {
            error!(token = asset.symbol, error = %e, "Error registering token storage");
            e
        })?;
        Ok(StorageRegistration::Registered(outcome))
    }

    /// Balance of one asset held by the account
    pub async fn ft_balance_of(&self, account: &dyn ChainAccount, asset: &Asset) -> Result<Decimal> {
        let raw = account
            .view(
                asset.contract_id,
                "ft_balance_of",
                json!({ "account_id": account.account_id() }),
            )
            .await?;
        let raw = raw.as_str().ok_or_else(|| {
            Error::chain_call(asset.contract_id, "ft_balance_of", format!("unexpected result {}", raw))
        })?;
        from_base_units(raw, asset.decimals)
    }

    /// Balances for one symbol, or every registered asset when `symbol` is `None`
    ///
    /// A failed lookup for an individual token reports zero.
    pub async fn balances(
        &self,
        account: &dyn ChainAccount,
        symbol: Option<&str>,
    ) -> Result<Vec<TokenBalance>> {
        let assets: Vec<Asset> = match symbol {
            Some(symbol) => vec![*self.registry.require(symbol)?],
            None => self.registry.iter().copied().collect(),
        };

        let mut balances = Vec::with_capacity(assets.len());
        for asset in assets {
            let amount = match self.ft_balance_of(account, &asset).await {
                Ok(amount) => amount,
                Err(e) => {
                    warn!(token = asset.symbol, error = %e, "Error checking balance");
                    Decimal::ZERO
                }
            };
            balances.push(TokenBalance {
                symbol: asset.symbol.to_string(),
                amount,
            });
        }
        Ok(balances)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording chain account shared by settlement and swap tests

    use super::*;
    use crate::wallet::{KeyPairSigner, MessageSigner};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    pub struct RecordingAccount {
        pub signer: KeyPairSigner,
        pub calls: Mutex<Vec<FunctionCall>>,
        pub views: Mutex<Vec<(String, String, Value)>>,
        /// View results keyed by `contract.method`; missing keys fail
        pub view_results: HashMap<String, Value>,
        pub fail_calls: bool,
    }

    impl RecordingAccount {
        pub fn new() -> Self {
            Self {
                signer: KeyPairSigner::generate(),
                calls: Mutex::new(Vec::new()),
                views: Mutex::new(Vec::new()),
                view_results: HashMap::new(),
                fail_calls: false,
            }
        }

        pub fn with_view(mut self, contract: &str, method: &str, result: Value) -> Self {
            self.view_results
                .insert(format!("{}.{}", contract, method), result);
            self
        }

        pub fn calls(&self) -> Vec<FunctionCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn view_count(&self) -> usize {
            self.views.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChainAccount for RecordingAccount {
        fn account_id(&self) -> &str {
            "alice.near"
        }

        fn network_id(&self) -> &str {
            "mainnet"
        }

        fn signer(&self) -> &dyn MessageSigner {
            &self.signer
        }

        async fn call(&self, call: FunctionCall) -> Result<Value> {
            let (contract, method) = (call.contract_id.clone(), call.method_name.clone());
            self.calls.lock().unwrap().push(call);
            if self.fail_calls {
                return Err(Error::chain_call(&contract, &method, "Smart contract panicked"));
            }
            Ok(json!({ "transaction_id": "tx" }))
        }

        async fn view(&self, contract_id: &str, method_name: &str, args: Value) -> Result<Value> {
            self.views.lock().unwrap().push((
                contract_id.to_string(),
                method_name.to_string(),
                args,
            ));
            self.view_results
                .get(&format!("{}.{}", contract_id, method_name))
                .cloned()
                .ok_or_else(|| Error::chain_call(contract_id, method_name, "no such view"))
        }
    }
}
