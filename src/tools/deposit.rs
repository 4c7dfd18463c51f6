//! Deposit tool
//!
//! Moves tokens from the account into the settlement contract so they can
//! back signed commitments.

use super::{ActionReply, ActionTool, DepositInput, TOOL_DEPOSIT};
use crate::intents::SettlementClient;
use crate::wallet::ChainAccount;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub struct DepositTool {
    settlement: Arc<SettlementClient>,
    account: Arc<dyn ChainAccount>,
}

impl DepositTool {
    pub fn new(settlement: Arc<SettlementClient>, account: Arc<dyn ChainAccount>) -> Self {
        Self {
            settlement,
            account,
        }
    }
}

#[async_trait]
impl ActionTool for DepositTool {
    type Input = DepositInput;
    const NAME: &'static str = TOOL_DEPOSIT;

    fn description(&self) -> &'static str {
        "Deposit a supported token into the intents settlement contract. \
         NEAR is wrapped before it is transferred."
    }

    async fn execute(&self, input: DepositInput) -> ActionReply {
        let request = match input.validate(self.settlement.registry()) {
            Ok(request) => request,
            Err(e) => return ActionReply::failure(e.to_string()),
        };

        match self
            .settlement
            .deposit(self.account.as_ref(), request.symbol, request.amount)
            .await
        {
            Ok(outcome) => ActionReply::success(
                format!(
                    "Successfully deposited {} {} into the intents contract.",
                    request.amount, request.symbol
                ),
                json!({
                    "token": request.symbol,
                    "amount": request.amount,
                    "outcome": outcome,
                }),
            ),
            Err(e) => ActionReply::failure(format!("Failed to deposit tokens: {}", e)),
        }
    }
}
