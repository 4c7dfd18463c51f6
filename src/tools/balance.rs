//! Balance tool
//!
//! READ-ONLY: runs `ft_balance_of` views and never signs anything.

use super::{ActionReply, ActionTool, BalanceInput, TOOL_BALANCE};
use crate::intents::SettlementClient;
use crate::wallet::ChainAccount;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub struct BalanceTool {
    settlement: Arc<SettlementClient>,
    account: Arc<dyn ChainAccount>,
}

impl BalanceTool {
    pub fn new(settlement: Arc<SettlementClient>, account: Arc<dyn ChainAccount>) -> Self {
        Self {
            settlement,
            account,
        }
    }
}

#[async_trait]
impl ActionTool for BalanceTool {
    type Input = BalanceInput;
    const NAME: &'static str = TOOL_BALANCE;

    fn description(&self) -> &'static str {
        "Check the account's balance of one supported token, or of all of them."
    }

    async fn execute(&self, input: BalanceInput) -> ActionReply {
        let symbol = match input.validate(self.settlement.registry()) {
            Ok(symbol) => symbol,
            Err(e) => return ActionReply::failure(e.to_string()),
        };

        let balances = match self.settlement.balances(self.account.as_ref(), symbol).await {
            Ok(balances) => balances,
            Err(e) => return ActionReply::failure(format!("Failed to check balances: {}", e)),
        };

        let text = match (symbol, balances.as_slice()) {
            (Some(_), [single]) => format!("{} Balance: {} {}", single.symbol, single.amount, single.symbol),
            _ => {
                let lines: Vec<String> = balances
                    .iter()
                    .map(|b| format!("{}: {} {}", b.symbol, b.amount, b.symbol))
                    .collect();
                format!("Token Balances:\n{}", lines.join("\n"))
            }
        };

        ActionReply::success(
            text,
            json!({
                "account_id": self.account.account_id(),
                "balances": balances,
            }),
        )
    }
}
