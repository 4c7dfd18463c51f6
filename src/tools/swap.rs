//! Swap tool
//!
//! Executes a full swap through the solver relay: quote, sign, publish.

use super::{ActionReply, ActionTool, SwapInput, TOOL_SWAP};
use crate::swap::SwapExecutor;
use crate::tokens::AssetRegistry;
use crate::wallet::ChainAccount;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast;

pub struct SwapTool {
    executor: Arc<SwapExecutor>,
    account: Arc<dyn ChainAccount>,
    registry: AssetRegistry,
    shutdown: Option<broadcast::Sender<()>>,
}

impl SwapTool {
    pub fn new(
        executor: Arc<SwapExecutor>,
        account: Arc<dyn ChainAccount>,
        registry: AssetRegistry,
    ) -> Self {
        Self {
            executor,
            account,
            registry,
            shutdown: None,
        }
    }

    /// Abandon in-flight swaps when `shutdown` fires
    pub fn with_shutdown(mut self, shutdown: broadcast::Sender<()>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }
}

#[async_trait]
impl ActionTool for SwapTool {
    type Input = SwapInput;
    const NAME: &'static str = TOOL_SWAP;

    fn description(&self) -> &'static str {
        "Swap one supported token for another through the NEAR Intents solver relay. \
         Fetches quotes, signs a token-diff commitment for the best one and publishes it."
    }

    async fn execute(&self, input: SwapInput) -> ActionReply {
        let request = match input.validate(&self.registry) {
            Ok(request) => request,
            Err(e) => return ActionReply::failure(e.to_string()),
        };

        let result = match &self.shutdown {
            Some(shutdown) => {
                let mut receiver = shutdown.subscribe();
                self.executor
                    .execute_with_shutdown(self.account.as_ref(), &request, &mut receiver)
                    .await
            }
            None => self.executor.execute(self.account.as_ref(), &request).await,
        };

        match result {
            Ok(outcome) => ActionReply::success(
                format!(
                    "Successfully swapped {} {} for {} {}.",
                    request.amount_in, request.asset_in, outcome.amount_out, request.asset_out
                ),
                json!({
                    "attempt_id": outcome.attempt_id,
                    "quote_hash": outcome.quote.quote_hash,
                    "amount_in": request.amount_in,
                    "amount_out": outcome.amount_out,
                    "intent_hash": outcome.result.intent_hash,
                    "status": outcome.result.status,
                }),
            ),
            Err(e) => ActionReply::failure(format!("Failed to swap tokens: {}", e)),
        }
    }
}
