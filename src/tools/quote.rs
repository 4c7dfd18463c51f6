//! Quote preview tool (read-only)

use super::{ActionReply, ActionTool, SwapInput, TOOL_QUOTE};
use crate::intents::relay::quote_amount;
use crate::swap::SwapExecutor;
use crate::tokens::AssetRegistry;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub struct QuoteTool {
    executor: Arc<SwapExecutor>,
    registry: AssetRegistry,
}

impl QuoteTool {
    pub fn new(executor: Arc<SwapExecutor>, registry: AssetRegistry) -> Self {
        Self { executor, registry }
    }
}

#[async_trait]
impl ActionTool for QuoteTool {
    type Input = SwapInput;
    const NAME: &'static str = TOOL_QUOTE;

    fn description(&self) -> &'static str {
        "Fetch and rank solver quotes for a swap without signing or publishing anything."
    }

    async fn execute(&self, input: SwapInput) -> ActionReply {
        let request = match input.validate(&self.registry) {
            Ok(request) => request,
            Err(e) => return ActionReply::failure(e.to_string()),
        };

        let preview = match self.executor.preview(&request).await {
            Ok(preview) => preview,
            Err(e) => return ActionReply::failure(format!("Failed to fetch quotes: {}", e)),
        };

        let Some(best) = preview.best.as_ref() else {
            return ActionReply::failure(crate::Error::NoQuoteAvailable.to_string());
        };
        let amount_out = quote_amount(best).unwrap_or_default();

        ActionReply::success(
            format!(
                "Best quote for {} {}: {} {} (quote {}, {} offers)",
                request.amount_in,
                request.asset_in,
                amount_out,
                request.asset_out,
                best.quote_hash,
                preview.quotes.len()
            ),
            json!(preview),
        )
    }
}
