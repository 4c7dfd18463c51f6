//! Action tools
//!
//! Each tool takes one validated, structured request (swap, quote, deposit,
//! balance) and answers with an [`ActionReply`]. Tools run through a
//! [`ToolRunner`], which notifies the configured interceptors around every call.

mod balance;
mod deposit;
mod quote;
mod swap;
mod types;

pub use balance::BalanceTool;
pub use deposit::DepositTool;
pub use quote::QuoteTool;
pub use swap::SwapTool;
pub use types::{
    positive_amount, ActionReply, BalanceInput, DepositInput, DepositRequest, SwapInput,
};

use crate::interceptors::{ActionContext, ActionInterceptor};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

pub const TOOL_SWAP: &str = "swap";
pub const TOOL_QUOTE: &str = "quote";
pub const TOOL_DEPOSIT: &str = "deposit";
pub const TOOL_BALANCE: &str = "balance";

/// A single user-facing action
#[async_trait]
pub trait ActionTool: Send + Sync {
    type Input: Serialize + DeserializeOwned + Send + Sync;

    const NAME: &'static str;

    fn description(&self) -> &'static str;

    /// Run the action; every failure becomes a failed reply
    async fn execute(&self, input: Self::Input) -> ActionReply;
}

/// Runs tools with interceptors around them
#[derive(Default, Clone)]
pub struct ToolRunner {
    interceptors: Vec<Arc<dyn ActionInterceptor>>,
}

impl ToolRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interceptor(mut self, interceptor: Arc<dyn ActionInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub async fn run<T: ActionTool>(&self, tool: &T, input: T::Input) -> ActionReply {
        let args = serde_json::to_value(&input).unwrap_or(Value::Null);
        let context = ActionContext::new(T::NAME, args);
        tracing::debug!(action = T::NAME, attempt_id = %context.attempt_id, "Running action");

        for interceptor in &self.interceptors {
            interceptor.on_action_start(&context).await;
        }

        let started = Instant::now();
        let reply = tool.execute(input).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        for interceptor in &self.interceptors {
            interceptor
                .on_action_complete(&context, &reply, duration_ms)
                .await;
        }
        reply
    }

    /// Deserialize loosely-typed arguments, then run the tool
    pub async fn run_json<T: ActionTool>(&self, tool: &T, args: Value) -> ActionReply {
        match serde_json::from_value::<T::Input>(args) {
            Ok(input) => self.run(tool, input).await,
            Err(e) => ActionReply::failure(format!(
                "Failed to extract {} parameters: {}",
                T::NAME,
                e
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Serialize, Deserialize)]
    struct EchoInput {
        word: String,
    }

    struct EchoTool;

    #[async_trait]
    impl ActionTool for EchoTool {
        type Input = EchoInput;
        const NAME: &'static str = "echo";

        fn description(&self) -> &'static str {
            "Echoes a word"
        }

        async fn execute(&self, input: EchoInput) -> ActionReply {
            ActionReply::success(input.word.clone(), json!({ "word": input.word }))
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ActionInterceptor for Recorder {
        async fn on_action_start(&self, context: &ActionContext) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start {}", context.action));
        }

        async fn on_action_complete(&self, context: &ActionContext, reply: &ActionReply, _: u64) {
            self.events
                .lock()
                .unwrap()
                .push(format!("complete {} {}", context.action, reply.success));
        }
    }

    #[tokio::test]
    async fn test_runner_notifies_interceptors() {
        let recorder = Arc::new(Recorder::default());
        let runner = ToolRunner::new().with_interceptor(recorder.clone());

        let reply = runner
            .run_json(&EchoTool, json!({ "word": "hi" }))
            .await;
        assert!(reply.success);
        assert_eq!(reply.text, "hi");
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["start echo".to_string(), "complete echo true".to_string()]
        );
    }

    #[tokio::test]
    async fn test_malformed_args_never_reach_tool() {
        let recorder = Arc::new(Recorder::default());
        let runner = ToolRunner::new().with_interceptor(recorder.clone());

        let reply = runner.run_json(&EchoTool, json!({ "nope": 1 })).await;
        assert!(!reply.success);
        assert!(reply.text.starts_with("Failed to extract echo parameters"));
        assert!(recorder.events.lock().unwrap().is_empty());
    }
}
