//! Action interceptors
//!
//! Interceptors observe every action the tools run. They are called before the
//! action starts and after it completes, and can never block or alter it.

mod audit_log;

use crate::tools::ActionReply;
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

pub use audit_log::AuditLogInterceptor;

/// What an interceptor sees about a running action
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub attempt_id: Uuid,
    pub action: &'static str,
    pub args: Value,
}

impl ActionContext {
    pub fn new(action: &'static str, args: Value) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            action,
            args,
        }
    }
}

#[async_trait]
pub trait ActionInterceptor: Send + Sync {
    async fn on_action_start(&self, context: &ActionContext);

    async fn on_action_complete(&self, context: &ActionContext, reply: &ActionReply, duration_ms: u64);
}
