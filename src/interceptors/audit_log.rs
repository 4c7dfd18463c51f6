//! Audit log interceptor
//!
//! Appends one JSON line per action start and completion.

use super::{ActionContext, ActionInterceptor};
use crate::tools::ActionReply;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Entry in the audit log
#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    timestamp: DateTime<Utc>,
    attempt_id: Uuid,
    entry_type: &'static str,
    action: &'static str,
    args: &'a Value,
    result: Option<&'a Value>,
    error: Option<&'a str>,
    duration_ms: u64,
    status: &'static str,
}

/// Writer for audit log entries
struct AuditLogWriter {
    path: PathBuf,
}

impl AuditLogWriter {
    fn write(&self, entry: &AuditEntry<'_>) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

/// Interceptor that logs every action to a JSONL file
#[derive(Clone)]
pub struct AuditLogInterceptor {
    writer: Arc<Mutex<AuditLogWriter>>,
}

impl AuditLogInterceptor {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(AuditLogWriter {
                path: log_path.into(),
            })),
        }
    }

    async fn record(&self, entry: AuditEntry<'_>) {
        let writer = self.writer.lock().await;
        if let Err(e) = writer.write(&entry) {
            tracing::warn!(error = %e, "Failed to write audit log entry");
        }
    }
}

#[async_trait]
impl ActionInterceptor for AuditLogInterceptor {
    async fn on_action_start(&self, context: &ActionContext) {
        self.record(AuditEntry {
            timestamp: Utc::now(),
            attempt_id: context.attempt_id,
            entry_type: "action_start",
            action: context.action,
            args: &context.args,
            result: None,
            error: None,
            duration_ms: 0,
            status: "pending",
        })
        .await;
    }

    async fn on_action_complete(&self, context: &ActionContext, reply: &ActionReply, duration_ms: u64) {
        let (result, error, status) = if reply.success {
            (Some(&reply.data), None, "success")
        } else {
            (None, Some(reply.text.as_str()), "error")
        };

        self.record(AuditEntry {
            timestamp: Utc::now(),
            attempt_id: context.attempt_id,
            entry_type: "action_complete",
            action: context.action,
            args: &context.args,
            result,
            error,
            duration_ms,
            status,
        })
        .await;
    }
}
