//! Solver relay client
//!
//! Speaks JSON-RPC 2.0 to the relay's `quote` and `publish_intent` methods and
//! ranks the quotes it returns.
//!
//! The `SolverRelay` trait abstracts over the transport so the swap
//! orchestrator can be driven by the HTTP client in production and by an
//! in-memory relay in tests.

use super::types::{IntentRequest, PublishIntent, Quote, DEFAULT_MIN_DEADLINE_MS};
use crate::amount::parse_amount;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

/// Public relay endpoint
pub const DEFAULT_RELAY_URL: &str = "https://solver-relay-v2.chaindefuser.com/rpc";

const RPC_REQUEST_ID: &str = "dontcare";

/// JSON-RPC request envelope with a single positional parameter
#[derive(Debug, Serialize)]
struct RpcRequest<'a, T: Serialize> {
    id: &'static str,
    jsonrpc: &'static str,
    method: &'a str,
    params: [&'a T; 1],
}

impl<'a, T: Serialize> RpcRequest<'a, T> {
    fn new(method: &'a str, param: &'a T) -> Self {
        Self {
            id: RPC_REQUEST_ID,
            jsonrpc: "2.0",
            method,
            params: [param],
        }
    }
}

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code)?,
            None => write!(f, "{}", self.message)?,
        }
        if let Some(data) = &self.data {
            write!(f, ": {}", data)?;
        }
        Ok(())
    }
}

/// Relay acknowledgment of a published intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResult {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PublishResult {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("OK")
    }
}

/// Transport to a solver relay
#[async_trait]
pub trait SolverRelay: Send + Sync {
    /// Request quotes for a trade
    ///
    /// Transport and decode failures yield an empty list.
    async fn fetch_quotes(&self, request: &IntentRequest) -> Vec<Quote>;

    /// Publish a signed commitment against one or more quotes
    async fn publish(&self, intent: &PublishIntent) -> Result<PublishResult>;
}

/// Build a quote request with the default minimum deadline
pub fn build_request(
    asset_in: &str,
    amount_in: &str,
    asset_out: &str,
    amount_out: Option<&str>,
) -> IntentRequest {
    IntentRequest {
        asset_in: asset_in.to_string(),
        asset_out: asset_out.to_string(),
        amount_in: amount_in.to_string(),
        amount_out: amount_out.map(str::to_string),
        min_deadline_ms: DEFAULT_MIN_DEADLINE_MS,
    }
}

impl IntentRequest {
    /// Override the minimum quote validity the relay must honour
    pub fn with_min_deadline_ms(mut self, min_deadline_ms: u64) -> Self {
        self.min_deadline_ms = min_deadline_ms;
        self
    }
}

/// Numeric value of a quote's `amount_out`
pub fn quote_amount(quote: &Quote) -> Option<Decimal> {
    parse_amount(&quote.amount_out).ok()
}

/// Pick the quote with the largest `amount_out`
///
/// Ties keep the first quote seen. Quotes whose amount does not parse or is
/// not positive are skipped.
pub fn select_best(quotes: &[Quote]) -> Option<&Quote> {
    let mut best: Option<(&Quote, Decimal)> = None;
    for quote in quotes {
        let Some(amount) = quote_amount(quote) else {
            warn!(
                quote_hash = %quote.quote_hash,
                amount_out = %quote.amount_out,
                "Skipping quote with unparseable amount_out"
            );
            continue;
        };
        if amount <= Decimal::ZERO {
            warn!(
                quote_hash = %quote.quote_hash,
                amount_out = %quote.amount_out,
                "Skipping quote offering nothing"
            );
            continue;
        }
        match best {
            Some((_, best_amount)) if amount <= best_amount => {}
            _ => best = Some((quote, amount)),
        }
    }

    if best.is_none() {
        warn!("No options available from solver relay");
    }
    best.map(|(quote, _)| quote)
}

/// Decode the `result` of a `quote` call, dropping malformed entries
fn decode_quotes(result: Option<Value>) -> Vec<Quote> {
    let entries = match result {
        Some(Value::Array(entries)) => entries,
        Some(Value::Null) | None => return Vec::new(),
        Some(other) => {
            warn!(result = %other, "Unexpected quote result shape");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Quote>(entry) {
            Ok(quote) => Some(quote),
            Err(e) => {
                warn!(error = %e, "Dropping malformed quote");
                None
            }
        })
        .collect()
}

/// HTTP JSON-RPC client for the solver relay
#[derive(Debug, Clone)]
pub struct HttpSolverRelay {
    client: Client,
    url: String,
}

impl HttpSolverRelay {
    /// Create a client for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    async fn call<P: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        param: &P,
    ) -> Result<RpcResponse<R>> {
        let response = self
            .client
            .post(&self.url)
            .json(&RpcRequest::new(method, param))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

impl Default for HttpSolverRelay {
    fn default() -> Self {
        Self::new(DEFAULT_RELAY_URL)
    }
}

#[async_trait]
impl SolverRelay for HttpSolverRelay {
    async fn fetch_quotes(&self, request: &IntentRequest) -> Vec<Quote> {
        debug!(
            asset_in = %request.asset_in,
            asset_out = %request.asset_out,
            amount_in = %request.amount_in,
            "Requesting quotes from solver relay"
        );

        match self.call::<_, Value>("quote", request).await {
            Ok(RpcResponse {
                error: Some(err), ..
            }) => {
                warn!(error = %err, "Solver relay rejected quote request");
                Vec::new()
            }
            Ok(response) => {
                let quotes = decode_quotes(response.result);
                debug!(count = quotes.len(), "Received quotes");
                quotes
            }
            Err(e) => {
                warn!(error = %e, "Error fetching options from solver relay");
                Vec::new()
            }
        }
    }

    async fn publish(&self, intent: &PublishIntent) -> Result<PublishResult> {
        let response = self
            .call::<_, PublishResult>("publish_intent", intent)
            .await
            .map_err(|e| {
                error!(error = %e, "Error publishing intent to solver relay");
                Error::Publish(e.to_string())
            })?;

        if let Some(err) = response.error {
            error!(error = %err, "Solver relay rejected intent");
            return Err(Error::Publish(err.to_string()));
        }

        let result = response
            .result
            .ok_or_else(|| Error::Publish("relay response missing 'result'".to_string()))?;

        if !result.is_ok() {
            let reason = result
                .reason
                .clone()
                .unwrap_or_else(|| format!("status {}", result.status));
            error!(status = %result.status, reason = %reason, "Intent not accepted");
            return Err(Error::Publish(reason));
        }

        Ok(result)
    }
}
