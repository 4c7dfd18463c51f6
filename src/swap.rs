//! Swap orchestration
//!
//! One swap attempt runs a fixed sequence with no retries:
//!
//! ```text
//! build request -> fetch quotes -> select best -> build + sign commitment -> publish
//! ```
//!
//! Any failure aborts the attempt. Calling again starts over with fresh quotes,
//! a fresh nonce and a fresh deadline.

use crate::amount::to_base_units;
use crate::config::Config;
use crate::intents::relay::{build_request, quote_amount, select_best, PublishResult, SolverRelay};
use crate::intents::types::{IntentRequest, PublishIntent, Quote};
use crate::intents::CommitmentSigner;
use crate::tokens::AssetRegistry;
use crate::wallet::ChainAccount;
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A validated trade request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapRequest {
    pub asset_in: String,
    pub asset_out: String,
    /// Human-readable amount of `asset_in` to sell
    pub amount_in: Decimal,
}

/// Result of a successful swap attempt
#[derive(Debug, Clone, Serialize)]
pub struct SwapOutcome {
    pub attempt_id: Uuid,
    pub quote: Quote,
    pub amount_out: Decimal,
    pub intent: PublishIntent,
    pub result: PublishResult,
}

/// Quotes for a pair without committing to any of them
#[derive(Debug, Clone, Serialize)]
pub struct QuotePreview {
    pub request: IntentRequest,
    pub quotes: Vec<Quote>,
    pub best: Option<Quote>,
}

/// Runs swap attempts against a solver relay
pub struct SwapExecutor {
    relay: Arc<dyn SolverRelay>,
    registry: AssetRegistry,
    signer: CommitmentSigner,
    min_deadline_ms: u64,
}

impl SwapExecutor {
    pub fn new(relay: Arc<dyn SolverRelay>, registry: AssetRegistry, config: &Config) -> Self {
        Self {
            relay,
            signer: CommitmentSigner::new(registry.clone(), config),
            registry,
            min_deadline_ms: config.min_deadline_ms,
        }
    }

    fn request_for(&self, swap: &SwapRequest) -> Result<IntentRequest> {
        let input = self.registry.require(&swap.asset_in)?;
        let output = self.registry.require(&swap.asset_out)?;

        let amount_in = to_base_units(swap.amount_in, input.decimals)?;
        if amount_in == "0" {
            return Err(Error::InvalidAmount(format!(
                "{} {} is below the smallest unit of the token",
                swap.amount_in, input.symbol
            )));
        }

        Ok(build_request(
            &input.asset_identifier(),
            &amount_in,
            &output.asset_identifier(),
            None,
        )
        .with_min_deadline_ms(self.min_deadline_ms))
    }

    /// Fetch and rank quotes for a swap without signing anything
    pub async fn preview(&self, swap: &SwapRequest) -> Result<QuotePreview> {
        let request = self.request_for(swap)?;
        let quotes = self.relay.fetch_quotes(&request).await;
        let best = select_best(&quotes).cloned();
        Ok(QuotePreview {
            request,
            quotes,
            best,
        })
    }

    /// Run one swap attempt to completion
    pub async fn execute(&self, account: &dyn ChainAccount, swap: &SwapRequest) -> Result<SwapOutcome> {
        // Held for the whole attempt so the receiver never reports a signal
        let (_never, mut shutdown) = broadcast::channel(1);
        self.execute_with_shutdown(account, swap, &mut shutdown).await
    }

    /// Run one swap attempt, abandoning it when `shutdown` fires
    ///
    /// The signal is checked at every suspension point. A closed channel is
    /// not a signal.
    pub async fn execute_with_shutdown(
        &self,
        account: &dyn ChainAccount,
        swap: &SwapRequest,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<SwapOutcome> {
        let attempt_id = Uuid::new_v4();
        info!(
            %attempt_id,
            asset_in = %swap.asset_in,
            asset_out = %swap.asset_out,
            amount_in = %swap.amount_in,
            "Starting swap"
        );

        let request = self.request_for(swap)?;

        let quotes = until_shutdown(shutdown, "fetching quotes", self.relay.fetch_quotes(&request)).await?;
        debug!(%attempt_id, count = quotes.len(), "Fetched quotes");

        let best = select_best(&quotes).cloned().ok_or(Error::NoQuoteAvailable)?;
        let amount_out = quote_amount(&best).ok_or(Error::NoQuoteAvailable)?;

        // The best offer must be expressible in the output token's units
        let output = self.registry.require(&swap.asset_out)?;
        match to_base_units(amount_out, output.decimals) {
            Ok(raw) if raw != "0" => {}
            _ => {
                warn!(
                    %attempt_id,
                    quote_hash = %best.quote_hash,
                    amount_out = %amount_out,
                    "Best quote is not a usable amount of {}",
                    output.symbol
                );
                return Err(Error::NoQuoteAvailable);
            }
        }
        info!(
            %attempt_id,
            quote_hash = %best.quote_hash,
            amount_out = %amount_out,
            "Selected quote"
        );

        let commitment = self.signer.build(
            account.account_id(),
            &swap.asset_in,
            swap.amount_in,
            &swap.asset_out,
            amount_out,
        )?;
        let signed = until_shutdown(
            shutdown,
            "signing the commitment",
            self.signer.sign(account, &commitment),
        )
        .await??;

        let intent = PublishIntent {
            signed_data: signed,
            quote_hashes: vec![best.quote_hash.clone()],
        };
        let result = until_shutdown(shutdown, "publishing the intent", self.relay.publish(&intent))
            .await??;

        info!(
            %attempt_id,
            intent_hash = result.intent_hash.as_deref().unwrap_or("-"),
            "Swap published"
        );

        Ok(SwapOutcome {
            attempt_id,
            quote: best,
            amount_out,
            intent,
            result,
        })
    }
}

/// Await `fut` unless a shutdown signal arrives first
async fn until_shutdown<F: Future>(
    shutdown: &mut broadcast::Receiver<()>,
    stage: &'static str,
    fut: F,
) -> Result<F::Output> {
    tokio::select! {
        biased;
        Ok(()) | Err(RecvError::Lagged(_)) = shutdown.recv() => {
            warn!(stage, "Swap cancelled");
            Err(Error::Cancelled(stage))
        }
        output = fut => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intents::settlement::testing::RecordingAccount;
    use crate::intents::verify_commitment;
    use crate::intents::TokenDiffCommitment;
    use async_trait::async_trait;
    use std::str::FromStr;
    use std::sync::Mutex;

    struct FakeRelay {
        quotes: Vec<Quote>,
        hang: bool,
        requests: Mutex<Vec<IntentRequest>>,
        published: Mutex<Vec<PublishIntent>>,
    }

    impl FakeRelay {
        fn with_quotes(quotes: &[(&str, &str)]) -> Self {
            Self {
                quotes: quotes
                    .iter()
                    .map(|(hash, amount)| Quote {
                        quote_hash: hash.to_string(),
                        amount_out: amount.to_string(),
                        amount_in: None,
                        expiration_time: None,
                        asset_in: None,
                        asset_out: None,
                    })
                    .collect(),
                hang: false,
                requests: Mutex::new(Vec::new()),
                published: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SolverRelay for FakeRelay {
        async fn fetch_quotes(&self, request: &IntentRequest) -> Vec<Quote> {
            self.requests.lock().unwrap().push(request.clone());
            if self.hang {
                std::future::pending::<()>().await;
            }
            self.quotes.clone()
        }

        async fn publish(&self, intent: &PublishIntent) -> Result<PublishResult> {
            self.published.lock().unwrap().push(intent.clone());
            Ok(PublishResult {
                status: "OK".to_string(),
                intent_hash: Some("intent-1".to_string()),
                reason: None,
            })
        }
    }

    fn executor(relay: Arc<FakeRelay>) -> SwapExecutor {
        SwapExecutor::new(relay, AssetRegistry::new(), &Config::default())
    }

    fn swap(from: &str, to: &str, amount: &str) -> SwapRequest {
        SwapRequest {
            asset_in: from.to_string(),
            asset_out: to.to_string(),
            amount_in: Decimal::from_str(amount).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_zec_to_usdc_end_to_end() {
        let relay = Arc::new(FakeRelay::with_quotes(&[("a", "2.0"), ("b", "2.25")]));
        let account = RecordingAccount::new();

        let outcome = executor(relay.clone())
            .execute(&account, &swap("ZEC", "USDC", "1.5"))
            .await
            .unwrap();

        assert_eq!(outcome.quote.quote_hash, "b");
        assert_eq!(outcome.result.intent_hash.as_deref(), Some("intent-1"));

        let requests = relay.requests.lock().unwrap();
        assert_eq!(requests[0].asset_in, "nep141:zec-token.near");
        assert_eq!(requests[0].amount_in, "150000000");
        assert_eq!(requests[0].min_deadline_ms, 120_000);

        let published = relay.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].quote_hashes, vec!["b".to_string()]);

        let signed = &published[0].signed_data;
        verify_commitment(signed).unwrap();
        let commitment: TokenDiffCommitment = serde_json::from_str(&signed.payload).unwrap();
        assert_eq!(commitment.signer_id, "alice.near");
        let diff: Vec<_> = commitment.token_diff().unwrap().iter().collect();
        assert_eq!(
            diff,
            vec![
                ("nep141:zec-token.near", "-150000000"),
                (
                    "nep141:a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48.factory.bridge.near",
                    "2250000"
                ),
            ]
        );

        // The relay path never touches the chain
        assert!(account.calls().is_empty());
    }

    #[tokio::test]
    async fn test_zero_quotes_fails_without_publishing() {
        let relay = Arc::new(FakeRelay::with_quotes(&[]));
        let account = RecordingAccount::new();

        let err = executor(relay.clone())
            .execute(&account, &swap("ZEC", "NEAR", "1"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NoQuoteAvailable));
        assert_eq!(relay.requests.lock().unwrap().len(), 1);
        assert!(relay.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unusable_quotes_fail_without_signing() {
        // USDC has 6 decimals, so 0.0000001 rounds to zero base units
        for quotes in [&[("zero", "0")][..], &[("neg", "-1"), ("dust", "0.0000001")][..]] {
            let relay = Arc::new(FakeRelay::with_quotes(quotes));
            let account = RecordingAccount::new();

            let err = executor(relay.clone())
                .execute(&account, &swap("ZEC", "USDC", "1"))
                .await
                .unwrap_err();

            assert!(matches!(err, Error::NoQuoteAvailable), "{:?}", err);
            assert!(relay.published.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_unsupported_asset_fails_before_fetch() {
        let relay = Arc::new(FakeRelay::with_quotes(&[("a", "1")]));
        let account = RecordingAccount::new();

        let err = executor(relay.clone())
            .execute(&account, &swap("ZEC", "DOGE", "1"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedAsset { .. }));
        assert!(relay.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_cancels_stalled_fetch() {
        let relay = Arc::new(FakeRelay {
            hang: true,
            ..FakeRelay::with_quotes(&[("a", "1")])
        });
        let account = RecordingAccount::new();
        let (tx, mut rx) = broadcast::channel(1);

        let executor = executor(relay.clone());
        let handle = async {
            executor
                .execute_with_shutdown(&account, &swap("USDC", "ZEC", "10"), &mut rx)
                .await
        };
        let fire = async {
            tokio::task::yield_now().await;
            tx.send(()).unwrap();
        };
        let (result, ()) = tokio::join!(handle, fire);

        assert!(matches!(result, Err(Error::Cancelled("fetching quotes"))));
        assert!(relay.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_shutdown_channel_is_not_a_signal() {
        let relay = Arc::new(FakeRelay::with_quotes(&[("a", "1")]));
        let account = RecordingAccount::new();
        let (tx, mut rx) = broadcast::channel::<()>(1);
        drop(tx);

        let outcome = executor(relay)
            .execute_with_shutdown(&account, &swap("USDC", "ZEC", "10"), &mut rx)
            .await
            .unwrap();
        assert_eq!(outcome.quote.quote_hash, "a");
    }

    #[tokio::test]
    async fn test_preview_ranks_without_signing() {
        let relay = Arc::new(FakeRelay::with_quotes(&[("a", "5"), ("b", "10"), ("c", "3")]));
        let preview = executor(relay.clone())
            .preview(&swap("NEAR", "USDC", "1"))
            .await
            .unwrap();

        assert_eq!(preview.request.asset_in, "near");
        assert_eq!(preview.quotes.len(), 3);
        assert_eq!(preview.best.unwrap().quote_hash, "b");
        assert!(relay.published.lock().unwrap().is_empty());
    }
}
