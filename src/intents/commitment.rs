//! Token-diff commitments
//!
//! Builds the time-bounded commitment a trader signs, signs its exact JSON
//! serialization with the account's key, and verifies signed envelopes.

use super::types::{Commitment, Intent, TokenDiff, TokenDiffCommitment, RAW_ED25519_STANDARD};
use crate::amount::{negate_base_units, to_base_units};
use crate::config::Config;
use crate::tokens::AssetRegistry;
use crate::wallet::{decode_ed25519, encode_ed25519, ChainAccount};
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use rand::RngCore;
use rust_decimal::Decimal;
use tracing::{debug, error};

/// Length of the random commitment nonce in bytes
pub const NONCE_LENGTH: usize = 32;

/// Builds and signs token-diff commitments
#[derive(Debug, Clone)]
pub struct CommitmentSigner {
    registry: AssetRegistry,
    verifying_contract: String,
    ttl_ms: u64,
}

impl CommitmentSigner {
    pub fn new(registry: AssetRegistry, config: &Config) -> Self {
        Self {
            registry,
            verifying_contract: config.verifying_contract.clone(),
            ttl_ms: config.commitment_ttl_ms,
        }
    }

    /// Build a commitment trading `amount_in` of one asset for `amount_out` of another
    pub fn build(
        &self,
        signer_id: &str,
        asset_in: &str,
        amount_in: Decimal,
        asset_out: &str,
        amount_out: Decimal,
    ) -> Result<TokenDiffCommitment> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let now_ms = u64::try_from(now_ms)
            .map_err(|_| Error::Signing("system clock is before the Unix epoch".to_string()))?;
        self.build_at(signer_id, asset_in, amount_in, asset_out, amount_out, now_ms)
    }

    /// Same as [`build`](Self::build) with an explicit creation time
    pub fn build_at(
        &self,
        signer_id: &str,
        asset_in: &str,
        amount_in: Decimal,
        asset_out: &str,
        amount_out: Decimal,
        now_ms: u64,
    ) -> Result<TokenDiffCommitment> {
        let input = self.registry.require(asset_in)?;
        let output = self.registry.require(asset_out)?;
        if input.symbol == output.symbol {
            return Err(Error::InvalidArgument(format!(
                "cannot swap {} for itself",
                input.symbol
            )));
        }

        let raw_in = positive_base_units(amount_in, input.decimals, input.symbol)?;
        let raw_out = positive_base_units(amount_out, output.decimals, output.symbol)?;

        let mut diff = TokenDiff::new();
        diff.insert(input.asset_identifier(), negate_base_units(&raw_in));
        diff.insert(output.asset_identifier(), raw_out);

        let deadline = now_ms
            .checked_add(self.ttl_ms)
            .ok_or_else(|| Error::Signing("commitment deadline overflows".to_string()))?;

        Ok(TokenDiffCommitment {
            nonce: generate_nonce(),
            signer_id: signer_id.to_string(),
            verifying_contract: self.verifying_contract.clone(),
            deadline: deadline.to_string(),
            intents: vec![Intent::TokenDiff { diff }],
        })
    }

    /// Sign the commitment's serialized payload with the account's key
    pub async fn sign(
        &self,
        account: &dyn ChainAccount,
        commitment: &TokenDiffCommitment,
    ) -> Result<Commitment> {
        let payload = commitment.to_payload()?;
        debug!(signer_id = %commitment.signer_id, deadline = %commitment.deadline, "Signing commitment");

        let signed = account
            .signer()
            .sign_message(payload.as_bytes(), account.account_id(), account.network_id())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to sign commitment");
                match e {
                    signing @ Error::Signing(_) => signing,
                    other => Error::Signing(other.to_string()),
                }
            })?;

        Ok(Commitment {
            standard: RAW_ED25519_STANDARD.to_string(),
            payload,
            signature: encode_ed25519(&signed.signature),
            public_key: encode_ed25519(&signed.public_key),
        })
    }
}

fn positive_base_units(amount: Decimal, decimals: u32, symbol: &str) -> Result<String> {
    let raw = to_base_units(amount, decimals)?;
    if raw == "0" {
        return Err(Error::InvalidAmount(format!(
            "{} {} is below the smallest unit of the token",
            amount, symbol
        )));
    }
    Ok(raw)
}

/// Fresh base64-encoded random nonce
pub fn generate_nonce() -> String {
    let mut nonce = [0u8; NONCE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    STANDARD.encode(nonce)
}

/// Check that a signed envelope's signature covers its payload
pub fn verify_commitment(commitment: &Commitment) -> Result<()> {
    if commitment.standard != RAW_ED25519_STANDARD {
        return Err(Error::Signing(format!(
            "unsupported signature standard '{}'",
            commitment.standard
        )));
    }

    let key_bytes: [u8; 32] = decode_ed25519(&commitment.public_key)?
        .as_slice()
        .try_into()
        .map_err(|_| Error::Signing("public key must be 32 bytes".to_string()))?;
    let signature_bytes: [u8; 64] = decode_ed25519(&commitment.signature)?
        .as_slice()
        .try_into()
        .map_err(|_| Error::Signing("signature must be 64 bytes".to_string()))?;

    let key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| Error::Signing(format!("invalid public key: {}", e)))?;
    key.verify(
        commitment.payload.as_bytes(),
        &Signature::from_bytes(&signature_bytes),
    )
    .map_err(|_| Error::Signing("signature does not match payload".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::{FunctionCall, KeyPairSigner, MessageSigner, SignedMessage};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::str::FromStr;

    struct SigningOnlyAccount {
        signer: KeyPairSigner,
    }

    #[async_trait]
    impl ChainAccount for SigningOnlyAccount {
        fn account_id(&self) -> &str {
            "alice.near"
        }

        fn network_id(&self) -> &str {
            "mainnet"
        }

        fn signer(&self) -> &dyn MessageSigner {
            &self.signer
        }

        async fn call(&self, _call: FunctionCall) -> Result<Value> {
            unreachable!("signing never calls contracts")
        }

        async fn view(&self, _contract_id: &str, _method_name: &str, _args: Value) -> Result<Value> {
            unreachable!("signing never runs views")
        }
    }

    struct BrokenSigner;

    #[async_trait]
    impl MessageSigner for BrokenSigner {
        async fn sign_message(&self, _: &[u8], _: &str, _: &str) -> Result<SignedMessage> {
            Err(Error::Config("remote signer unreachable".to_string()))
        }

        async fn public_key(&self, _: &str, _: &str) -> Result<Vec<u8>> {
            Ok(vec![0; 32])
        }
    }

    struct BrokenAccount(BrokenSigner);

    #[async_trait]
    impl ChainAccount for BrokenAccount {
        fn account_id(&self) -> &str {
            "alice.near"
        }

        fn network_id(&self) -> &str {
            "mainnet"
        }

        fn signer(&self) -> &dyn MessageSigner {
            &self.0
        }

        async fn call(&self, _call: FunctionCall) -> Result<Value> {
            unreachable!()
        }

        async fn view(&self, _: &str, _: &str, _: Value) -> Result<Value> {
            unreachable!()
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn signer() -> CommitmentSigner {
        CommitmentSigner::new(AssetRegistry::new(), &Config::default())
    }

    #[test]
    fn test_build_commitment_shape() {
        let commitment = signer()
            .build_at("alice.near", "ZEC", dec("1.5"), "USDC", dec("2.25"), 1_700_000_000_000)
            .unwrap();

        assert_eq!(commitment.signer_id, "alice.near");
        assert_eq!(commitment.verifying_contract, "intents.near");
        assert_eq!(commitment.intents.len(), 1);

        let diff = commitment.token_diff().unwrap();
        assert_eq!(diff.len(), 2);
        assert_eq!(diff.get("nep141:zec-token.near"), Some("-150000000"));
        assert_eq!(
            diff.get("nep141:a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48.factory.bridge.near"),
            Some("2250000")
        );

        let negatives = diff.iter().filter(|(_, d)| d.starts_with('-')).count();
        assert_eq!(negatives, 1);
        assert_eq!(diff.len() - negatives, 1);
    }

    #[test]
    fn test_deadline_is_creation_plus_ttl() {
        let created = 1_700_000_000_000u64;
        let commitment = signer()
            .build_at("alice.near", "NEAR", dec("1"), "ZEC", dec("0.1"), created)
            .unwrap();
        let deadline: u64 = commitment.deadline.parse().unwrap();
        assert_eq!(deadline - created, 120_000);
        assert_eq!(commitment.token_diff().unwrap().get("near"), Some("-1000000000000000000000000"));
    }

    #[test]
    fn test_nonce_is_fresh_32_bytes() {
        let a = generate_nonce();
        let b = generate_nonce();
        assert_ne!(a, b);
        assert_eq!(STANDARD.decode(&a).unwrap().len(), NONCE_LENGTH);
    }

    #[test]
    fn test_build_rejects_bad_inputs() {
        let s = signer();
        assert!(matches!(
            s.build_at("alice.near", "DOGE", dec("1"), "USDC", dec("1"), 0),
            Err(Error::UnsupportedAsset { .. })
        ));
        assert!(matches!(
            s.build_at("alice.near", "ZEC", dec("1"), "zec", dec("1"), 0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            s.build_at("alice.near", "ZEC", dec("0.000000001"), "USDC", dec("1"), 0),
            Err(Error::InvalidAmount(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_twice_both_verify() {
        let account = SigningOnlyAccount {
            signer: KeyPairSigner::generate(),
        };
        let s = signer();
        let commitment = s
            .build("alice.near", "ZEC", dec("1.5"), "USDC", dec("2.25"))
            .unwrap();

        let first = s.sign(&account, &commitment).await.unwrap();
        let second = s.sign(&account, &commitment).await.unwrap();

        for signed in [&first, &second] {
            assert_eq!(signed.standard, "raw_ed25519");
            assert_eq!(signed.payload, commitment.to_payload().unwrap());
            assert!(signed.signature.starts_with("ed25519:"));
            assert_eq!(signed.public_key, account.signer.public_key_string());
            verify_commitment(signed).unwrap();
        }
    }

    #[tokio::test]
    async fn test_payload_round_trips_byte_identical() {
        let account = SigningOnlyAccount {
            signer: KeyPairSigner::generate(),
        };
        let s = signer();
        let commitment = s
            .build("alice.near", "USDC", dec("10"), "NEAR", dec("3"))
            .unwrap();
        let signed = s.sign(&account, &commitment).await.unwrap();

        let reparsed: TokenDiffCommitment = serde_json::from_str(&signed.payload).unwrap();
        assert_eq!(reparsed.to_payload().unwrap(), signed.payload);
    }

    #[tokio::test]
    async fn test_tampered_payload_fails_verification() {
        let account = SigningOnlyAccount {
            signer: KeyPairSigner::generate(),
        };
        let s = signer();
        let commitment = s
            .build("alice.near", "ZEC", dec("1"), "USDC", dec("1"))
            .unwrap();
        let mut signed = s.sign(&account, &commitment).await.unwrap();
        signed.payload = signed.payload.replace("-100000000", "-1");

        assert!(matches!(verify_commitment(&signed), Err(Error::Signing(_))));
    }

    #[tokio::test]
    async fn test_signer_failure_is_signing_error() {
        let s = signer();
        let commitment = s
            .build("alice.near", "ZEC", dec("1"), "USDC", dec("1"))
            .unwrap();
        let err = s.sign(&BrokenAccount(BrokenSigner), &commitment).await.unwrap_err();
        assert!(matches!(err, Error::Signing(_)));
    }
}
