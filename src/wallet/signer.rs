//! Ed25519 message signing
//!
//! SECURITY: This is the ONLY place where private keys exist.
//! - Keys are held in ed25519-dalek's SigningKey
//! - Keys are never serialized to JSON
//! - Keys are never logged

use crate::{Error, Result};
use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey, SECRET_KEY_LENGTH};
use secrecy::{ExposeSecret, SecretString};

/// Prefix NEAR uses for Ed25519 keys and signatures
pub const ED25519_PREFIX: &str = "ed25519";

/// Detached signature plus the public key that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    pub signature: Vec<u8>,
    pub public_key: Vec<u8>,
}

/// Signing capability of an account
///
/// Implementations may sign locally or round-trip to a remote signer.
#[async_trait]
pub trait MessageSigner: Send + Sync {
    /// Produce a detached signature over `message`
    async fn sign_message(
        &self,
        message: &[u8],
        account_id: &str,
        network_id: &str,
    ) -> Result<SignedMessage>;

    /// Raw public key bytes registered for `account_id`
    async fn public_key(&self, account_id: &str, network_id: &str) -> Result<Vec<u8>>;
}

/// Render raw key or signature bytes as `ed25519:<base58>`
pub fn encode_ed25519(bytes: &[u8]) -> String {
    format!("{}:{}", ED25519_PREFIX, bs58::encode(bytes).into_string())
}

/// Parse `ed25519:<base58>` (prefix optional) back into raw bytes
pub fn decode_ed25519(encoded: &str) -> Result<Vec<u8>> {
    let body = encoded
        .strip_prefix(ED25519_PREFIX)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(encoded);
    bs58::decode(body)
        .into_vec()
        .map_err(|e| Error::Signing(format!("Invalid base58 key material: {}", e)))
}

/// In-process Ed25519 signer backed by a NEAR secret key
pub struct KeyPairSigner {
    signing_key: SigningKey,
}

impl KeyPairSigner {
    /// Create a signer from `ed25519:<base58>`
    ///
    /// Accepts the 64-byte NEAR keypair encoding (seed followed by public key)
    /// and the bare 32-byte seed.
    pub fn from_secret(secret: &SecretString) -> Result<Self> {
        let bytes = decode_ed25519(secret.expose_secret())
            .map_err(|_| Error::Config("Invalid NEAR secret key encoding".to_string()))?;

        let signing_key = match bytes.len() {
            64 => {
                let keypair: [u8; 64] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::Config("Invalid NEAR secret key length".to_string()))?;
                SigningKey::from_keypair_bytes(&keypair).map_err(|_| {
                    Error::Config("NEAR secret key does not match its public key".to_string())
                })?
            }
            SECRET_KEY_LENGTH => {
                let seed: [u8; SECRET_KEY_LENGTH] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::Config("Invalid NEAR secret key length".to_string()))?;
                SigningKey::from_bytes(&seed)
            }
            other => {
                return Err(Error::Config(format!(
                    "NEAR secret key must be 32 or 64 bytes, got {}",
                    other
                )))
            }
        };

        Ok(Self { signing_key })
    }

    /// Generate a fresh random key
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut rand::rngs::OsRng),
        }
    }

    /// Public key as `ed25519:<base58>`
    pub fn public_key_string(&self) -> String {
        encode_ed25519(self.signing_key.verifying_key().as_bytes())
    }
}

#[async_trait]
impl MessageSigner for KeyPairSigner {
    async fn sign_message(
        &self,
        message: &[u8],
        _account_id: &str,
        _network_id: &str,
    ) -> Result<SignedMessage> {
        let signature = self.signing_key.sign(message);
        Ok(SignedMessage {
            signature: signature.to_bytes().to_vec(),
            public_key: self.signing_key.verifying_key().to_bytes().to_vec(),
        })
    }

    async fn public_key(&self, _account_id: &str, _network_id: &str) -> Result<Vec<u8>> {
        Ok(self.signing_key.verifying_key().to_bytes().to_vec())
    }
}

// Implement Debug manually to avoid exposing the key
impl std::fmt::Debug for KeyPairSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPairSigner")
            .field("public_key", &self.public_key_string())
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    // Test key (DO NOT use in production!)
    const TEST_SEED: [u8; 32] = [7u8; 32];

    fn test_secret() -> SecretString {
        let key = SigningKey::from_bytes(&TEST_SEED);
        SecretString::from(encode_ed25519(&key.to_keypair_bytes()))
    }

    #[test]
    fn test_from_keypair_secret() {
        let signer = KeyPairSigner::from_secret(&test_secret()).unwrap();
        let expected = SigningKey::from_bytes(&TEST_SEED).verifying_key();
        assert_eq!(signer.public_key_string(), encode_ed25519(expected.as_bytes()));
    }

    #[test]
    fn test_from_seed_secret() {
        let seed_only = SecretString::from(encode_ed25519(&TEST_SEED));
        let a = KeyPairSigner::from_secret(&seed_only).unwrap();
        let b = KeyPairSigner::from_secret(&test_secret()).unwrap();
        assert_eq!(a.public_key_string(), b.public_key_string());
    }

    #[test]
    fn test_rejects_bad_secrets() {
        assert!(KeyPairSigner::from_secret(&SecretString::from("ed25519:0OIl".to_string())).is_err());
        let short = SecretString::from(encode_ed25519(&[1u8; 16]));
        assert!(matches!(
            KeyPairSigner::from_secret(&short),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let signer = KeyPairSigner::from_secret(&test_secret()).unwrap();
        let debug_str = format!("{:?}", signer);
        let secret_body = test_secret().expose_secret().to_string();

        assert!(!debug_str.contains(&secret_body["ed25519:".len()..]));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_signature_verifies() {
        let signer = KeyPairSigner::generate();
        let signed = signer
            .sign_message(b"hello intents", "alice.near", "mainnet")
            .await
            .unwrap();

        let key_bytes: [u8; 32] = signed.public_key.as_slice().try_into().unwrap();
        let key = VerifyingKey::from_bytes(&key_bytes).unwrap();
        let sig_bytes: [u8; 64] = signed.signature.as_slice().try_into().unwrap();
        assert!(key
            .verify(b"hello intents", &Signature::from_bytes(&sig_bytes))
            .is_ok());
    }

    #[test]
    fn test_encode_decode_ed25519() {
        let encoded = encode_ed25519(&[1, 2, 3]);
        assert!(encoded.starts_with("ed25519:"));
        assert_eq!(decode_ed25519(&encoded).unwrap(), vec![1, 2, 3]);
        assert_eq!(decode_ed25519("Ldp").unwrap(), vec![1, 2, 3]);
    }
}
