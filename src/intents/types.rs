//! Wire types exchanged with the solver relay and the settlement contract

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Default `min_deadline_ms` sent with quote requests
pub const DEFAULT_MIN_DEADLINE_MS: u64 = 120_000;

/// Signature scheme tag of signed commitments
pub const RAW_ED25519_STANDARD: &str = "raw_ed25519";

/// Quote request for the relay's `quote` method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRequest {
    #[serde(rename = "defuse_asset_identifier_in")]
    pub asset_in: String,
    #[serde(rename = "defuse_asset_identifier_out")]
    pub asset_out: String,
    #[serde(rename = "exact_amount_in")]
    pub amount_in: String,
    #[serde(
        rename = "exact_amount_out",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub amount_out: Option<String>,
    pub min_deadline_ms: u64,
}

/// Candidate quote returned by the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub quote_hash: String,
    pub amount_out: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
    #[serde(
        rename = "defuse_asset_identifier_in",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub asset_in: Option<String>,
    #[serde(
        rename = "defuse_asset_identifier_out",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub asset_out: Option<String>,
}

/// Ordered mapping from asset identifier to signed base-unit delta
///
/// Entries serialize in insertion order; the signed payload depends on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenDiff(Vec<(String, String)>);

impl TokenDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a delta, replacing an existing entry for the same asset in place
    pub fn insert(&mut self, asset_id: impl Into<String>, delta: impl Into<String>) {
        let asset_id = asset_id.into();
        let delta = delta.into();
        match self.0.iter_mut().find(|(id, _)| *id == asset_id) {
            Some(entry) => entry.1 = delta,
            None => self.0.push((asset_id, delta)),
        }
    }

    pub fn get(&self, asset_id: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(id, _)| id == asset_id)
            .map(|(_, delta)| delta.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(id, delta)| (id.as_str(), delta.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for TokenDiff {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (asset_id, delta) in &self.0 {
            map.serialize_entry(asset_id, delta)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TokenDiff {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DiffVisitor;

        impl<'de> Visitor<'de> for DiffVisitor {
            type Value = TokenDiff;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of asset identifiers to decimal deltas")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<TokenDiff, A::Error> {
                let mut diff = TokenDiff::new();
                while let Some((asset_id, delta)) = access.next_entry::<String, String>()? {
                    diff.insert(asset_id, delta);
                }
                Ok(diff)
            }
        }

        deserializer.deserialize_map(DiffVisitor)
    }
}

/// Single action inside a commitment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    TokenDiff { diff: TokenDiff },
}

/// Time-bounded trade commitment, signed as its exact JSON serialization
///
/// Field order is the serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDiffCommitment {
    pub nonce: String,
    pub signer_id: String,
    pub verifying_contract: String,
    /// Absolute expiry in epoch milliseconds
    pub deadline: String,
    pub intents: Vec<Intent>,
}

impl TokenDiffCommitment {
    /// Canonical payload string; the signature covers exactly these bytes
    pub fn to_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Token diff of the first `token_diff` intent
    pub fn token_diff(&self) -> Option<&TokenDiff> {
        self.intents.iter().find_map(|intent| match intent {
            Intent::TokenDiff { diff } => Some(diff),
        })
    }
}

/// Signed envelope around a serialized commitment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub standard: String,
    /// Serialized commitment exactly as signed
    pub payload: String,
    /// `ed25519:<base58 signature>`
    pub signature: String,
    /// `ed25519:<base58 public key>`
    pub public_key: String,
}

/// Parameter of the relay's `publish_intent` method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishIntent {
    pub signed_data: Commitment,
    pub quote_hashes: Vec<String>,
}
