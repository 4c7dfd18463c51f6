//! Intent protocol: relay quotes, signed commitments, and on-chain settlement

pub mod commitment;
pub mod relay;
pub mod settlement;
pub mod types;

pub use commitment::{verify_commitment, CommitmentSigner};
pub use relay::{build_request, select_best, HttpSolverRelay, PublishResult, SolverRelay};
pub use settlement::{SettlementClient, StorageRegistration, TokenBalance};
pub use types::{Commitment, Intent, IntentRequest, PublishIntent, Quote, TokenDiff, TokenDiffCommitment};
