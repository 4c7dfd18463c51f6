//! Account and signing capabilities
//!
//! Private keys live only in [`KeyPairSigner`]. Everything else talks to the
//! chain through [`ChainAccount`] and [`MessageSigner`].

mod account;
mod near;
mod signer;

pub use account::{ChainAccount, FunctionCall, ONE_YOCTO, TGAS};
pub use near::NearRpcAccount;
pub use signer::{
    decode_ed25519, encode_ed25519, KeyPairSigner, MessageSigner, SignedMessage, ED25519_PREFIX,
};
