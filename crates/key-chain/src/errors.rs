//! Errors raised by the key chain.

use std::convert::Infallible;

use bitcoin::{address::FromScriptError, bip32};
use thiserror::Error;

/// Error type for key chain operations.
#[derive(Debug, Error)]
pub enum KeyChainError {
    /// The derivation index is not an integer in `0..2^31`.
    #[error("key index must be an integer >= 0 and < 2^31, got {0}")]
    InvalidIndex(String),

    /// A derivation was requested before the chain root was set.
    #[error("key chain is not initialized")]
    Uninitialized,

    /// A supplied extended key or cached chain node could not be decoded.
    #[error("malformed extended key: {0}")]
    MalformedKey(String),

    /// BIP32 child derivation failed.
    #[error("BIP32 derivation error: {0}")]
    Derivation(#[from] bip32::Error),

    /// The output script could not be turned into an address.
    #[error("address encoding error: {0}")]
    Address(#[from] FromScriptError),

    /// The key chain configuration could not be parsed.
    #[error("invalid key chain config: {0}")]
    Config(#[from] toml::de::Error),
}

impl From<Infallible> for KeyChainError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
