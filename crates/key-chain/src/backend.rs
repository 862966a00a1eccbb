//! Cryptographic capabilities consumed by the key chain.
//!
//! The chain never talks to `secp256k1` or the BIP32 codec directly for
//! anything that touches derivation. It goes through a [`KeyBackend`] handed
//! to [`crate::KeyChain::with_backend`], which keeps the crypto provider
//! substitutable per instance.

use std::{fmt, str::FromStr};

use bitcoin::{
    bip32::{Xpriv, Xpub},
    hashes::{hash160, Hash},
    Network, NetworkKind,
};
use secp256k1::SECP256K1;

use crate::{ChainNode, KeyChainError, KeyIndex};

/// Extended-key codec and hash primitive used by a key chain.
pub trait KeyBackend: fmt::Debug + Send + Sync {
    /// Decodes a base58 extended key (private or public) for `network`.
    fn parse(&self, encoded: &str, network: Network) -> Result<ChainNode, KeyChainError>;

    /// Derives the non-hardened child of `node` at `index`.
    fn derive(&self, node: &ChainNode, index: KeyIndex) -> Result<ChainNode, KeyChainError>;

    /// `RIPEMD160(SHA256(bytes))`.
    fn hash160(&self, bytes: &[u8]) -> hash160::Hash;
}

/// [`KeyBackend`] backed by `bitcoin::bip32` and the global secp256k1 context.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Backend;

impl KeyBackend for Secp256k1Backend {
    fn parse(&self, encoded: &str, network: Network) -> Result<ChainNode, KeyChainError> {
        let node = match Xpriv::from_str(encoded) {
            Ok(xpriv) => ChainNode::Unneutered(xpriv),
            Err(priv_err) => match Xpub::from_str(encoded) {
                Ok(xpub) => ChainNode::Neutered(xpub),
                Err(_) => return Err(KeyChainError::MalformedKey(priv_err.to_string())),
            },
        };

        let expected = NetworkKind::from(network);
        if node.network_kind() != expected {
            return Err(KeyChainError::MalformedKey(format!(
                "extended key is for {:?}, expected {expected:?}",
                node.network_kind()
            )));
        }

        Ok(node)
    }

    fn derive(&self, node: &ChainNode, index: KeyIndex) -> Result<ChainNode, KeyChainError> {
        let path = [index.child_number()];

        Ok(match node {
            ChainNode::Unneutered(xpriv) => {
                ChainNode::Unneutered(xpriv.derive_priv(SECP256K1, &path)?)
            }
            ChainNode::Neutered(xpub) => ChainNode::Neutered(xpub.derive_pub(SECP256K1, &path)?),
        })
    }

    fn hash160(&self, bytes: &[u8]) -> hash160::Hash {
        hash160::Hash::hash(bytes)
    }
}
