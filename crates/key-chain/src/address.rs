//! Address encodings supported by a key chain.
//!
//! Both encodings start from `HASH160` of the derived compressed public key:
//!
//! - [`AddressType::Legacy`]: `P2PKH(HASH160(pubkey))`.
//! - [`AddressType::SegwitP2sh`]: `P2SH(HASH160(P2WPKH(HASH160(pubkey))))`.

use std::{fmt, str::FromStr};

use bitcoin::{
    hashes::Hash as _, Address, Network, PubkeyHash, ScriptBuf, ScriptHash, WPubkeyHash,
};
use serde::{Deserialize, Serialize};

use crate::{ChainNode, KeyBackend, KeyChainError, KeyIndex};

/// Address encoding of a key chain, fixed for its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressType {
    /// Pay-to-public-key-hash.
    #[default]
    #[serde(rename = "legacy")]
    Legacy,

    /// Pay-to-script-hash wrapping a P2WPKH witness program.
    #[serde(rename = "segwitP2SH")]
    SegwitP2sh,
}

impl AddressType {
    /// Canonical string form, as used in configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::SegwitP2sh => "segwitP2SH",
        }
    }

    /// Derives the child of `root` at `index` and folds it into this variant's
    /// cached form.
    ///
    /// # Notes
    ///
    /// `SegwitP2sh` keeps only the address. The derived private key is dropped
    /// here, so it cannot be retrieved later through the cache.
    pub(crate) fn derive(
        self,
        backend: &dyn KeyBackend,
        root: &ChainNode,
        index: KeyIndex,
        network: Network,
    ) -> Result<DerivedResult, KeyChainError> {
        let child = backend.derive(root, index)?;

        match self {
            Self::Legacy => Ok(DerivedResult::Node(child)),
            Self::SegwitP2sh => {
                let address = p2sh_p2wpkh_address(backend, &child, network)?;
                Ok(DerivedResult::Address(address))
            }
        }
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(Self::Legacy),
            "segwitP2SH" => Ok(Self::SegwitP2sh),
            other => Err(format!("unknown address type: {other}")),
        }
    }
}

/// Memoized outcome of deriving one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivedResult {
    /// The derived node, for [`AddressType::Legacy`].
    Node(ChainNode),

    /// The derived address, for [`AddressType::SegwitP2sh`].
    Address(Address),
}

impl DerivedResult {
    /// The derived node, if this result kept it.
    pub const fn as_node(&self) -> Option<&ChainNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Address(_) => None,
        }
    }

    /// The precomputed address, if this result is one.
    pub const fn as_address(&self) -> Option<&Address> {
        match self {
            Self::Node(_) => None,
            Self::Address(address) => Some(address),
        }
    }
}

/// P2PKH address of `node`'s public key.
pub fn p2pkh_address(
    backend: &dyn KeyBackend,
    node: &ChainNode,
    network: Network,
) -> Result<Address, KeyChainError> {
    let key_hash = backend.hash160(&node.public_key().serialize());
    let script_pubkey = ScriptBuf::new_p2pkh(&PubkeyHash::from_raw_hash(key_hash));

    Ok(Address::from_script(&script_pubkey, network)?)
}

/// P2SH-wrapped P2WPKH address of `node`'s public key.
pub fn p2sh_p2wpkh_address(
    backend: &dyn KeyBackend,
    node: &ChainNode,
    network: Network,
) -> Result<Address, KeyChainError> {
    let key_hash = backend.hash160(&node.public_key().serialize());
    let witness_script = ScriptBuf::new_p2wpkh(&WPubkeyHash::from_raw_hash(key_hash));

    let script_hash = backend.hash160(witness_script.as_bytes());
    let script_pubkey = ScriptBuf::new_p2sh(&ScriptHash::from_raw_hash(script_hash));

    Ok(Address::from_script(&script_pubkey, network)?)
}

#[cfg(test)]
mod tests {
    use bitcoin::CompressedPublicKey;

    use super::*;
    use crate::{test_utils::master_xpriv, Secp256k1Backend};

    fn node(network: Network) -> ChainNode {
        ChainNode::Unneutered(master_xpriv(network))
    }

    #[test]
    fn test_p2pkh_matches_bitcoin_encoding() {
        for network in [Network::Bitcoin, Network::Testnet] {
            let node = node(network);
            let expected = Address::p2pkh(
                CompressedPublicKey(node.public_key()).pubkey_hash(),
                network,
            );

            let derived = p2pkh_address(&Secp256k1Backend, &node, network).unwrap();
            assert_eq!(derived, expected);
        }

        let mainnet = p2pkh_address(&Secp256k1Backend, &node(Network::Bitcoin), Network::Bitcoin)
            .unwrap()
            .to_string();
        assert!(mainnet.starts_with('1'), "got {mainnet}");
    }

    #[test]
    fn test_p2sh_p2wpkh_matches_bitcoin_encoding() {
        for network in [Network::Bitcoin, Network::Testnet] {
            let node = node(network);
            let expected = Address::p2shwpkh(&CompressedPublicKey(node.public_key()), network);

            let derived = p2sh_p2wpkh_address(&Secp256k1Backend, &node, network).unwrap();
            assert_eq!(derived, expected);
        }

        let testnet =
            p2sh_p2wpkh_address(&Secp256k1Backend, &node(Network::Testnet), Network::Testnet)
                .unwrap()
                .to_string();
        assert!(testnet.starts_with('2'), "got {testnet}");
    }

    #[test]
    fn test_derive_folds_per_variant() {
        let root = node(Network::Bitcoin);
        let index = KeyIndex::new(1).unwrap();

        let legacy = AddressType::Legacy
            .derive(&Secp256k1Backend, &root, index, Network::Bitcoin)
            .unwrap();
        let child = legacy.as_node().expect("legacy keeps the node");
        assert!(!child.is_neutered());
        assert!(legacy.as_address().is_none());

        let segwit = AddressType::SegwitP2sh
            .derive(&Secp256k1Backend, &root, index, Network::Bitcoin)
            .unwrap();
        assert!(segwit.as_node().is_none());
        assert_eq!(
            segwit.as_address(),
            Some(&p2sh_p2wpkh_address(&Secp256k1Backend, child, Network::Bitcoin).unwrap())
        );
    }

    #[test]
    fn test_address_type_strings() {
        for address_type in [AddressType::Legacy, AddressType::SegwitP2sh] {
            assert_eq!(
                address_type.to_string().parse::<AddressType>().unwrap(),
                address_type
            );
        }
        assert!("p2tr".parse::<AddressType>().is_err());
        assert_eq!(AddressType::default(), AddressType::Legacy);
    }
}
