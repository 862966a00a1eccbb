//! Extended key nodes held by a key chain.

use std::fmt;

use bitcoin::{
    bip32::{Fingerprint, Xpriv, Xpub},
    NetworkKind, PrivateKey,
};
use secp256k1::{PublicKey, SECP256K1};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// An extended key in one of its two ownership states.
///
/// An unneutered node can derive private children. A neutered node only carries
/// the public key and chain code, so it derives public children only.
#[derive(Clone, PartialEq, Eq)]
pub enum ChainNode {
    /// Holds private key material.
    Unneutered(Xpriv),

    /// Public key and chain code only.
    Neutered(Xpub),
}

impl ChainNode {
    /// Public-only form of this node.
    pub fn neuter(&self) -> Self {
        Self::Neutered(self.to_xpub())
    }

    /// The [`Xpub`] of this node.
    pub fn to_xpub(&self) -> Xpub {
        match self {
            Self::Unneutered(xpriv) => Xpub::from_priv(SECP256K1, xpriv),
            Self::Neutered(xpub) => *xpub,
        }
    }

    /// Base58 serialization of the node in its own form.
    ///
    /// # Notes
    ///
    /// For an unneutered node this is an `xprv`/`tprv` string. Use
    /// [`ChainNode::neuter`] first when the output may leave the wallet.
    pub fn serialize(&self) -> String {
        match self {
            Self::Unneutered(xpriv) => xpriv.to_string(),
            Self::Neutered(xpub) => xpub.to_string(),
        }
    }

    /// Compressed public key of this node.
    pub fn public_key(&self) -> PublicKey {
        self.to_xpub().public_key
    }

    /// Private key of this node, if it has one.
    pub fn private_key(&self) -> Option<PrivateKey> {
        match self {
            Self::Unneutered(xpriv) => Some(xpriv.to_priv()),
            Self::Neutered(_) => None,
        }
    }

    /// Whether the node holds no private key component.
    pub const fn is_neutered(&self) -> bool {
        matches!(self, Self::Neutered(_))
    }

    /// Fingerprint of this node's public key.
    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            Self::Unneutered(xpriv) => xpriv.fingerprint(SECP256K1),
            Self::Neutered(xpub) => xpub.fingerprint(),
        }
    }

    /// Network kind encoded in the node's version bytes.
    pub const fn network_kind(&self) -> NetworkKind {
        match self {
            Self::Unneutered(xpriv) => xpriv.network,
            Self::Neutered(xpub) => xpub.network,
        }
    }

    /// Depth of the node in its derivation tree.
    pub const fn depth(&self) -> u8 {
        match self {
            Self::Unneutered(xpriv) => xpriv.depth,
            Self::Neutered(xpub) => xpub.depth,
        }
    }
}

impl fmt::Debug for ChainNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_neutered() {
            "Neutered"
        } else {
            "Unneutered"
        };

        f.debug_struct("ChainNode")
            .field("kind", &kind)
            .field("fingerprint", &self.fingerprint())
            .field("depth", &self.depth())
            .finish()
    }
}

impl Drop for ChainNode {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl Zeroize for ChainNode {
    #[inline]
    fn zeroize(&mut self) {
        // NOTE: `SecretKey::non_secure_erase` writes `1`s to the memory.
        match self {
            Self::Unneutered(xpriv) => {
                xpriv.depth.zeroize();
                {
                    let fingerprint: &mut [u8; 4] = xpriv.parent_fingerprint.as_mut();
                    fingerprint.zeroize();
                }
                xpriv.private_key.non_secure_erase();
                {
                    let chaincode: &mut [u8; 32] = xpriv.chain_code.as_mut();
                    chaincode.zeroize();
                }
            }
            // The public key itself is not secret, the chain code still allows
            // deriving every non-hardened child.
            Self::Neutered(xpub) => {
                let chaincode: &mut [u8; 32] = xpub.chain_code.as_mut();
                chaincode.zeroize();
            }
        }
    }
}

impl ZeroizeOnDrop for ChainNode {}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bitcoin::Network;

    use super::*;
    use crate::test_utils::master_xpriv;

    #[test]
    fn test_neuter_keeps_public_key() {
        let node = ChainNode::Unneutered(master_xpriv(Network::Bitcoin));
        let neutered = node.neuter();

        assert!(!node.is_neutered());
        assert!(neutered.is_neutered());
        assert_eq!(node.public_key(), neutered.public_key());
        assert_eq!(node.fingerprint(), neutered.fingerprint());
        assert_eq!(neutered.neuter(), neutered);
    }

    #[test]
    fn test_serialize_matches_form() {
        let node = ChainNode::Unneutered(master_xpriv(Network::Bitcoin));

        let xprv = node.serialize();
        assert!(xprv.starts_with("xprv"));
        assert_eq!(Xpriv::from_str(&xprv).unwrap(), master_xpriv(Network::Bitcoin));

        let xpub = node.neuter().serialize();
        assert!(xpub.starts_with("xpub"));
        assert!(Xpriv::from_str(&xpub).is_err());
        assert_eq!(Xpub::from_str(&xpub).unwrap(), node.to_xpub());
    }

    #[test]
    fn test_private_key_only_when_unneutered() {
        let xpriv = master_xpriv(Network::Testnet);
        let node = ChainNode::Unneutered(xpriv);

        let key = node.private_key().expect("unneutered node has a private key");
        assert_eq!(key.inner, xpriv.private_key);
        assert!(key.compressed);
        assert_eq!(key.network, NetworkKind::Test);
        assert!(node.neuter().private_key().is_none());
    }

    #[test]
    fn test_debug_hides_key_material() {
        let node = ChainNode::Unneutered(master_xpriv(Network::Bitcoin));
        let rendered = format!("{node:?}");

        assert!(rendered.contains("Unneutered"));
        assert!(!rendered.contains(&node.serialize()));
        assert!(!rendered.contains("chain_code"));
    }

    #[test]
    fn test_zeroize() {
        let mut node = ChainNode::Unneutered(master_xpriv(Network::Bitcoin));
        let ChainNode::Unneutered(before) = &node else {
            unreachable!("constructed unneutered");
        };
        assert_ne!(*before.chain_code.as_bytes(), [0u8; 32]);

        node.zeroize();

        let ChainNode::Unneutered(after) = &node else {
            unreachable!("zeroize keeps the variant");
        };
        // NOTE: SecretKey::non_secure_erase writes `1`s to the memory.
        assert_eq!(after.private_key.secret_bytes(), [1u8; 32]);
        assert_eq!(*after.chain_code.as_bytes(), [0u8; 32]);
        assert_eq!(*after.parent_fingerprint.as_bytes(), [0u8; 4]);
        assert_eq!(after.depth, 0);
    }
}
