//! Fixtures shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use bitcoin::{bip32::Xpriv, hashes::hash160, Network};

use crate::{ChainNode, KeyBackend, KeyChainError, KeyIndex, Secp256k1Backend};

/// BIP32 test vector 1 seed.
pub(crate) const SEED: [u8; 16] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
];

/// Master key of [`SEED`] for `network`.
pub(crate) fn master_xpriv(network: Network) -> Xpriv {
    Xpriv::new_master(network, &SEED).expect("valid seed")
}

/// [`Secp256k1Backend`] that counts child derivations.
#[derive(Debug, Default)]
pub(crate) struct CountingBackend {
    inner: Secp256k1Backend,
    pub(crate) derives: AtomicUsize,
}

impl KeyBackend for CountingBackend {
    fn parse(&self, encoded: &str, network: Network) -> Result<ChainNode, KeyChainError> {
        self.inner.parse(encoded, network)
    }

    fn derive(&self, node: &ChainNode, index: KeyIndex) -> Result<ChainNode, KeyChainError> {
        self.derives.fetch_add(1, Ordering::SeqCst);
        self.inner.derive(node, index)
    }

    fn hash160(&self, bytes: &[u8]) -> hash160::Hash {
        self.inner.hash160(bytes)
    }
}

#[test]
fn test_master_matches_bip32_vector() {
    assert_eq!(
        master_xpriv(Network::Bitcoin).to_string(),
        "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi"
    );
}
