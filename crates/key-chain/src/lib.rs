//! Hierarchical-deterministic key chain.
//!
//! A [`KeyChain`] holds one chain root, obtained either by deriving a child of a
//! parent extended key or by restoring a previously serialized node. Child keys
//! below that root are derived lazily, memoized per index, and exposed as
//! addresses or private keys in one of two encodings:
//!
//! - [`AddressType::Legacy`]: pay-to-public-key-hash.
//! - [`AddressType::SegwitP2sh`]: pay-to-script-hash wrapping a P2WPKH program.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bitcoin::Network;
//! use hd_keychain::{AddressType, ChainSource, KeyChain, KeyChainConfig, KeyIndex};
//!
//! let config = KeyChainConfig::new(Network::Bitcoin, AddressType::Legacy);
//! let chain = KeyChain::new(
//!     config,
//!     ChainSource::Derive { extended_key: &account_xpub, index: KeyIndex::new(0)? },
//! )?;
//!
//! let receive = chain.address(0u32)?;
//! let cached = chain.serialize();
//!
//! // Later, without re-deriving the chain root.
//! let restored = KeyChain::new(config, ChainSource::Restore(&cached.unwrap()))?;
//! assert_eq!(restored.address(0u32)?, receive);
//! ```

pub mod address;
pub mod backend;
pub mod chain;
pub mod config;
pub mod errors;
pub mod index;
pub mod node;

#[cfg(test)]
mod test_utils;

pub use address::{AddressType, DerivedResult};
pub use backend::{KeyBackend, Secp256k1Backend};
pub use chain::{ChainSource, KeyChain};
pub use config::KeyChainConfig;
pub use errors::KeyChainError;
pub use index::KeyIndex;
pub use node::ChainNode;
