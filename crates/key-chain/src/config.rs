//! Key chain configuration.

use bitcoin::Network;
use serde::{Deserialize, Serialize};

use crate::{AddressType, KeyChainError};

/// Settings fixed for the lifetime of a [`crate::KeyChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyChainConfig {
    /// Network whose version bytes and address prefixes the chain uses.
    pub network: Network,

    /// Address encoding of derived keys.
    #[serde(default)]
    pub address_type: AddressType,
}

impl KeyChainConfig {
    /// Creates a new config.
    pub const fn new(network: Network, address_type: AddressType) -> Self {
        Self {
            network,
            address_type,
        }
    }

    /// Parses a config from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, KeyChainError> {
        Ok(toml::from_str(s)?)
    }
}

impl Default for KeyChainConfig {
    fn default() -> Self {
        Self::new(Network::Bitcoin, AddressType::Legacy)
    }
}
