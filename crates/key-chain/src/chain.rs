//! The key chain aggregate.
//!
//! A [`KeyChain`] owns one chain root, established at most once, and a memo
//! table of everything derived from it. Derivation results never change for a
//! given index, so the table only ever grows.

use std::{collections::HashMap, fmt, sync::Arc};

use bitcoin::{Network, PrivateKey};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use tracing::{debug, trace};

use crate::{
    address::p2pkh_address, AddressType, ChainNode, DerivedResult, KeyBackend, KeyChainConfig,
    KeyChainError, KeyIndex, Secp256k1Backend,
};

/// Where a key chain gets its root from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainSource<'a> {
    /// A previously serialized chain root, used as is.
    Restore(&'a str),

    /// A parent extended key whose child at `index` becomes the chain root.
    Derive {
        /// Base58 parent extended key.
        extended_key: &'a str,
        /// Child index of the chain root under `extended_key`.
        index: KeyIndex,
    },

    /// Nothing. The chain stays uninitialized.
    Empty,
}

impl<'a> ChainSource<'a> {
    /// Picks a source from the raw arguments a wallet layer carries.
    ///
    /// A cached node always wins. Otherwise both an extended key and a valid
    /// index are needed; anything short of that yields [`ChainSource::Empty`].
    pub fn from_parts(
        extended_key: Option<&'a str>,
        index: Option<i64>,
        cached: Option<&'a str>,
    ) -> Self {
        if let Some(cached) = cached {
            return Self::Restore(cached);
        }

        let index = index.and_then(|index| KeyIndex::try_from(index).ok());
        match (extended_key, index) {
            (Some(extended_key), Some(index)) => Self::Derive {
                extended_key,
                index,
            },
            _ => Self::Empty,
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Restore(_) => "restore",
            Self::Derive { .. } => "derive",
            Self::Empty => "empty",
        }
    }
}

/// Lifecycle of the chain root.
#[derive(Debug)]
enum ChainState {
    Uninitialized,
    Initialized(ChainNode),
}

/// HD key chain deriving memoized addresses and private keys per index.
pub struct KeyChain {
    address_type: AddressType,
    network: Network,
    backend: Arc<dyn KeyBackend>,
    state: RwLock<ChainState>,
    cache: RwLock<HashMap<KeyIndex, DerivedResult>>,
}

impl KeyChain {
    /// Creates a key chain with the default [`Secp256k1Backend`] and
    /// initializes it from `source`.
    pub fn new(config: KeyChainConfig, source: ChainSource<'_>) -> Result<Self, KeyChainError> {
        Self::with_backend(config, Arc::new(Secp256k1Backend), source)
    }

    /// Creates a key chain on top of `backend` and initializes it from
    /// `source`.
    pub fn with_backend(
        config: KeyChainConfig,
        backend: Arc<dyn KeyBackend>,
        source: ChainSource<'_>,
    ) -> Result<Self, KeyChainError> {
        let chain = Self {
            address_type: config.address_type,
            network: config.network,
            backend,
            state: RwLock::new(ChainState::Uninitialized),
            cache: RwLock::new(HashMap::new()),
        };
        chain.init(source)?;

        Ok(chain)
    }

    /// Sets the chain root from `source` unless it is already set.
    ///
    /// Once initialized, every further call returns `Ok(())` without looking at
    /// `source`, so addresses handed out earlier stay valid.
    pub fn init(&self, source: ChainSource<'_>) -> Result<(), KeyChainError> {
        let mut state = self.state.write();

        if let ChainState::Initialized(root) = &*state {
            debug!(
                fingerprint = %root.fingerprint(),
                source = source.kind(),
                "key chain already initialized, ignoring"
            );
            return Ok(());
        }

        let root = match source {
            ChainSource::Restore(cached) => self.backend.parse(cached, self.network)?,
            ChainSource::Derive {
                extended_key,
                index,
            } => {
                let parent = self.backend.parse(extended_key, self.network)?;
                self.backend.derive(&parent, index)?
            }
            ChainSource::Empty => {
                debug!("no chain source given, key chain stays uninitialized");
                return Ok(());
            }
        };

        debug!(
            source = source.kind(),
            fingerprint = %root.fingerprint(),
            neutered = root.is_neutered(),
            address_type = %self.address_type,
            "initialized key chain"
        );
        *state = ChainState::Initialized(root);

        Ok(())
    }

    /// Derives the result for `index`, computing it at most once.
    pub fn derive_at<I>(&self, index: I) -> Result<DerivedResult, KeyChainError>
    where
        I: TryInto<KeyIndex>,
        KeyChainError: From<I::Error>,
    {
        let index: KeyIndex = index.try_into()?;

        if let Some(hit) = self.cache.read().get(&index) {
            trace!(%index, "derivation cache hit");
            return Ok(hit.clone());
        }

        // Only one upgradable guard exists at a time, so a miss is computed by
        // exactly one caller.
        let cache = self.cache.upgradable_read();
        if let Some(hit) = cache.get(&index) {
            trace!(%index, "derivation cache hit after wait");
            return Ok(hit.clone());
        }

        let derived = {
            let state = self.state.read();
            let ChainState::Initialized(root) = &*state else {
                return Err(KeyChainError::Uninitialized);
            };
            self.address_type
                .derive(self.backend.as_ref(), root, index, self.network)?
        };
        trace!(%index, "derivation cache miss, stored");

        let mut cache = RwLockUpgradableReadGuard::upgrade(cache);
        cache.insert(index, derived.clone());

        Ok(derived)
    }

    /// Address of the key at `index`.
    pub fn address<I>(&self, index: I) -> Result<String, KeyChainError>
    where
        I: TryInto<KeyIndex>,
        KeyChainError: From<I::Error>,
    {
        match self.derive_at(index)? {
            DerivedResult::Node(node) => {
                Ok(p2pkh_address(self.backend.as_ref(), &node, self.network)?.to_string())
            }
            DerivedResult::Address(address) => Ok(address.to_string()),
        }
    }

    /// Private key at `index`.
    ///
    /// `None` when the chain root is neutered, and always `None` for
    /// [`AddressType::SegwitP2sh`] since only its address is kept.
    pub fn private_key<I>(&self, index: I) -> Result<Option<PrivateKey>, KeyChainError>
    where
        I: TryInto<KeyIndex>,
        KeyChainError: From<I::Error>,
    {
        Ok(match self.derive_at(index)? {
            DerivedResult::Node(node) => node.private_key(),
            DerivedResult::Address(_) => None,
        })
    }

    /// Base58 of the neutered chain root, `None` if uninitialized.
    pub fn xpub(&self) -> Option<String> {
        self.with_root(|root| root.neuter().serialize())
    }

    /// Base58 of the chain root in its own form, `None` if uninitialized.
    ///
    /// This is the value to pass back as [`ChainSource::Restore`]. It holds the
    /// private key when the root is unneutered.
    pub fn serialize(&self) -> Option<String> {
        self.with_root(ChainNode::serialize)
    }

    /// Whether the chain root lacks a private key, `None` if uninitialized.
    pub fn is_neutered(&self) -> Option<bool> {
        self.with_root(ChainNode::is_neutered)
    }

    /// Whether the chain root has been set.
    pub fn is_initialized(&self) -> bool {
        matches!(*self.state.read(), ChainState::Initialized(_))
    }

    /// Address encoding of this chain.
    pub const fn address_type(&self) -> AddressType {
        self.address_type
    }

    /// Network of this chain.
    pub const fn network(&self) -> Network {
        self.network
    }

    fn with_root<T>(&self, f: impl FnOnce(&ChainNode) -> T) -> Option<T> {
        match &*self.state.read() {
            ChainState::Initialized(root) => Some(f(root)),
            ChainState::Uninitialized => None,
        }
    }
}

impl fmt::Debug for KeyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyChain")
            .field("address_type", &self.address_type)
            .field("network", &self.network)
            .field("backend", &self.backend)
            .field("initialized", &self.is_initialized())
            .field("cached", &self.cache.read().len())
            .finish()
    }
}
