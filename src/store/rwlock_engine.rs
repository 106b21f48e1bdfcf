//! # Thread-Safe Hashed Store
//!
//! The digest engine expects mutations to arrive one at a time. This module
//! provides that serialization for callers that share a store across threads:
//! a `HashedMap<String, String>` behind an `RwLock`.
//!
//! - **Reads** (`get`, `keys`, `len`) take a shared read lock
//! - **Writes** (`set`, `delete`) take the exclusive write lock
//! - **Digest queries** also take the write lock, because finishing a pending
//!   tree build moves the tree into the map

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::digest::Digest;
use super::hashed_map::HashedMap;
use super::kv_trait::KvStore;
use crate::config::Config;
use crate::error::Result;

/// Thread-safe string store that keeps a digest of its contents.
///
/// Clones share the same underlying map.
#[derive(Clone, Debug)]
pub struct RwLockEngine {
    data: Arc<RwLock<HashedMap<String, String>>>,
}

impl RwLockEngine {
    /// Create an empty store with default settings.
    pub fn new() -> Self {
        Self::from_map(HashedMap::new())
    }

    /// Create an empty store configured from `config`.
    pub fn with_config(config: &Config) -> Result<Self> {
        Ok(Self::from_map(HashedMap::with_config(config)?))
    }

    pub fn from_map(map: HashedMap<String, String>) -> Self {
        Self {
            data: Arc::new(RwLock::new(map)),
        }
    }

    // Poisoned locks are recovered. A writer that panicked mid-insert may have
    // left the digest out of step with the entries.
    fn read(&self) -> RwLockReadGuard<'_, HashedMap<String, String>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashedMap<String, String>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RwLockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for RwLockEngine {
    fn get(&self, key: &str) -> Option<String> {
        self.read().get(key).cloned()
    }

    fn set(&self, key: String, value: String) -> Result<()> {
        self.write().insert(key, value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.write().remove(key)?.is_some())
    }

    fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.read().len()
    }

    fn root_digest(&self) -> Result<Digest> {
        self.write().digest()
    }
}
