//! # KV Store Trait
//!
//! The common interface for string key-value stores that expose a content
//! digest. It is object safe, so callers can hold a `Box<dyn KvStore>`, and
//! implementations must be safe to share across threads.
//!
//! ## Implementations
//!
//! - `RwLockEngine`: a `HashedMap<String, String>` behind an `RwLock`

use crate::error::Result;
use crate::store::digest::Digest;

/// Common interface for digest-tracking key-value stores.
pub trait KvStore: Send + Sync {
    /// Retrieve a value by its key.
    ///
    /// # Returns
    /// * `Option<String>` - The value if found, None otherwise
    fn get(&self, key: &str) -> Option<String>;

    /// Store a key-value pair, replacing any previous value.
    fn set(&self, key: String, value: String) -> Result<()>;

    /// Delete a key-value pair.
    ///
    /// # Returns
    /// * `Result<bool>` - True if the key existed and was deleted
    fn delete(&self, key: &str) -> Result<bool>;

    /// All keys currently stored, in no particular order.
    fn keys(&self) -> Vec<String>;

    /// Get the number of key-value pairs in the store.
    fn len(&self) -> usize;

    /// Check if the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Digest of the complete contents of the store.
    fn root_digest(&self) -> Result<Digest>;
}
