//! # Storage and Digest Engine
//!
//! - **`digest`**: pluggable hash primitive (SHA-2 family built in)
//! - **`bucket`**: checksum-based bucket assignment and tree sizing
//! - **`merkle`**: fixed-depth bucketed hash tree with O(depth) updates
//! - **`builder`**: background construction of new trees
//! - **`window`**: the rolling set of warm trees of neighbouring depths
//! - **`engine`**: leaf digests plus the set/delete hooks a container calls
//! - **`codec`**: deterministic key/value serialization
//! - **`hashed_map`**: `HashMap` wrapper that keeps a digest of its contents
//! - **`kv_trait`** / **`rwlock_engine`**: thread-safe string store interface
//!
//! ## Data flow
//!
//! A set or delete on a container computes the entry's leaf digest, applies
//! it to every warm tree, then reconciles the warm set with the new size.
//! Digest queries read the root of the tree whose depth matches the size.

pub mod bucket;
pub mod builder;
pub mod codec;
pub mod digest;
pub mod engine;
pub mod hashed_map;
pub mod kv_trait;
pub mod merkle;
pub mod rwlock_engine;
#[cfg(test)]
pub(crate) mod testing;
pub mod window;

pub use codec::EntryCodec;
pub use digest::{Digest, DigestPrimitive, HashAlgorithm, IncrementalHasher};
pub use engine::DigestEngine;
pub use hashed_map::HashedMap;
pub use kv_trait::KvStore;
pub use merkle::HashTree;
pub use rwlock_engine::RwLockEngine;
