//! # hashed_kv
//!
//! An in-memory key-value map that keeps a cryptographic digest of its
//! contents up to date as entries are inserted and removed. Two maps holding
//! the same entries produce the same digest, whatever order they were built in.
//!
//! Digests come from fixed-depth bucketed hash trees. A small window of trees
//! at neighbouring depths is kept warm so the map can grow or shrink across a
//! power of two without recomputing everything on the spot.

pub mod config;
pub mod error;
pub mod protocol;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use store::{
    Digest, DigestEngine, DigestPrimitive, EntryCodec, HashAlgorithm, HashedMap, KvStore,
    RwLockEngine,
};
