//! # Hashed Map
//!
//! A `HashMap` that can report a cryptographic digest of its full contents at
//! any time. Storage is an ordinary map; every mutation serializes the key and
//! value with the configured [`EntryCodec`] and feeds them to a
//! [`DigestEngine`].
//!
//! Two maps with equal contents, the same algorithm and the same codec report
//! equal digests, regardless of the order the entries were inserted in or
//! what was inserted and removed along the way.

use serde::Serialize;
use std::borrow::Borrow;
use std::collections::hash_map::{self, HashMap};
use std::hash::Hash;

use crate::config::Config;
use crate::error::Result;

use super::codec::EntryCodec;
use super::digest::{Digest, DigestPrimitive};
use super::engine::DigestEngine;
use super::window::DEFAULT_WINDOW;

#[derive(Debug)]
pub struct HashedMap<K, V> {
    entries: HashMap<K, V>,
    codec: EntryCodec,
    engine: DigestEngine,
}

impl<K, V> HashedMap<K, V>
where
    K: Eq + Hash + Serialize,
    V: Serialize,
{
    /// An empty map using SHA-256, bincode and a window of three trees.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            codec: EntryCodec::default(),
            engine: DigestEngine::with_window(DigestPrimitive::sha256(), DEFAULT_WINDOW),
        }
    }

    /// An empty map configured from `config`.
    pub fn with_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Self::with_options(
            DigestPrimitive::from_algorithm(config.algorithm),
            config.cache_window_size,
            config.codec,
        )
    }

    /// An empty map with an explicit primitive, window size and codec.
    pub fn with_options(
        primitive: DigestPrimitive,
        cache_window_size: usize,
        codec: EntryCodec,
    ) -> Result<Self> {
        Ok(Self {
            entries: HashMap::new(),
            codec,
            engine: DigestEngine::new(primitive, cache_window_size)?,
        })
    }

    /// A map configured from `config` and filled from `entries`.
    pub fn from_entries<I>(config: &Config, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::with_config(config)?;
        map.extend_entries(entries)?;
        Ok(map)
    }

    /// Insert or overwrite `key`, returning the previous value.
    ///
    /// On error the map is unchanged.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let key_bytes = self.codec.encode(&key)?;
        let value_bytes = self.codec.encode(&value)?;
        self.engine.on_set(&key_bytes, &value_bytes)?;
        Ok(self.entries.insert(key, value))
    }

    /// Remove `key`, returning its value if it was present.
    ///
    /// On error the entry stays in the map.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<Option<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some((key, value)) = self.entries.remove_entry(key) else {
            return Ok(None);
        };
        let removed = self
            .codec
            .encode(&key)
            .and_then(|key_bytes| self.engine.on_delete(&key_bytes));
        match removed {
            Ok(_) => Ok(Some(value)),
            Err(e) => {
                self.entries.insert(key, value);
                Err(e)
            }
        }
    }

    /// Insert every pair from `entries`, in iteration order.
    pub fn extend_entries<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.insert(key, value)?;
        }
        Ok(())
    }

    /// Return the value for `key`, inserting `default` first if it is absent.
    pub fn get_or_insert(&mut self, key: K, default: V) -> Result<&V>
    where
        K: Clone,
    {
        if !self.entries.contains_key(&key) {
            self.insert(key.clone(), default)?;
        }
        Ok(&self.entries[&key])
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.engine.clear();
    }

    /// Digest of the current contents, waiting for a pending tree build if needed.
    pub fn digest(&mut self) -> Result<Digest> {
        self.engine.current_digest()
    }

    /// Digest of the current contents, or `NotReady` if its tree is still building.
    pub fn try_digest(&mut self) -> Result<Digest> {
        self.engine.try_current_digest()
    }
}

impl<K, V> HashedMap<K, V> {
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q> + Eq + Hash,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q> + Eq + Hash,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, K, V> {
        self.entries.iter()
    }

    pub fn keys(&self) -> hash_map::Keys<'_, K, V> {
        self.entries.keys()
    }

    pub fn values(&self) -> hash_map::Values<'_, K, V> {
        self.entries.values()
    }

    pub fn codec(&self) -> EntryCodec {
        self.codec
    }

    /// The digest engine tracking this map.
    pub fn engine(&self) -> &DigestEngine {
        &self.engine
    }
}

impl<K, V> Default for HashedMap<K, V>
where
    K: Eq + Hash + Serialize,
    V: Serialize,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K, V> IntoIterator for &'a HashedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = hash_map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
