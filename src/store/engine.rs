//! # Digest Engine
//!
//! The engine sits beside a container's own storage and is told about every
//! change through two hooks, [`DigestEngine::on_set`] and
//! [`DigestEngine::on_delete`]. It keeps the leaf digest of every live key,
//! pushes each change into all warm trees, then lets the cache window settle
//! around the new size.
//!
//! The leaf map is shared copy-on-write with tree builders: a builder gets an
//! `Arc` snapshot and drops it when its tree is done. A mutation that lands
//! while a build still holds the snapshot pays one O(n) copy of the map; once
//! every build has finished, mutations update the map in place.
//!
//! A mutation is applied to the warm trees first and committed to the leaf
//! map only when every tree accepted it. On failure the leaf map is left as it
//! was and the trees that saw the change are rebuilt from it.
//!
//! Reconciliation always uses the size *after* the mutation, on both paths.

use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::error::Result;

use super::bucket::depth_for_len;
use super::digest::{Digest, DigestPrimitive};
use super::merkle::LeafMap;
use super::window::{cache_window_size, CacheWindow};

#[derive(Debug)]
pub struct DigestEngine {
    primitive: DigestPrimitive,
    leaves: Arc<LeafMap>,
    window: CacheWindow,
}

impl DigestEngine {
    /// Create an engine for an empty container.
    ///
    /// Fails if `window_size` is zero.
    pub fn new(primitive: DigestPrimitive, window_size: usize) -> Result<Self> {
        Ok(Self::with_window(primitive, cache_window_size(window_size)?))
    }

    pub fn with_window(primitive: DigestPrimitive, window_size: NonZeroUsize) -> Self {
        let mut window = CacheWindow::new(window_size, primitive.clone());
        let leaves = Arc::new(LeafMap::new());
        window.reconcile(&leaves);
        Self {
            primitive,
            leaves,
            window,
        }
    }

    pub fn primitive(&self) -> &DigestPrimitive {
        &self.primitive
    }

    pub fn cache_window_size(&self) -> usize {
        self.window.size()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Current leaf digest of a serialized key.
    pub fn leaf_digest(&self, key: &[u8]) -> Option<&Digest> {
        self.leaves.get(key)
    }

    /// Depths of the trees currently kept warm.
    pub fn warm_depths(&self) -> Vec<u32> {
        self.window.warm_depths()
    }

    /// Depth of the tree that answers digest queries at the current size.
    pub fn current_depth(&self) -> u32 {
        depth_for_len(self.leaves.len())
    }

    /// Record that `key` now maps to `value` (both serialized).
    ///
    /// An existing leaf for the key is replaced in every warm tree. On error
    /// the engine still describes the contents it had before the call.
    pub fn on_set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let leaf = self.primitive.leaf_digest(key, value);
        let applied = match self.leaves.get(key) {
            Some(previous) => {
                let previous = previous.clone();
                self.window.apply_replace(key, &previous, &leaf)
            }
            None => self.window.apply_add(key, &leaf),
        };
        if let Err(e) = applied {
            self.window.reconcile(&self.leaves);
            return Err(e);
        }

        Arc::make_mut(&mut self.leaves).insert(key.to_vec(), leaf);
        self.window.reconcile(&self.leaves);
        Ok(())
    }

    /// Record that `key` was removed. Returns `false` if it had no leaf.
    pub fn on_delete(&mut self, key: &[u8]) -> Result<bool> {
        let Some(leaf) = self.leaves.get(key).cloned() else {
            return Ok(false);
        };
        if let Err(e) = self.window.apply_delete(key, &leaf) {
            self.window.reconcile(&self.leaves);
            return Err(e);
        }

        Arc::make_mut(&mut self.leaves).remove(key);
        self.window.reconcile(&self.leaves);
        Ok(true)
    }

    /// Forget every key and rebuild the window for an empty container.
    pub fn clear(&mut self) {
        self.leaves = Arc::new(LeafMap::new());
        self.window.reset(&self.leaves);
    }

    /// Root digest for the current size, blocking while its tree builds.
    pub fn current_digest(&mut self) -> Result<Digest> {
        let depth = self.current_depth();
        self.window.root_digest(depth)
    }

    /// Root digest for the current size, or `NotReady` while its tree builds.
    pub fn try_current_digest(&mut self) -> Result<Digest> {
        let depth = self.current_depth();
        self.window.try_root_digest(depth)
    }
}
