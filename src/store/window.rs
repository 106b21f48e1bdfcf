//! # Cache Window
//!
//! Keeps a bounded set of hash trees warm, one per depth, centred on the
//! depth the current map size needs. A container hovering around a power of
//! two then flips between trees that are already built instead of rebuilding
//! on every crossing.
//!
//! For window size `W` and current depth `c` the warm depths are
//! `[max(0, c - W/2), max(0, c - W/2) + W)`, cut off above `MAX_TREE_DEPTH`.
//! Reconciliation runs once per mutation: trees outside the window and trees
//! whose build failed are dropped, missing ones are spawned from a snapshot
//! of the leaf map.
//!
//! A mutation reaches either every warm tree or none of them. When one tree
//! rejects it, every tree already touched is dropped along with the failing
//! one, and the next reconciliation rebuilds them from the leaf map.

use log::{debug, warn};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::sync::Arc;

use crate::error::{Error, Result};

use super::bucket::{depth_for_len, MAX_TREE_DEPTH};
use super::builder::TreeHandle;
use super::digest::{Digest, DigestPrimitive};
use super::merkle::LeafMap;

/// Default number of warm trees.
pub const DEFAULT_CACHE_WINDOW_SIZE: usize = 3;

/// Largest accepted window. An empty map already warms depths `0..W`.
pub const MAX_CACHE_WINDOW_SIZE: usize = 16;

pub(crate) const DEFAULT_WINDOW: NonZeroUsize = match NonZeroUsize::new(DEFAULT_CACHE_WINDOW_SIZE) {
    Some(size) => size,
    None => panic!("default cache window size must be non-zero"),
};

/// Validate a configured window size.
pub fn cache_window_size(size: usize) -> Result<NonZeroUsize> {
    if size > MAX_CACHE_WINDOW_SIZE {
        return Err(Error::configuration(format!(
            "cache window size {} exceeds the maximum of {}",
            size, MAX_CACHE_WINDOW_SIZE
        )));
    }
    NonZeroUsize::new(size)
        .ok_or_else(|| Error::configuration("cache window size must be at least 1"))
}

/// Depths a window of `size` trees keeps warm around `depth`.
///
/// The range never reaches past [`MAX_TREE_DEPTH`].
pub fn window_for(depth: u32, size: usize) -> Range<u32> {
    let depth = depth.min(MAX_TREE_DEPTH);
    let size = u32::try_from(size).unwrap_or(u32::MAX);
    let start = depth.saturating_sub(size / 2);
    start..start.saturating_add(size).min(MAX_TREE_DEPTH + 1)
}

#[derive(Debug)]
pub struct CacheWindow {
    size: NonZeroUsize,
    primitive: DigestPrimitive,
    trees: BTreeMap<u32, TreeHandle>,
}

impl CacheWindow {
    /// Create an empty window. Call [`reconcile`](Self::reconcile) to populate it.
    pub fn new(size: NonZeroUsize, primitive: DigestPrimitive) -> Self {
        Self {
            size,
            primitive,
            trees: BTreeMap::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size.get()
    }

    /// Depths currently held, ready or still building.
    pub fn warm_depths(&self) -> Vec<u32> {
        self.trees.keys().copied().collect()
    }

    /// Whether the tree for `depth` exists and has finished building.
    pub fn is_ready(&self, depth: u32) -> bool {
        self.trees.get(&depth).map_or(false, TreeHandle::is_ready)
    }

    /// Apply an insertion to every warm tree.
    pub fn apply_add(&mut self, key: &[u8], leaf: &Digest) -> Result<()> {
        self.apply(|tree| tree.add(key, leaf.clone()))
    }

    /// Swap `previous` for `leaf` in every warm tree.
    pub fn apply_replace(&mut self, key: &[u8], previous: &Digest, leaf: &Digest) -> Result<()> {
        self.apply(|tree| {
            tree.delete(key, previous)?;
            tree.add(key, leaf.clone())
        })
    }

    /// Apply a deletion to every warm tree.
    pub fn apply_delete(&mut self, key: &[u8], leaf: &Digest) -> Result<()> {
        self.apply(|tree| tree.delete(key, leaf))
    }

    fn apply<F>(&mut self, mut op: F) -> Result<()>
    where
        F: FnMut(&mut TreeHandle) -> Result<()>,
    {
        let mut touched = Vec::with_capacity(self.trees.len());
        let mut failure = None;
        for (&depth, tree) in self.trees.iter_mut() {
            touched.push(depth);
            if let Err(e) = op(tree) {
                failure = Some(e);
                break;
            }
        }

        let Some(e) = failure else {
            return Ok(());
        };
        warn!(
            "Dropping hash trees at depths {:?} after a rejected update: {}",
            touched, e
        );
        for depth in touched {
            self.trees.remove(&depth);
        }
        Err(e)
    }

    /// Bring the warm set in line with a map of `snapshot.len()` entries.
    ///
    /// `snapshot` must already reflect the mutation that triggered this call.
    pub fn reconcile(&mut self, snapshot: &Arc<LeafMap>) {
        let current = depth_for_len(snapshot.len());
        let window = window_for(current, self.size.get());

        let before = self.trees.len();
        self.trees
            .retain(|depth, tree| window.contains(depth) && !tree.is_failed());
        if self.trees.len() != before {
            debug!(
                "Evicted {} hash tree(s), keeping depths {:?}",
                before - self.trees.len(),
                window
            );
        }

        for depth in window {
            if self.trees.contains_key(&depth) {
                continue;
            }
            debug!(
                "Spawning depth-{} hash tree for {} leaves",
                depth,
                snapshot.len()
            );
            let handle = TreeHandle::spawn(Arc::clone(snapshot), depth, self.primitive.clone());
            self.trees.insert(depth, handle);
        }
    }

    /// Drop every tree and rebuild the window around `snapshot`.
    pub fn reset(&mut self, snapshot: &Arc<LeafMap>) {
        self.trees.clear();
        self.reconcile(snapshot);
    }

    /// Root digest of the tree for `depth`, blocking while it builds.
    pub fn root_digest(&mut self, depth: u32) -> Result<Digest> {
        self.tree_mut(depth)?.root_digest()
    }

    /// Root digest of the tree for `depth`, or [`Error::NotReady`] while it builds.
    pub fn try_root_digest(&mut self, depth: u32) -> Result<Digest> {
        self.tree_mut(depth)?.try_root_digest()
    }

    fn tree_mut(&mut self, depth: u32) -> Result<&mut TreeHandle> {
        self.trees
            .get_mut(&depth)
            .ok_or(Error::NotReady { depth })
    }
}
