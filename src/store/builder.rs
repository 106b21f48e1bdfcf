//! Background construction of hash trees.
//!
//! A [`TreeHandle`] starts out owning a worker thread that builds the tree
//! from a leaf-map snapshot. The worker owns the tree exclusively until it
//! finishes; joining it is the one-shot hand-off. Every access through the
//! handle goes through [`TreeHandle::ready`], which blocks on that join first.

use log::{debug, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{Error, Result};

use super::digest::{Digest, DigestPrimitive};
use super::merkle::{HashTree, LeafMap};

#[derive(Debug)]
enum TreeState {
    Building(JoinHandle<HashTree>),
    Ready(HashTree),
    Failed(String),
}

/// A hash tree that may still be under construction.
#[derive(Debug)]
pub struct TreeHandle {
    depth: u32,
    state: TreeState,
}

impl TreeHandle {
    /// Start building a tree of `depth` from `snapshot` on a worker thread.
    ///
    /// Falls back to building inline when no thread can be spawned.
    pub fn spawn(snapshot: Arc<LeafMap>, depth: u32, primitive: DigestPrimitive) -> Self {
        let worker_snapshot = Arc::clone(&snapshot);
        let worker_primitive = primitive.clone();
        let spawned = thread::Builder::new()
            .name(format!("hash-tree-d{}", depth))
            .spawn(move || {
                let tree = HashTree::build(&worker_snapshot, depth, worker_primitive);
                debug!("Built depth-{} hash tree over {} leaves", depth, tree.len());
                tree
            });

        let state = match spawned {
            Ok(handle) => TreeState::Building(handle),
            Err(e) => {
                warn!(
                    "Could not spawn builder for depth-{} hash tree ({}), building inline",
                    depth, e
                );
                TreeState::Ready(HashTree::build(&snapshot, depth, primitive))
            }
        };

        Self { depth, state }
    }

    /// Wrap an already built tree.
    pub fn from_tree(tree: HashTree) -> Self {
        Self {
            depth: tree.depth(),
            state: TreeState::Ready(tree),
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Whether the tree can be used without blocking.
    pub fn is_ready(&self) -> bool {
        match &self.state {
            TreeState::Building(handle) => handle.is_finished(),
            TreeState::Ready(_) | TreeState::Failed(_) => true,
        }
    }

    /// Whether a joined build ended in a panic. A build that is still running
    /// reports `false` until [`ready`](Self::ready) has joined it.
    pub fn is_failed(&self) -> bool {
        matches!(self.state, TreeState::Failed(_))
    }

    /// Wait for construction to finish and return the tree.
    pub fn ready(&mut self) -> Result<&mut HashTree> {
        let state = std::mem::replace(&mut self.state, TreeState::Failed(String::new()));
        self.state = match state {
            TreeState::Building(handle) => match handle.join() {
                Ok(tree) => TreeState::Ready(tree),
                Err(panic) => TreeState::Failed(panic_message(panic.as_ref())),
            },
            settled => settled,
        };

        match &mut self.state {
            TreeState::Ready(tree) => Ok(tree),
            TreeState::Failed(message) => Err(Error::BuildFailed {
                depth: self.depth,
                message: message.clone(),
            }),
            TreeState::Building(_) => unreachable!("builder joined above"),
        }
    }

    /// Root digest, or [`Error::NotReady`] if the worker is still running.
    pub fn try_root_digest(&mut self) -> Result<Digest> {
        if !self.is_ready() {
            return Err(Error::NotReady { depth: self.depth });
        }
        self.root_digest()
    }

    /// Root digest, blocking until construction has finished.
    pub fn root_digest(&mut self) -> Result<Digest> {
        Ok(self.ready()?.root_digest().clone())
    }

    pub fn add(&mut self, key: &[u8], leaf: Digest) -> Result<()> {
        self.ready()?.add(key, leaf);
        Ok(())
    }

    pub fn delete(&mut self, key: &[u8], leaf: &Digest) -> Result<()> {
        self.ready()?.delete(key, leaf)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "builder thread panicked".to_string()
    }
}
