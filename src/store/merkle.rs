//! # Bucketed Merkle Tree
//!
//! A complete binary tree of fixed depth `d` over `2^d` buckets. Each bucket
//! holds the leaf digests of the keys assigned to it; the bucket digest is the
//! hash of the sorted concatenation of those leaves, so insertion order inside
//! a bucket never matters.
//!
//! Rows are stored top-down: `rows[0]` is the root, `rows[d]` the bucket row.
//! Siblings in row `i` differ in bit `i - 1`, so the node at row `i - 1`,
//! position `q` covers every bucket whose low `i - 1` bits equal `q`. This is
//! the same low-bit split the bucket assignment uses.
//!
//! After [`HashTree::build`] every row is fully populated; `add` and `delete`
//! only touch one bucket and its `d` ancestors.

use std::collections::HashMap;

use crate::error::{Error, Result};

use super::bucket::{bucket_index, MAX_TREE_DEPTH};
use super::digest::{Digest, DigestPrimitive};

/// Serialized key bytes mapped to that key's current leaf digest.
pub type LeafMap = HashMap<Vec<u8>, Digest>;

#[derive(Debug, Clone)]
pub struct HashTree {
    depth: u32,
    primitive: DigestPrimitive,
    buckets: Vec<Vec<Digest>>,
    rows: Vec<Vec<Digest>>,
}

impl HashTree {
    /// Build a tree of the given depth from a snapshot of the leaf map.
    ///
    /// Costs O(n + 2^depth); `depth` must not exceed [`MAX_TREE_DEPTH`].
    /// Later changes to the map only reach this tree
    /// through [`add`](Self::add) and [`delete`](Self::delete).
    pub fn build(leaves: &LeafMap, depth: u32, primitive: DigestPrimitive) -> Self {
        debug_assert!(depth <= MAX_TREE_DEPTH, "tree depth {} out of range", depth);
        let bucket_count = 1usize << depth;
        let mut buckets = vec![Vec::new(); bucket_count];
        for (key, leaf) in leaves {
            buckets[bucket_index(key, depth)].push(leaf.clone());
        }

        let mut rows: Vec<Vec<Digest>> = (0..=depth)
            .map(|row| vec![Vec::new(); 1usize << row])
            .collect();
        rows[depth as usize] = buckets
            .iter_mut()
            .map(|bucket| hash_bucket(&primitive, bucket))
            .collect();

        for row in (1..=depth as usize).rev() {
            let half = 1usize << (row - 1);
            for parent in 0..half {
                let digest = primitive.digest_concat([
                    rows[row][parent].as_slice(),
                    rows[row][parent | half].as_slice(),
                ]);
                rows[row - 1][parent] = digest;
            }
        }

        Self {
            depth,
            primitive,
            buckets,
            rows,
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn root_digest(&self) -> &Digest {
        &self.rows[0][0]
    }

    /// Digest of one bucket (the leaf row of the tree).
    pub fn bucket_digest(&self, bucket: usize) -> Option<&Digest> {
        self.rows[self.depth as usize].get(bucket)
    }

    /// Number of leaf digests held across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    /// Insert a leaf digest into the key's bucket and rehash up to the root.
    pub fn add(&mut self, key: &[u8], leaf: Digest) {
        let bucket = bucket_index(key, self.depth);
        self.buckets[bucket].push(leaf);
        self.rehash(bucket);
    }

    /// Remove exactly one occurrence of `leaf` from the key's bucket.
    ///
    /// Fails with [`Error::InconsistentState`] when the bucket does not hold
    /// that digest; the tree is left untouched in that case.
    pub fn delete(&mut self, key: &[u8], leaf: &Digest) -> Result<()> {
        let bucket = bucket_index(key, self.depth);
        let members = &mut self.buckets[bucket];
        let position = members
            .iter()
            .position(|member| member == leaf)
            .ok_or(Error::InconsistentState {
                depth: self.depth,
                bucket,
            })?;
        members.swap_remove(position);
        self.rehash(bucket);
        Ok(())
    }

    fn rehash(&mut self, bucket: usize) {
        let depth = self.depth as usize;
        self.rows[depth][bucket] = hash_bucket(&self.primitive, &mut self.buckets[bucket]);

        let mut position = bucket;
        for row in (1..=depth).rev() {
            let half = 1usize << (row - 1);
            let parent = position & (half - 1);
            let digest = self.primitive.digest_concat([
                self.rows[row][parent].as_slice(),
                self.rows[row][parent | half].as_slice(),
            ]);
            self.rows[row - 1][parent] = digest;
            position = parent;
        }
    }
}

/// Sorts the bucket in place, then hashes the concatenation of its members.
fn hash_bucket(primitive: &DigestPrimitive, members: &mut [Digest]) -> Digest {
    members.sort_unstable();
    primitive.digest_concat(members.iter().map(Vec::as_slice))
}
