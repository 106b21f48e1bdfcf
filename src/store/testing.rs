//! SHA-256 primitives that misbehave on tree-builder threads only.
//!
//! Digests computed on the caller's thread are never affected, so the
//! hooks that hash leaves inline keep working while builds stall or fail.

use sha2::Sha256;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::digest::{Digest, DigestPrimitive, IncrementalHasher};

const BUILDER_THREAD_PREFIX: &str = "hash-tree-d";

fn current_thread_is(matches: impl Fn(&str) -> bool) -> bool {
    let current = thread::current();
    current.name().map_or(false, matches)
}

struct GatedHasher {
    inner: Sha256,
    gate: Arc<AtomicBool>,
}

impl IncrementalHasher for GatedHasher {
    fn update(&mut self, bytes: &[u8]) {
        sha2::Digest::update(&mut self.inner, bytes);
    }

    fn finalize(self: Box<Self>) -> Digest {
        let this = *self;
        if current_thread_is(|name| name.starts_with(BUILDER_THREAD_PREFIX)) {
            while !this.gate.load(Ordering::Acquire) {
                thread::sleep(Duration::from_millis(1));
            }
        }
        sha2::Digest::finalize(this.inner).to_vec()
    }
}

struct FailingHasher {
    inner: Sha256,
    thread_name: String,
    armed: Arc<AtomicBool>,
}

impl IncrementalHasher for FailingHasher {
    fn update(&mut self, bytes: &[u8]) {
        sha2::Digest::update(&mut self.inner, bytes);
    }

    fn finalize(self: Box<Self>) -> Digest {
        let this = *self;
        let on_target = current_thread_is(|name| name == this.thread_name);
        if on_target && this.armed.swap(false, Ordering::AcqRel) {
            panic!("injected failure on {}", this.thread_name);
        }
        sha2::Digest::finalize(this.inner).to_vec()
    }
}

/// SHA-256 where tree builds cannot finish until `gate` is set.
pub(crate) fn gated_sha256(gate: Arc<AtomicBool>) -> DigestPrimitive {
    DigestPrimitive::custom("gated-sha256", move || {
        Box::new(GatedHasher {
            inner: <Sha256 as sha2::Digest>::new(),
            gate: Arc::clone(&gate),
        }) as Box<dyn IncrementalHasher>
    })
    .unwrap()
}

/// SHA-256 where the next build on the builder thread for `depth` panics
/// once `armed` is set. The flag clears itself when it fires.
pub(crate) fn failing_sha256(depth: u32, armed: Arc<AtomicBool>) -> DigestPrimitive {
    let thread_name = format!("{}{}", BUILDER_THREAD_PREFIX, depth);
    DigestPrimitive::custom("failing-sha256", move || {
        Box::new(FailingHasher {
            inner: <Sha256 as sha2::Digest>::new(),
            thread_name: thread_name.clone(),
            armed: Arc::clone(&armed),
        }) as Box<dyn IncrementalHasher>
    })
    .unwrap()
}
