//! # Digest Primitive
//!
//! Every digest in a container (leaf, bucket, internal node) comes from one
//! injected [`DigestPrimitive`]. The primitive is a factory for fresh
//! incremental hashers: bytes are fed with `update` any number of times and
//! `finalize` yields a fixed-size digest.
//!
//! The SHA-2 family from `sha2` is built in and selectable by name. Any other
//! hash can be plugged in through [`DigestPrimitive::custom`].

use serde::{Deserialize, Serialize};
use sha2::{Sha224, Sha256, Sha384, Sha512, Sha512_256};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};

/// A fixed-size digest produced by a [`DigestPrimitive`].
pub type Digest = Vec<u8>;

/// An incremental hasher: repeated `update`, then a single `finalize`.
pub trait IncrementalHasher {
    /// Feed more bytes into the hasher.
    fn update(&mut self, bytes: &[u8]);

    /// Consume the hasher and return the digest.
    fn finalize(self: Box<Self>) -> Digest;
}

impl<D: sha2::Digest> IncrementalHasher for D {
    fn update(&mut self, bytes: &[u8]) {
        sha2::Digest::update(self, bytes);
    }

    fn finalize(self: Box<Self>) -> Digest {
        sha2::Digest::finalize(*self).to_vec()
    }
}

type HasherFactory = Arc<dyn Fn() -> Box<dyn IncrementalHasher> + Send + Sync>;

/// Built-in hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
    Sha512_256,
}

impl HashAlgorithm {
    /// Canonical lowercase name, as accepted in config files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha224 => "sha224",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Sha512_256 => "sha512_256",
        }
    }

    fn factory(self) -> HasherFactory {
        match self {
            HashAlgorithm::Sha224 => sha2_factory::<Sha224>(),
            HashAlgorithm::Sha256 => sha2_factory::<Sha256>(),
            HashAlgorithm::Sha384 => sha2_factory::<Sha384>(),
            HashAlgorithm::Sha512 => sha2_factory::<Sha512>(),
            HashAlgorithm::Sha512_256 => sha2_factory::<Sha512_256>(),
        }
    }
}

fn sha2_factory<D: sha2::Digest + 'static>() -> HasherFactory {
    Arc::new(|| Box::new(<D as sha2::Digest>::new()) as Box<dyn IncrementalHasher>)
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "sha224" => Ok(HashAlgorithm::Sha224),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            "sha512_256" => Ok(HashAlgorithm::Sha512_256),
            other => Err(Error::configuration(format!(
                "unknown hash algorithm '{}' (expected one of sha224, sha256, sha384, sha512, sha512_256)",
                other
            ))),
        }
    }
}

/// Injected hashing strategy shared by every tree of one container.
///
/// Cloning is cheap: clones share the same factory.
#[derive(Clone)]
pub struct DigestPrimitive {
    name: String,
    factory: HasherFactory,
    empty: Digest,
}

impl DigestPrimitive {
    /// Primitive for one of the built-in algorithms.
    pub fn from_algorithm(algorithm: HashAlgorithm) -> Self {
        let factory = algorithm.factory();
        let empty = factory().finalize();
        Self {
            name: algorithm.name().to_string(),
            factory,
            empty,
        }
    }

    /// The default primitive, SHA-256.
    pub fn sha256() -> Self {
        Self::from_algorithm(HashAlgorithm::Sha256)
    }

    /// Wrap a user-supplied hasher factory.
    ///
    /// The factory is probed once: it must produce a non-empty digest and
    /// produce the same digest for the same input twice.
    pub fn custom<F>(name: impl Into<String>, factory: F) -> Result<Self>
    where
        F: Fn() -> Box<dyn IncrementalHasher> + Send + Sync + 'static,
    {
        let name = name.into();
        let factory: HasherFactory = Arc::new(factory);

        let empty = factory().finalize();
        if empty.is_empty() {
            return Err(Error::configuration(format!(
                "digest primitive '{}' produces empty digests",
                name
            )));
        }
        let probe = |f: &HasherFactory| {
            let mut hasher = f();
            hasher.update(b"hashed_kv");
            hasher.finalize()
        };
        let first = probe(&factory);
        if first != probe(&factory) || factory().finalize() != empty {
            return Err(Error::configuration(format!(
                "digest primitive '{}' is not deterministic",
                name
            )));
        }
        if first.len() != empty.len() {
            return Err(Error::configuration(format!(
                "digest primitive '{}' produces digests of varying size",
                name
            )));
        }

        Ok(Self {
            name,
            factory,
            empty,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes of every digest this primitive produces.
    pub fn output_size(&self) -> usize {
        self.empty.len()
    }

    /// A fresh incremental hasher.
    pub fn hasher(&self) -> Box<dyn IncrementalHasher> {
        (self.factory)()
    }

    /// Digest of the empty input, which is also the digest of an empty bucket.
    pub fn empty_digest(&self) -> Digest {
        self.empty.clone()
    }

    pub fn digest(&self, bytes: &[u8]) -> Digest {
        let mut hasher = self.hasher();
        hasher.update(bytes);
        hasher.finalize()
    }

    /// Digest of the concatenation of `parts`, without materialising it.
    pub fn digest_concat<'a, I>(&self, parts: I) -> Digest
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut hasher = self.hasher();
        for part in parts {
            hasher.update(part);
        }
        hasher.finalize()
    }

    /// Leaf digest committing to one key/value pair: `H(H(key) ‖ H(value))`.
    pub fn leaf_digest(&self, key: &[u8], value: &[u8]) -> Digest {
        let key_digest = self.digest(key);
        let value_digest = self.digest(value);
        self.digest_concat([key_digest.as_slice(), value_digest.as_slice()])
    }
}

impl Default for DigestPrimitive {
    fn default() -> Self {
        Self::sha256()
    }
}

impl fmt::Debug for DigestPrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestPrimitive")
            .field("name", &self.name)
            .field("output_size", &self.output_size())
            .finish()
    }
}
