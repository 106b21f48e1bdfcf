//! # Configuration Management
//!
//! Construction-time settings for a hashed map. Configuration is loaded from
//! a TOML file and can be overridden with `HASHED_KV_*` environment variables.
//! Every field is optional; missing fields fall back to the defaults below.
//!
//! ## Example Configuration File (hashed_kv.toml)
//! ```toml
//! algorithm = "sha256"
//! cache_window_size = 3
//! codec = "bincode"
//! ```

use config::{Config as ConfigLib, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::store::codec::EntryCodec;
use crate::store::digest::HashAlgorithm;
use crate::store::window::{cache_window_size, DEFAULT_CACHE_WINDOW_SIZE};

/// Prefix for environment variable overrides, e.g. `HASHED_KV_ALGORITHM=sha512`.
pub const ENV_PREFIX: &str = "HASHED_KV";

/// Settings chosen when a map is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hash algorithm used for leaf, bucket and node digests
    pub algorithm: HashAlgorithm,

    /// Number of hash trees of neighbouring depths kept warm, from 1 to
    /// `MAX_CACHE_WINDOW_SIZE`. Larger windows use more memory but rebuild less when the map size
    /// keeps crossing a power of two.
    pub cache_window_size: usize,

    /// Encoding used to turn keys and values into bytes before hashing
    pub codec: EntryCodec,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            cache_window_size: DEFAULT_CACHE_WINDOW_SIZE,
            codec: EntryCodec::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = ConfigLib::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for when no file is given.
    pub fn from_env() -> Result<Self> {
        let settings = ConfigLib::builder()
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no map can be built with.
    pub fn validate(&self) -> Result<()> {
        cache_window_size(self.cache_window_size)?;
        Ok(())
    }
}
