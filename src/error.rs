//! Error types for hashed_kv operations

use thiserror::Error;

/// Result type alias for hashed_kv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the digest engine and the containers built on it.
///
/// Digest computation and bucket assignment never fail once a configuration
/// has been validated, so every variant here belongs to a boundary: building
/// a container, encoding entries, or a caller breaking the add/delete pairing.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid construction-time configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A delete targeted a leaf digest that its bucket does not hold
    #[error("Inconsistent state: leaf digest missing from bucket {bucket} of depth-{depth} tree")]
    InconsistentState { depth: u32, bucket: usize },

    /// The tree for the requested depth is still being built
    #[error("Hash tree for depth {depth} is not ready")]
    NotReady { depth: u32 },

    /// The background worker building a tree panicked
    #[error("Building hash tree for depth {depth} failed: {message}")]
    BuildFailed { depth: u32, message: String },

    /// A key or value could not be serialized
    #[error("Codec error: {message}")]
    Codec { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration {
            message: msg.into(),
        }
    }

    /// Create a codec error
    pub fn codec<S: Into<String>>(msg: S) -> Self {
        Error::Codec {
            message: msg.into(),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Configuration {
            message: err.to_string(),
        }
    }
}
