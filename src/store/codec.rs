//! Entry serialization.
//!
//! Leaf digests and bucket assignment both work on bytes, so every key and
//! value is serialized first. The encoding must be deterministic: the same
//! key must always produce the same bytes, or it would be filed under a
//! different bucket and leaf. Bincode is the default; JSON and CBOR are
//! available when digests need to be reproduced by other tooling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Encoding used to turn keys and values into bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryCodec {
    #[default]
    Bincode,
    Json,
    Cbor,
}

impl EntryCodec {
    pub fn encode<T: Serialize>(self, item: &T) -> Result<Vec<u8>> {
        match self {
            EntryCodec::Bincode => bincode::serialize(item).map_err(|e| Error::codec(e.to_string())),
            EntryCodec::Json => serde_json::to_vec(item).map_err(|e| Error::codec(e.to_string())),
            EntryCodec::Cbor => serde_cbor::to_vec(item).map_err(|e| Error::codec(e.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EntryCodec::Bincode => "bincode",
            EntryCodec::Json => "json",
            EntryCodec::Cbor => "cbor",
        }
    }
}

impl fmt::Display for EntryCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntryCodec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bincode" => Ok(EntryCodec::Bincode),
            "json" => Ok(EntryCodec::Json),
            "cbor" => Ok(EntryCodec::Cbor),
            other => Err(Error::configuration(format!(
                "unknown entry codec '{}' (expected bincode, json or cbor)",
                other
            ))),
        }
    }
}
