//! # Protocol Parser
//!
//! A small line-oriented command language for driving a hashed store from a
//! terminal or a script.
//!
//! ## Protocol Format
//!
//! - `GET <key>` - Retrieve a value by key
//! - `SET <key> <value>` - Store a key-value pair (value may contain spaces)
//! - `DEL <key>` or `DELETE <key>` - Delete a key
//! - `DIGEST` - Digest of the whole store, base64 encoded
//! - `LEN` - Number of stored keys
//! - `KEYS` - List all keys
//! - `PING` - Simple health check command
//!
//! ## Response Format
//! - Success responses: `VALUE <data>`, `OK`, `DIGEST <base64>`, `LEN <n>`,
//!   `KEYS <n>` followed by one key per line, `PONG`
//! - Error responses: `ERROR <message>`, `NOT_FOUND`

use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::store::KvStore;

/// Commands understood by the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Retrieve a value by its key
    Get {
        /// The key to look up
        key: String,
    },

    /// Store a key-value pair
    Set {
        /// The key to store
        key: String,
        /// The value to associate with the key
        value: String,
    },

    /// Delete a key-value pair
    Delete {
        /// The key to delete
        key: String,
    },

    /// Digest of the complete store
    Digest,

    /// Number of stored keys
    Len,

    /// List all keys
    Keys,

    /// Simple health check command
    Ping,
}

/// Stateless parser turning text lines into [`Command`]s.
#[derive(Debug, Default)]
pub struct Protocol;

impl Protocol {
    pub fn new() -> Self {
        Self
    }

    /// Parse one line. Command names are case-insensitive.
    pub fn parse(&self, input: &str) -> Result<Command> {
        let input = input.trim();
        let parts: Vec<&str> = input.split_whitespace().collect();
        if parts.is_empty() {
            return Err(anyhow!("Empty command"));
        }

        match parts[0].to_uppercase().as_str() {
            "GET" => {
                if parts.len() != 2 {
                    return Err(anyhow!("GET command requires exactly one key"));
                }
                Ok(Command::Get {
                    key: parts[1].to_string(),
                })
            }
            "SET" => {
                if parts.len() < 3 {
                    return Err(anyhow!("SET command requires a key and value"));
                }
                // Everything after the key is the value, inner whitespace included
                let key = parts[1].to_string();
                let after_command = input[parts[0].len()..].trim_start();
                let value = after_command[key.len()..].trim().to_string();
                Ok(Command::Set { key, value })
            }
            "DEL" | "DELETE" => {
                if parts.len() != 2 {
                    return Err(anyhow!("DELETE command requires exactly one key"));
                }
                Ok(Command::Delete {
                    key: parts[1].to_string(),
                })
            }
            "DIGEST" => no_arguments(&parts, Command::Digest),
            "LEN" => no_arguments(&parts, Command::Len),
            "KEYS" => no_arguments(&parts, Command::Keys),
            "PING" => no_arguments(&parts, Command::Ping),
            other => Err(anyhow!("Unknown command: {}", other)),
        }
    }
}

fn no_arguments(parts: &[&str], command: Command) -> Result<Command> {
    if parts.len() > 1 {
        return Err(anyhow!("{} command takes no arguments", parts[0].to_uppercase()));
    }
    Ok(command)
}

/// Run `command` against `store` and format the response, without the
/// trailing line terminator.
pub fn execute(store: &dyn KvStore, command: Command) -> String {
    match command {
        Command::Get { key } => match store.get(&key) {
            Some(value) => format!("VALUE {}", value),
            None => "NOT_FOUND".to_string(),
        },
        Command::Set { key, value } => match store.set(key, value) {
            Ok(()) => "OK".to_string(),
            Err(e) => format!("ERROR {}", e),
        },
        Command::Delete { key } => match store.delete(&key) {
            Ok(true) => "OK".to_string(),
            Ok(false) => "NOT_FOUND".to_string(),
            Err(e) => format!("ERROR {}", e),
        },
        Command::Digest => match store.root_digest() {
            Ok(digest) => format!("DIGEST {}", STANDARD.encode(digest)),
            Err(e) => format!("ERROR {}", e),
        },
        Command::Len => format!("LEN {}", store.len()),
        Command::Keys => {
            let mut keys = store.keys();
            keys.sort();
            let mut response = format!("KEYS {}", keys.len());
            for key in keys {
                response.push('\n');
                response.push_str(&key);
            }
            response
        }
        Command::Ping => "PONG".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RwLockEngine;

    #[test]
    fn test_parse_basic_commands() {
        let protocol = Protocol::new();
        assert_eq!(
            protocol.parse("GET user:1").unwrap(),
            Command::Get {
                key: "user:1".to_string()
            }
        );
        assert_eq!(
            protocol.parse("del user:1").unwrap(),
            Command::Delete {
                key: "user:1".to_string()
            }
        );
        assert_eq!(protocol.parse("digest").unwrap(), Command::Digest);
        assert_eq!(protocol.parse("  LEN  ").unwrap(), Command::Len);
        assert_eq!(protocol.parse("keys").unwrap(), Command::Keys);
        assert_eq!(protocol.parse("PING").unwrap(), Command::Ping);
    }

    #[test]
    fn test_set_value_keeps_inner_spaces() {
        let protocol = Protocol::new();
        assert_eq!(
            protocol.parse("SET greeting hello   big world ").unwrap(),
            Command::Set {
                key: "greeting".to_string(),
                value: "hello   big world".to_string()
            }
        );
    }

    #[test]
    fn test_set_value_may_repeat_key() {
        let protocol = Protocol::new();
        assert_eq!(
            protocol.parse("SET a a").unwrap(),
            Command::Set {
                key: "a".to_string(),
                value: "a".to_string()
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        let protocol = Protocol::new();
        assert!(protocol.parse("").is_err());
        assert!(protocol.parse("GET").is_err());
        assert!(protocol.parse("GET a b").is_err());
        assert!(protocol.parse("SET onlykey").is_err());
        assert!(protocol.parse("DIGEST now").is_err());
        assert!(protocol.parse("FLY away").is_err());
    }

    #[test]
    fn test_execute_round_trip() {
        let store = RwLockEngine::new();
        let protocol = Protocol::new();
        let run = |line: &str| execute(&store, protocol.parse(line).unwrap());

        let empty = run("DIGEST");
        assert_eq!(
            empty,
            "DIGEST 47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
        );
        assert_eq!(run("SET k some value"), "OK");
        assert_eq!(run("GET k"), "VALUE some value");
        assert_eq!(run("LEN"), "LEN 1");
        assert_eq!(run("KEYS"), "KEYS 1\nk");
        assert_ne!(run("DIGEST"), empty);
        assert_eq!(run("DEL k"), "OK");
        assert_eq!(run("DEL k"), "NOT_FOUND");
        assert_eq!(run("GET k"), "NOT_FOUND");
        assert_eq!(run("DIGEST"), empty);
        assert_eq!(run("PING"), "PONG");
    }
}
