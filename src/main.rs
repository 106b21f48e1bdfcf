//! # hashed-kv
//!
//! Interactive front end for a hashed key-value store. Commands are read from
//! standard input one per line and each response is written to standard
//! output. See [`hashed_kv::protocol`] for the command set.
//!
//! ## Configuration Priority
//! 1. Command line arguments (highest priority)
//! 2. `HASHED_KV_*` environment variables
//! 3. Configuration file given with `--config`
//! 4. Default values (lowest priority)

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use hashed_kv::protocol::{execute, Protocol};
use hashed_kv::{Config, EntryCodec, HashAlgorithm, KvStore, RwLockEngine};

#[derive(Parser, Debug)]
#[command(name = "hashed-kv", version, about = "Key-value store with a live content digest")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Hash algorithm: sha224, sha256, sha384, sha512 or sha512_256
    #[arg(short, long)]
    algorithm: Option<HashAlgorithm>,

    /// Number of hash trees kept warm around the current depth (1 to 16)
    #[arg(short = 'w', long)]
    cache_window: Option<usize>,

    /// Key and value encoding: bincode, json or cbor
    #[arg(long)]
    codec: Option<EntryCodec>,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::from_env().context("failed to read configuration from environment")?,
    };

    if let Some(algorithm) = args.algorithm {
        config.algorithm = algorithm;
    }
    if let Some(size) = args.cache_window {
        config.cache_window_size = size;
    }
    if let Some(codec) = args.codec {
        config.codec = codec;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    // RUST_LOG controls verbosity, e.g. RUST_LOG=debug shows tree builds
    env_logger::init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!(
        "Starting hashed-kv with {} digests, cache window {}, {} codec",
        config.algorithm, config.cache_window_size, config.codec
    );

    let store: Box<dyn KvStore> = Box::new(RwLockEngine::with_config(&config)?);
    let protocol = Protocol::new();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match protocol.parse(&line) {
            Ok(command) => {
                debug!("Executing {:?}", command);
                execute(store.as_ref(), command)
            }
            Err(e) => {
                warn!("Rejected input {:?}: {}", line, e);
                format!("ERROR {}", e)
            }
        };
        writeln!(out, "{}", response)?;
        out.flush()?;
    }

    info!("Input closed with {} keys stored", store.len());
    Ok(())
}
