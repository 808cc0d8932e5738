//! Logging setup.
//!
//! Events go to stderr so `--json` output on stdout stays clean.
//! Filter priority: an explicit `-v` level, then `RUST_LOG`, then the
//! default (`warn`, or `info` while diagnosing entries).

use anyhow::{Context, Result};
use std::io;
use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Level selected by `-v` repetitions, if any.
pub fn explicit_level(verbosity: u8) -> Option<Level> {
    match verbosity {
        0 => None,
        1 => Some(Level::INFO),
        2 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}

/// Level used when neither `-v` nor `RUST_LOG` is given.
pub fn default_level(diagnosing: bool) -> Level {
    if diagnosing {
        Level::INFO
    } else {
        Level::WARN
    }
}

/// Install the global subscriber.
pub fn init(verbosity: u8, diagnosing: bool) -> Result<()> {
    let env_filter = match explicit_level(verbosity) {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level(diagnosing).to_string())),
    };

    let layer = fmt::layer()
        .with_target(true)
        .with_writer(io::stderr)
        .with_filter(env_filter);

    Registry::default()
        .with(layer)
        .try_init()
        .context("Failed to initialize logging")
}
