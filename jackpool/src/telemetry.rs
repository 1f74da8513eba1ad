// Copyright (c) 2024 Botho Foundation

//! Logging setup.
//!
//! Console output goes through `tracing_subscriber::fmt`. `RUST_LOG` takes
//! precedence over the level chosen on the command line:
//!
//! ```text
//! RUST_LOG=jpl_engine=debug jackpool simulate --preset demo
//! ```

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for the given verbosity.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Initialize the global tracing subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize tracing: {e}"))
}
