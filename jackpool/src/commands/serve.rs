use anyhow::Result;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::server::{serve, ServerState};

/// Run the HTTP service until it fails or the process is stopped.
pub fn run(config_path: &Path, listen: Option<SocketAddr>) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    let defaults = config.simulation.resolve()?;
    let addr = listen.unwrap_or(config.server.listen);

    println!("jackpool service on http://{}. Press Ctrl+C to stop.", addr);

    let state = Arc::new(ServerState::new(defaults, config.server.cors_origins));
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(serve(addr, state))
}
