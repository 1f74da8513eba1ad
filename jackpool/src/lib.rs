//! Jackpot pool lottery simulator.
//!
//! The library half of the `jackpool` binary: configuration file handling,
//! logging setup, the CLI commands and the HTTP service. The simulation
//! itself lives in `jpl-engine`; reports in `jpl-report`.

pub mod commands;
pub mod config;
pub mod server;
pub mod telemetry;

pub use config::Config;
