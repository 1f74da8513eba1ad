use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use jackpool::{commands, config, telemetry};
use jpl_engine::Preset;

#[derive(Parser)]
#[command(name = "jackpool")]
#[command(about = "Monte-Carlo simulator for a pick-6 lottery with a funded jackpot pool", long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.jackpool/config.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file with every simulation parameter spelled out
    Init {
        /// Parameter preset (standard, legacy-fixed, demo)
        #[arg(long, default_value_t = Preset::Standard)]
        preset: Preset,

        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Run a simulation and export its results
    Simulate {
        /// Number of rounds (overrides the config)
        #[arg(short, long)]
        rounds: Option<u64>,

        /// RNG seed for a reproducible run
        #[arg(short, long)]
        seed: Option<u64>,

        /// Start from a preset instead of the config's [simulation] section
        #[arg(long)]
        preset: Option<Preset>,

        /// Output directory (overrides the config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Record a progress snapshot every N rounds
        #[arg(long)]
        snapshot_every: Option<u64>,
    },

    /// Print statistics for a previous run
    Report {
        /// Path to simulation_results.json
        path: PathBuf,
    },

    /// Start the HTTP service
    Serve {
        /// Listen address (overrides the config)
        #[arg(long)]
        listen: Option<SocketAddr>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing(cli.verbose)?;

    let config_path = match cli.config {
        Some(path) => PathBuf::from(path),
        None => config::default_config_path()?,
    };

    match cli.command {
        Commands::Init { preset, force } => commands::init::run(&config_path, preset, force),
        Commands::Simulate {
            rounds,
            seed,
            preset,
            output,
            snapshot_every,
        } => commands::simulate::run(
            &config_path,
            commands::simulate::Overrides {
                rounds,
                seed,
                preset,
                output,
                snapshot_every,
            },
        ),
        Commands::Report { path } => commands::report::run(&path),
        Commands::Serve { listen } => commands::serve::run(&config_path, listen),
    }
}
