use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use jpl_engine::{Preset, ProgressSnapshot, Simulation, SimulationConfig, SimulationError};
use jpl_report::{build_charts, write_json, write_run, RunStatistics, TierComparison, TrendAnalysis};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{Config, SimulationSection};

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub rounds: Option<u64>,
    pub seed: Option<u64>,
    pub preset: Option<Preset>,
    pub output: Option<PathBuf>,
    pub snapshot_every: Option<u64>,
}

/// Simulation parameters after applying the command-line overrides.
pub fn resolve_simulation(config: &Config, overrides: &Overrides) -> Result<SimulationConfig> {
    let mut sim = match overrides.preset {
        Some(preset) => SimulationSection {
            preset: Some(preset),
            overrides: toml::Table::new(),
        }
        .resolve()?,
        None => config.simulation.resolve()?,
    };

    if let Some(rounds) = overrides.rounds {
        sim = sim.with_rounds(rounds);
    }
    if let Some(seed) = overrides.seed {
        sim = sim.with_seed(seed);
    }
    sim.validate()?;
    Ok(sim)
}

/// Run the simulate command
pub fn run(config_path: &Path, overrides: Overrides) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    let sim_config = resolve_simulation(&config, &overrides)?;
    let output_dir = overrides.output.clone().unwrap_or_else(|| config.output.dir.clone());
    let snapshot_every = match overrides.snapshot_every.unwrap_or(config.output.snapshot_every) {
        0 => sim_config.batch_size,
        n => n,
    };

    let threads = config.compute.effective_threads();
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .context("Failed to start worker threads")?;

    let mut simulation = Simulation::new(sim_config)?;
    let progress = simulation.progress();
    let cancel = simulation.cancel_token();
    ctrlc::set_handler(move || {
        cancel.cancel();
    })
    .context("Failed to install Ctrl+C handler")?;

    info!(threads, seed = simulation.seed(), "Running simulation");
    println!(
        "Simulating {} rounds (seed {}). Press Ctrl+C to stop.",
        simulation.config().num_rounds,
        simulation.seed()
    );

    let bar = ProgressBar::new(simulation.config().num_rounds);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} rounds ({eta}) {msg}",
        )?
        .progress_chars("=> "),
    );

    let mut snapshots: Vec<ProgressSnapshot> = Vec::new();
    loop {
        let outcome = match simulation.run_batch(snapshot_every) {
            Ok(outcome) => outcome,
            Err(SimulationError::Cancelled { completed_rounds }) => {
                bar.abandon_with_message("cancelled");
                warn!(completed_rounds, "Simulation cancelled; nothing exported");
                bail!("Simulation cancelled after {} rounds", completed_rounds);
            }
            Err(err) => {
                bar.abandon_with_message("failed");
                return Err(err.into());
            }
        };

        if let Some(snapshot) = progress.latest() {
            bar.set_position(snapshot.completed_rounds);
            bar.set_message(format!(
                "RTP {:.2}%  jackpot {:.0}  funding {:.0}",
                snapshot.rtp * 100.0,
                snapshot.jackpot_pool,
                snapshot.funding_pool
            ));
            snapshots.push(snapshot);
        }

        if outcome.is_complete() {
            break;
        }
    }
    bar.finish_with_message("done");

    let result = simulation.finish()?;
    let statistics = RunStatistics::from_result(&result);
    let comparison = TierComparison::new(&statistics, &result.config);
    let trends = TrendAnalysis::from_snapshots(&snapshots);
    let charts = build_charts(&result, Some(&comparison));

    println!();
    print!("{}", statistics.render());
    println!("\nTier probability (simulated vs theoretical)\n");
    print!("{}", comparison.probability_table());
    println!("\nTier RTP (simulated vs theoretical)\n");
    print!("{}", comparison.rtp_table());
    print_trends(&trends);

    let files = write_run(&output_dir, &result)?;
    write_json(&output_dir.join("snapshots.json"), &snapshots)?;
    write_json(&output_dir.join("charts.json"), &charts)?;
    write_json(&output_dir.join("trends.json"), &trends)?;

    println!("\nResults written to {}:", output_dir.display());
    for path in [&files.summary, &files.details, &files.jackpots, &files.result] {
        println!("  {}", path.display());
    }
    println!("  snapshots.json, charts.json, trends.json");
    Ok(())
}

fn print_trends(trends: &TrendAnalysis) {
    println!(
        "\nTrends ({} snapshots, {:.1}s)",
        trends.rtp.values.len(),
        trends.total_duration_ms as f64 / 1000.0
    );
    println!("  {:<20} {:>16} {:>16}", "Series", "Average", "Peak");
    for (name, series) in trends.series() {
        match (series.average, series.peak) {
            (Some(average), Some(peak)) => {
                println!("  {:<20} {:>16.4} {:>16.4}", name, average, peak)
            }
            _ => println!("  {:<20} {:>16} {:>16}", name, "-", "-"),
        }
    }
}
