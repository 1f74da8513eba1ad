use anyhow::{Context, Result};
use jpl_engine::SimulationResult;
use jpl_report::{RunStatistics, TierComparison};
use std::fs;
use std::path::Path;

/// Load a result previously exported by `simulate`.
pub fn load_result(path: &Path) -> Result<SimulationResult> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read results from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse results from {}", path.display()))
}

/// Run the report command
pub fn run(path: &Path) -> Result<()> {
    let result = load_result(path)?;
    let statistics = RunStatistics::from_result(&result);
    let comparison = TierComparison::new(&statistics, &result.config);

    println!("Run {} (seed {})\n", path.display(), result.seed);
    print!("{}", statistics.render());
    println!("\nTier probability (simulated vs theoretical)\n");
    print!("{}", comparison.probability_table());
    println!("\nTier RTP (simulated vs theoretical)\n");
    print!("{}", comparison.rtp_table());
    Ok(())
}
