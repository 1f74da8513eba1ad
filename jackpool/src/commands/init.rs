use anyhow::{bail, Result};
use jpl_engine::Preset;
use std::path::Path;
use tracing::info;

use crate::config::Config;

/// Run the init command
pub fn run(config_path: &Path, preset: Preset, force: bool) -> Result<()> {
    if Config::exists(config_path) && !force {
        bail!(
            "Config already exists at {}\nUse --force to overwrite it or pass a different --config path.",
            config_path.display()
        );
    }

    let config = Config::with_preset(preset)?;
    config.save(config_path)?;

    info!(preset = %preset, "Config initialized at {}", config_path.display());
    println!("\nConfig saved to: {}", config_path.display());
    println!("Preset: {preset}");
    println!("\nNext steps:");
    println!("  1. Edit the [simulation] section to tune the game");
    println!("  2. Run 'jackpool simulate' to start a run");
    println!("  3. Run 'jackpool serve' to expose the HTTP service");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        run(&path, Preset::Demo, false).unwrap();
        assert!(run(&path, Preset::Standard, false).is_err());

        run(&path, Preset::LegacyFixed, true).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.simulation.preset, Some(Preset::LegacyFixed));
    }
}
