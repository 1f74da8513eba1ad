use anyhow::{anyhow, Context, Result};
use jpl_engine::{Preset, SimulationConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration for jackpool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationSection,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub compute: ComputeConfig,
}

/// `[simulation]`: an optional preset plus explicit parameter overrides.
///
/// Keys present in the table replace the preset's values; everything else
/// comes from the preset (or the standard game when no preset is named).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<Preset>,

    #[serde(flatten)]
    pub overrides: toml::Table,
}

impl SimulationSection {
    /// Section that spells out every parameter of `preset`.
    pub fn from_preset(preset: Preset) -> Result<Self> {
        let overrides = toml::Table::try_from(preset.config())
            .context("Failed to serialize simulation parameters")?;
        Ok(Self {
            preset: Some(preset),
            overrides,
        })
    }

    /// Merge the overrides onto the preset and validate the result.
    pub fn resolve(&self) -> Result<SimulationConfig> {
        let base = self.preset.unwrap_or_default().config();
        let mut table =
            toml::Table::try_from(base).context("Failed to serialize simulation parameters")?;
        merge_table(&mut table, &self.overrides);

        let config: SimulationConfig = table
            .try_into()
            .context("Invalid [simulation] section")?;
        config.validate()?;
        Ok(config)
    }
}

/// Overlay `overrides` onto `base`. Nested tables are merged key by key, so a
/// partial `[simulation.prize_table]` keeps the preset's other amounts.
fn merge_table(base: &mut toml::Table, overrides: &toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_table(existing, nested)
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address for the HTTP service
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Allowed CORS origins.
    /// "http://localhost" also matches any port on localhost; "*" allows all.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://127.0.0.1".to_string(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for CSV/JSON exports
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Record a progress snapshot every N rounds (0 = once per batch)
    #[serde(default = "default_snapshot_every")]
    pub snapshot_every: u64,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_snapshot_every() -> u64 {
    10
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            snapshot_every: default_snapshot_every(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComputeConfig {
    /// Ticket generation threads (0 = auto-detect)
    #[serde(default)]
    pub threads: usize,
}

impl ComputeConfig {
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}

impl Config {
    /// Create a config whose simulation section spells out `preset`
    pub fn with_preset(preset: Preset) -> Result<Self> {
        Ok(Self {
            simulation: SimulationSection::from_preset(preset)?,
            ..Self::default()
        })
    }

    /// Load config from a file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load config from a file, falling back to defaults when it is missing
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if Self::exists(path) {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }

    /// Check if config file exists
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }
}

/// Get the default config directory path
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".jackpool"))
        .ok_or_else(|| anyhow!("Could not determine home directory"))
}

/// Get the default config file path
pub fn default_config_path() -> Result<PathBuf> {
    Ok(default_data_dir()?.join("config.toml"))
}
