use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Number of recent blocks retained locally; older blocks are pruned
/// and never offered to the miner.
pub const DEFAULT_REDACTED_WINDOW_SIZE: u64 = 43_200;

/// Node core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Size of the redacted window in blocks
    #[serde(default = "default_redacted_window_size")]
    pub redacted_window_size: u64,

    #[serde(default)]
    pub mining: MiningConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Whether the proof-of-work miner may start
    #[serde(default = "default_mining_enabled")]
    pub enabled: bool,

    /// Seconds between hash-rate status lines
    #[serde(default = "default_status_interval_secs")]
    pub status_interval_secs: u64,
}

fn default_redacted_window_size() -> u64 {
    DEFAULT_REDACTED_WINDOW_SIZE
}

fn default_mining_enabled() -> bool {
    true
}

fn default_status_interval_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redacted_window_size: default_redacted_window_size(),
            mining: MiningConfig::default(),
        }
    }
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            enabled: default_mining_enabled(),
            status_interval_secs: default_status_interval_secs(),
        }
    }
}

impl Config {
    /// Load config from a file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}
