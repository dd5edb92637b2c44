//! Configuration loading and defaults for jiggled.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for jiggled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds without activity before jiggling becomes eligible (default: 120).
    pub idle_seconds: u64,

    /// Minimum seconds between jiggles while inactivity continues (default: 30).
    pub interval_seconds: u64,

    /// Pixels moved per jiggle, out and back (default: 1).
    pub pixels: u16,

    /// Scheduler poll cadence in milliseconds (default: 500).
    /// Independent of the idle/interval thresholds, which are evaluated
    /// inside each tick.
    pub poll_interval_ms: u64,

    /// Dry run mode: full bookkeeping and logging, no pointer motion and no
    /// input hooks. Works in headless environments.
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            idle_seconds: 120,
            interval_seconds: 30,
            pixels: 1,
            poll_interval_ms: 500,
            dry_run: false,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration from the default path, or return defaults if not found.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(p) = path {
            return Self::load(p);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let default_path = config_dir.join("jiggled").join("config.toml");
            if default_path.exists() {
                return Self::load(&default_path);
            }
        }

        Ok(Self::default())
    }

    /// Validate the merged configuration.
    ///
    /// Zero idle/interval values are accepted and mean "always eligible".
    /// A zero-pixel jiggle cannot reset an idle timer, so that is rejected.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.pixels >= 1, "pixels must be at least 1");
        anyhow::ensure!(
            i16::try_from(self.pixels).is_ok(),
            "pixels must be at most {}",
            i16::MAX
        );
        anyhow::ensure!(
            self.poll_interval_ms >= 1,
            "poll_interval_ms must be at least 1"
        );
        Ok(())
    }

    /// The jiggle magnitude as a signed pixel delta.
    pub fn pixel_delta(&self) -> i16 {
        i16::try_from(self.pixels).unwrap_or(i16::MAX)
    }
}
