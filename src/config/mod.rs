//! Configuration file support for sharescribe.
//!
//! Settings are read from `~/.config/sharescribe/config.toml`. Every field has a
//! default, so a missing file or a partial file is fine.

pub mod types;

pub use types::{CompositorConfig, UplinkConfig};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure.
///
/// # Example TOML
/// ```toml
/// [compositor]
/// tick_interval_ms = 30
/// frame_rate = 30.0
///
/// [uplink]
/// activate_settle_ms = 250
/// deactivate_settle_ms = 500
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Draw loop and composite stream settings
    #[serde(default)]
    pub compositor: CompositorConfig,

    /// Producer handoff timing
    #[serde(default)]
    pub uplink: UplinkConfig,
}

impl Config {
    /// Clamps values into their supported ranges, warning about each correction.
    ///
    /// Validated ranges:
    /// - `compositor.tick_interval_ms`: 5 - 1000
    /// - `compositor.frame_rate`: 1.0 - 120.0
    /// - `uplink.activate_settle_ms`: 0 - 5000
    /// - `uplink.deactivate_settle_ms`: 0 - 5000
    pub fn validate_and_clamp(&mut self) {
        if !(5..=1000).contains(&self.compositor.tick_interval_ms) {
            warn!(
                "Invalid tick_interval_ms {}, clamping to 5-1000 range",
                self.compositor.tick_interval_ms
            );
            self.compositor.tick_interval_ms = self.compositor.tick_interval_ms.clamp(5, 1000);
        }

        if !(1.0..=120.0).contains(&self.compositor.frame_rate) {
            warn!(
                "Invalid frame_rate {:.1}, clamping to 1-120 range",
                self.compositor.frame_rate
            );
            self.compositor.frame_rate = if self.compositor.frame_rate.is_nan() {
                30.0
            } else {
                self.compositor.frame_rate.clamp(1.0, 120.0)
            };
        }

        if self.uplink.activate_settle_ms > 5000 {
            warn!(
                "Invalid activate_settle_ms {}, clamping to 5000",
                self.uplink.activate_settle_ms
            );
            self.uplink.activate_settle_ms = 5000;
        }

        if self.uplink.deactivate_settle_ms > 5000 {
            warn!(
                "Invalid deactivate_settle_ms {}, clamping to 5000",
                self.uplink.deactivate_settle_ms
            );
            self.uplink.deactivate_settle_ms = 5000;
        }
    }

    /// Returns the path to the configuration file.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("sharescribe");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads the configuration from the default location, or defaults if absent.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Loads and validates the configuration at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        config.validate_and_clamp();

        info!("Loaded config from {}", path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Serializes the configuration as pretty TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// JSON schema describing the configuration file.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.compositor.tick_interval_ms, 30);
        assert_eq!(config.compositor.frame_rate, 30.0);
        assert_eq!(config.uplink.activate_settle_ms, 250);
        assert_eq!(config.uplink.deactivate_settle_ms, 500);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[uplink]\ndeactivate_settle_ms = 800\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.uplink.deactivate_settle_ms, 800);
        assert_eq!(config.uplink.activate_settle_ms, 250);
        assert_eq!(config.compositor, CompositorConfig::default());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let mut config = Config::default();
        config.compositor.tick_interval_ms = 1;
        config.compositor.frame_rate = 500.0;
        config.uplink.deactivate_settle_ms = 60_000;

        config.validate_and_clamp();
        assert_eq!(config.compositor.tick_interval_ms, 5);
        assert_eq!(config.compositor.frame_rate, 120.0);
        assert_eq!(config.uplink.deactivate_settle_ms, 5000);
    }

    #[test]
    fn invalid_toml_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.toml");
        fs::write(&path, "[compositor\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err}").contains("broken.toml"));
    }

    #[test]
    fn serialized_config_round_trips_through_toml() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("tick_interval_ms"));
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
