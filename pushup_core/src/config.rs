//! Configuration file support for the push-up counter.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/pushup/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub detector: DetectorConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub frame: FrameConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Repetition-detection thresholds.
///
/// The defaults are empirical constants carried over from the observed
/// system; the gap between them is the hysteresis dead zone.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default = "default_down_threshold")]
    pub down_threshold_degrees: f64,

    #[serde(default = "default_up_threshold")]
    pub up_threshold_degrees: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            down_threshold_degrees: default_down_threshold(),
            up_threshold_degrees: default_up_threshold(),
        }
    }
}

/// Display configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Keypoints at or below this score are not rendered. Rendering
    /// only; detection ignores scores.
    #[serde(default = "default_min_keypoint_score")]
    pub min_keypoint_score: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            min_keypoint_score: default_min_keypoint_score(),
        }
    }
}

/// Frame loop configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Delay between frame ticks in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("pushup")
}

fn default_down_threshold() -> f64 {
    100.0
}

fn default_up_threshold() -> f64 {
    160.0
}

fn default_min_keypoint_score() -> f64 {
    0.5
}

fn default_tick_interval_ms() -> u64 {
    16
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("pushup").join("config.toml")
    }

    /// The detector thresholds must leave a dead zone between them.
    pub fn validate(&self) -> Result<()> {
        if self.detector.down_threshold_degrees >= self.detector.up_threshold_degrees {
            return Err(Error::Config(format!(
                "down threshold ({}) must be below up threshold ({})",
                self.detector.down_threshold_degrees, self.detector.up_threshold_degrees
            )));
        }
        Ok(())
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
