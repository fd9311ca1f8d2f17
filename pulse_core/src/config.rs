//! Configuration file support for Celestial Pulse.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/celestial-pulse/config.toml`.
//! Every field is optional; missing sections fall back to defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "celestial-pulse";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub defaults: LogDefaults,

    #[serde(default)]
    pub logging: LoggingConfig,
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

/// Where export documents are written
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
        }
    }
}

/// Values used when a log command omits them
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogDefaults {
    #[serde(default = "default_sets")]
    pub sets: i64,

    #[serde(default = "default_reps")]
    pub reps: i64,

    #[serde(default = "default_cardio_minutes")]
    pub cardio_minutes: f64,
}

impl Default for LogDefaults {
    fn default() -> Self {
        Self {
            sets: default_sets(),
            reps: default_reps(),
            cardio_minutes: default_cardio_minutes(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir().join(".local/share"));
    base.join(APP_DIR)
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_sets() -> i64 {
    3
}

fn default_reps() -> i64 {
    8
}

fn default_cardio_minutes() -> f64 {
    20.0
}

fn default_log_level() -> String {
    "warn".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.check()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir().join(".config"));
        base.join(APP_DIR).join("config.toml")
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

    fn check(&self) -> Result<()> {
        if self.data.data_dir.as_os_str().is_empty() {
            return Err(Error::Config("data.data_dir must not be empty".into()));
        }
        if !self.defaults.cardio_minutes.is_finite() {
            return Err(Error::Config(
                "defaults.cardio_minutes must be a finite number".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.data.data_dir.ends_with("celestial-pulse"));
        assert_eq!(config.defaults.sets, 3);
        assert_eq!(config.defaults.reps, 8);
        assert_eq!(config.defaults.cardio_minutes, 20.0);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        let mut config = Config::default();
        config.defaults.reps = 12;

        config.save_to(&path).unwrap();
        let parsed = Config::load_from(&path).unwrap();

        assert_eq!(parsed.defaults.reps, 12);
        assert_eq!(parsed.data.data_dir, config.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[defaults]
sets = 5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.defaults.sets, 5);
        assert_eq!(config.defaults.reps, 8); // default
        assert_eq!(config.export.dir, PathBuf::from("."));
    }

    #[test]
    fn test_empty_data_dir_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[data]\ndata_dir = \"\"\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
