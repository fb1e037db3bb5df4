//! Configuration for gati-cal
//!
//! Loads configuration from a TOML file with the few parameters the
//! calibration subsystem needs: which driver to open, where calibration
//! records live on disk, and how to log.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub device: DeviceConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Device configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Driver type to open ("mock"; real transports register their own)
    #[serde(rename = "type")]
    pub device_type: String,
}

/// Calibration storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding per-device `.calibration.txt` records
    pub data_dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log output (stdout, stderr, or file path)
    pub output: String,
}

/// Default data directory: `$HOME/.gati`, falling back to the current
/// directory when no home is set (containers, CI).
fn default_data_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => Path::new(&home).join(".gati"),
        None => PathBuf::from(".gati"),
    }
}

impl Config {
    /// Load configuration from TOML file
    ///
    /// # Arguments
    /// - `path`: Path to TOML configuration file
    ///
    /// # Returns
    /// Parsed configuration or error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DeviceConfig {
                device_type: "mock".to_string(),
            },
            storage: StorageConfig {
                data_dir: default_data_dir(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                output: "stdout".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.device.device_type, "mock");
        assert!(config.storage.data_dir.ends_with(".gati"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_serialization() {
        let config = Config::default();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        // Should contain all sections
        assert!(toml_string.contains("[device]"));
        assert!(toml_string.contains("[storage]"));
        assert!(toml_string.contains("[logging]"));

        // Should contain key values
        assert!(toml_string.contains("type = \"mock\""));
        assert!(toml_string.contains("level = \"info\""));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[device]
type = "mock"

[storage]
data_dir = "/var/lib/gati"

[logging]
level = "debug"
output = "stderr"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.device.device_type, "mock");
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/gati"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.output, "stderr");
    }
}
