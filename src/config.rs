//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration for the screening engine: storage location,
//! search defaults and limits, and the optional country profile source,
//! loaded from a TOML file with environment overrides and validation.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files (TOML), environment variables
//! - **Output**: Validated configuration structs with defaults and overrides
//! - **Validation**: Range checks on thresholds and result limits
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Environment variables (highest priority)
//! 2. Configuration file
//! 3. Default values (lowest priority)
//!
//! ## Usage
//! ```rust,no_run
//! use restricted_party_screen::config::EngineConfig;
//!
//! # fn main() -> restricted_party_screen::errors::Result<()> {
//! // Load from the default location
//! let config = EngineConfig::load()?;
//!
//! // Load from a specific file
//! let config = EngineConfig::from_file("custom.toml")?;
//!
//! // Access configuration
//! println!("Data directory: {:?}", config.storage.data_dir);
//! # Ok(())
//! # }
//! ```

use crate::errors::{Result, ScreenError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure containing all engine settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Storage and database settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Search behavior and limits
    #[serde(default)]
    pub search: SearchConfig,
    /// Country sanctions profile source
    #[serde(default)]
    pub country: CountryConfig,
}

/// Storage and database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database directory
    pub data_dir: PathBuf,
}

/// Search behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Fuzzy similarity threshold used when a query does not supply one
    pub default_fuzzy_threshold: f64,
    /// Result count used when a query does not supply a limit
    pub default_limit: usize,
    /// Hard ceiling on the per-query result count
    pub max_limit: usize,
}

/// Country sanctions profile configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CountryConfig {
    /// JSON profile file; the built-in table is used when unset
    pub profile_path: Option<PathBuf>,
}

impl EngineConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::from_file("screening.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| ScreenError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: EngineConfig = toml::from_str(&content).map_err(|e| ScreenError::Config {
            message: format!("Failed to parse config file {:?}: {}", path, e),
        })?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(data_dir) = std::env::var("RPS_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(threshold) = std::env::var("RPS_DEFAULT_FUZZY_THRESHOLD") {
            self.search.default_fuzzy_threshold =
                threshold.parse().map_err(|_| ScreenError::Config {
                    message: "Invalid number in RPS_DEFAULT_FUZZY_THRESHOLD".to_string(),
                })?;
        }
        if let Ok(limit) = std::env::var("RPS_DEFAULT_LIMIT") {
            self.search.default_limit = limit.parse().map_err(|_| ScreenError::Config {
                message: "Invalid number in RPS_DEFAULT_LIMIT".to_string(),
            })?;
        }
        if let Ok(max_limit) = std::env::var("RPS_MAX_LIMIT") {
            self.search.max_limit = max_limit.parse().map_err(|_| ScreenError::Config {
                message: "Invalid number in RPS_MAX_LIMIT".to_string(),
            })?;
        }
        if let Ok(profile_path) = std::env::var("RPS_COUNTRY_PROFILE_PATH") {
            self.country.profile_path = Some(PathBuf::from(profile_path));
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.search.default_fuzzy_threshold) {
            return Err(crate::validation_error!(
                "search.default_fuzzy_threshold",
                "Default fuzzy threshold must be between 0.0 and 1.0"
            ));
        }

        if self.search.default_limit == 0 {
            return Err(crate::validation_error!(
                "search.default_limit",
                "Default result limit must be at least 1"
            ));
        }

        if self.search.default_limit > self.search.max_limit {
            return Err(crate::validation_error!(
                "search.default_limit",
                "Default result limit cannot exceed the maximum"
            ));
        }

        Ok(())
    }

    /// Get configuration as TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ScreenError::Config {
            message: format!("Failed to serialize config to TOML: {}", e),
        })
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/screening_db"),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_fuzzy_threshold: 0.7,
            default_limit: 20,
            max_limit: 100,
        }
    }
}
