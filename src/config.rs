use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::normalize::NormalizerConfig;

/// Minimum classifier confidence for surfacing a diagnosis
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Default detection service endpoint
pub const DEFAULT_DETECT_ENDPOINT: &str = "http://localhost:5000/detect";

/// Engine configuration, loaded from ~/.leafadvisor/config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    pub schema_version: u32,
    pub confidence_threshold: f64,
    pub detect_endpoint: String,
    /// Override for the state directory; None uses the default
    pub state_dir: Option<PathBuf>,
    pub normalizer: NormalizerConfig,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            detect_endpoint: DEFAULT_DETECT_ENDPOINT.to_string(),
            state_dir: None,
            normalizer: NormalizerConfig::default(),
        }
    }
}

impl AdvisorConfig {
    /// Get the default config directory
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".leafadvisor"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Resolve the state directory for persisted adaptive state
    pub fn state_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.state_dir {
            Ok(dir.clone())
        } else {
            Ok(Self::config_dir()?.join("state"))
        }
    }

    /// Load config from file or return default
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                debug!("Failed to load config, using default: {}", e);
                Self::default()
            }
        }
    }

    /// Load config from file
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: AdvisorConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}
