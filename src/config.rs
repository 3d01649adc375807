// src/config.rs
//! Configuration management

use crate::error::{Result, TrackerError};
use crate::tiles::{DEFAULT_USER_AGENT, MAX_ZOOM};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Root of the on-disk tile cache; `$HOME/image_tiles` when unset
    pub cache_root: Option<PathBuf>,
    pub tile_source: String,  // "stamenterrain", "openstreetmap"
    pub zoom: u8,
    pub user_agent: String,
    /// HTTP timeout in seconds; the transport default applies when unset
    pub timeout_secs: Option<u64>,
    pub track_colors: Vec<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            cache_root: None,
            tile_source: "stamenterrain".to_string(),
            zoom: 12,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: None,
            track_colors: vec!["black".to_string()],
        }
    }
}

impl TrackerConfig {
    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| TrackerError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| TrackerError::Config(format!("Failed to parse config file: {}", e)))?;
        if config.zoom > MAX_ZOOM {
            return Err(TrackerError::Config(format!(
                "zoom {} in {} is above {}",
                config.zoom,
                config_path.display(),
                MAX_ZOOM
            )));
        }

        tracing::debug!("Loaded configuration from {}", config_path.display());
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TrackerError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(self)?;

        std::fs::write(config_path, contents)
            .map_err(|e| TrackerError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get config file path
    pub fn get_config_path() -> Result<PathBuf> {
        Ok(home_dir()?.join(".config").join("regatta-tracker").join("config.json"))
    }

    /// Effective tile cache root
    pub fn cache_root(&self) -> Result<PathBuf> {
        match &self.cache_root {
            Some(root) => Ok(root.clone()),
            None => Ok(home_dir()?.join("image_tiles")),
        }
    }

    /// Color for the `index`-th loaded track, cycling through the palette
    pub fn track_color(&self, index: usize) -> Option<&str> {
        if self.track_colors.is_empty() {
            return None;
        }
        Some(self.track_colors[index % self.track_colors.len()].as_str())
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.timeout_secs.map(std::time::Duration::from_secs)
    }
}

fn home_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| TrackerError::Config("HOME environment variable not set".to_string()))?;
    Ok(PathBuf::from(home))
}
