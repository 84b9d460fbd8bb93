use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Environment variable that overrides the configured backend origin.
pub const BACKEND_URL_ENV: &str = "CT_SCAN_BACKEND_URL";

const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

/// Offline mode that fabricates results instead of calling the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub enabled: bool,
    /// How long a simulated analysis takes.
    pub delay_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_ms: 5000,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Origin of the prediction backend, e.g. `http://localhost:5000`.
    pub backend_url: String,
    pub simulate: SimulationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            simulate: SimulationConfig::default(),
        }
    }
}

impl Config {
    /// Directory: ~/.config/ct-scan-analyzer/
    fn dir() -> PathBuf {
        let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("ct-scan-analyzer");
        p
    }

    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load from the default location, then apply the environment override.
    pub fn load() -> Self {
        let mut config = Self::load_from(&Self::path());
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                config.backend_url = url;
            }
        }
        config
    }

    /// Load from `path`, returning defaults if the file doesn't exist or is invalid.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid config at {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Backend origin without a trailing slash, ready to have endpoints appended.
    pub fn backend_origin(&self) -> &str {
        self.backend_url.trim().trim_end_matches('/')
    }
}
