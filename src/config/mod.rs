use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::weather::{Place, Unit};

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Delay between the last keystroke and the search request
pub const DEFAULT_DEBOUNCE_MS: u64 = 350;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
    /// Number of candidates asked from the geocoder
    #[serde(default = "default_result_count")]
    pub result_count: u8,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_geocoding_url() -> String { DEFAULT_GEOCODING_URL.to_string() }
fn default_forecast_url() -> String { DEFAULT_FORECAST_URL.to_string() }
fn default_result_count() -> u8 { 8 }
fn default_language() -> String { "en".to_string() }
fn default_timeout_secs() -> u64 { 10 }
fn default_debounce_ms() -> u64 { DEFAULT_DEBOUNCE_MS }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            geocoding_url: default_geocoding_url(),
            forecast_url: default_forecast_url(),
            result_count: default_result_count(),
            language: default_language(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Temperature/wind unit ("c" or "f")
    #[serde(default)]
    pub unit: Unit,

    #[serde(default = "default_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Optional kitty.conf-style color file for the palette
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_file: Option<PathBuf>,

    /// Last viewed place (restored on startup)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_place: Option<Place>,

    #[serde(default)]
    pub api: ApiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            unit: Unit::default(),
            search_debounce_ms: DEFAULT_DEBOUNCE_MS,
            theme_file: None,
            last_place: None,
            api: ApiConfig::default(),
        }
    }
}

impl AppConfig {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("weathernow");

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, falling back to defaults if missing or malformed
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config {}: {}", path.display(), e),
                },
                Err(e) => tracing::warn!("Failed to read config {}: {}", path.display(), e),
            }
        }

        Ok(AppConfig::default())
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(dir) {
                tracing::warn!("Could not create config directory: {}", e);
            }
        }

        // An empty name can't be searched again, so don't persist it
        let mut clean_config = self.clone();
        if clean_config
            .last_place
            .as_ref()
            .map(|p| p.name.trim().is_empty())
            .unwrap_or(false)
        {
            clean_config.last_place = None;
        }

        let content = toml::to_string_pretty(&clean_config)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
