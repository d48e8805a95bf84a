//! Configuration module for ipscope-rs
//!
//! Handles loading and managing configuration from YAML files and environment variables.

use crate::error::{GeoError, Result};
use crate::utils::path;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProviderConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub global: GlobalConfig,
}

/// Provider endpoints and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Endpoints returning `{"ip": "..."}` for the caller, tried in order
    #[serde(default = "default_self_ip_urls")]
    pub self_ip_urls: Vec<String>,

    /// Base URL of the address-lookup provider
    #[serde(default = "default_lookup_base_url")]
    pub lookup_base_url: String,

    /// Access token for the address-lookup provider
    #[serde(default)]
    pub lookup_token: Option<String>,

    /// Reverse-geocoding providers, tried in order
    #[serde(default = "default_geocoders")]
    pub geocoders: Vec<GeocoderInfo>,

    /// Timeout applied to every outbound request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Individual reverse-geocoding provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocoderInfo {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub key: Option<String>,
}

/// Search history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of entries kept
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,

    /// Storage file (defaults to storage.json in the data directory)
    #[serde(default)]
    pub storage_file: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub enable_colors: bool,

    /// Output in JSON format
    #[serde(default)]
    pub json: bool,
}

/// Global configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Config file this configuration was loaded from
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

// Default value functions
fn default_self_ip_urls() -> Vec<String> {
    vec![
        "https://api.ipify.org?format=json".to_string(),
        "https://api64.ipify.org?format=json".to_string(),
        "https://ipinfo.io/json".to_string(),
    ]
}

fn default_lookup_base_url() -> String {
    "https://ipinfo.io".to_string()
}

fn default_geocoders() -> Vec<GeocoderInfo> {
    vec![GeocoderInfo {
        name: "opencage".to_string(),
        url: "https://api.opencagedata.com/geocode/v1/json".to_string(),
        key: None,
    }]
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_history_capacity() -> usize {
    20
}

fn default_true() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            self_ip_urls: default_self_ip_urls(),
            lookup_base_url: default_lookup_base_url(),
            lookup_token: None,
            geocoders: default_geocoders(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
            storage_file: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            enable_colors: true,
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location and environment variables
    pub fn load() -> Result<Self> {
        path::ensure_app_dirs()?;
        Self::load_from(&path::config_file()?)
    }

    /// Load configuration from a specific file, creating it with defaults when missing
    pub fn load_from(config_file: &Path) -> Result<Self> {
        let mut config = if config_file.exists() {
            let content = fs::read_to_string(config_file)
                .map_err(|e| GeoError::config(format!("Failed to read config file: {}", e)))?;

            Self::from_yaml(&content)?
        } else {
            let config = Self::default();
            if let Some(parent) = config_file.parent() {
                path::ensure_dir(parent)?;
            }
            config.save(config_file)?;
            config
        };

        config.global.config_path = Some(config_file.to_path_buf());
        config.apply_env();
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| GeoError::YamlError(format!("Failed to parse config file: {}", e)))
    }

    /// Apply environment variable overrides
    fn apply_env(&mut self) {
        self.apply_overrides(|name| env::var(name).ok());
    }

    /// Apply `IPSCOPE_*` overrides read through `var`
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("IPSCOPE_TOKEN") {
            self.providers.lookup_token = Some(val);
        }
        if let Some(val) = var("IPSCOPE_GEOCODE_KEY")
            && let Some(first) = self.providers.geocoders.first_mut()
        {
            first.key = Some(val);
        }
        if let Some(val) = var("IPSCOPE_TIMEOUT") {
            match val.trim().parse::<u64>() {
                Ok(secs) => self.providers.timeout_secs = secs,
                Err(_) => log::warn!("Ignoring invalid IPSCOPE_TIMEOUT value: {}", val),
            }
        }
    }

    /// Reject configurations that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.providers.self_ip_urls.is_empty() {
            return Err(GeoError::config("providers.self_ip_urls must not be empty"));
        }
        if self.providers.lookup_base_url.trim().is_empty() {
            return Err(GeoError::config("providers.lookup_base_url must not be empty"));
        }
        if self.history.capacity == 0 {
            return Err(GeoError::config("history.capacity must be at least 1"));
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| GeoError::YamlError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, yaml)
            .map_err(|e| GeoError::config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Path of the file-backed key-value store
    pub fn storage_path(&self) -> Result<PathBuf> {
        match self.history.storage_file {
            Some(ref custom) => Ok(path::expand_tilde(custom)),
            None => path::data_file("storage.json"),
        }
    }
}
