//! Path utilities for configuration and storage files
//!
//! Handles XDG directory specifications and path resolution.

use crate::error::{GeoError, Result};
use std::env;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "ipscope-rs";

/// Get the configuration directory
///
/// Priority:
/// 1. IPSCOPE_CONFIG_HOME environment variable
/// 2. IPSCOPE_HOME environment variable
/// 3. XDG_CONFIG_HOME/ipscope-rs
/// 4. ~/.config/ipscope-rs (fallback)
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(path) = env::var("IPSCOPE_CONFIG_HOME") {
        return Ok(PathBuf::from(path));
    }

    if let Ok(path) = env::var("IPSCOPE_HOME") {
        return Ok(PathBuf::from(path));
    }

    if let Some(config_dir) = dirs::config_dir() {
        return Ok(config_dir.join(APP_DIR));
    }

    Err(GeoError::config("Unable to determine config directory"))
}

/// Get the data directory holding the search history
///
/// Priority:
/// 1. IPSCOPE_DATA_HOME environment variable
/// 2. IPSCOPE_HOME environment variable
/// 3. XDG_DATA_HOME/ipscope-rs
/// 4. ~/.local/share/ipscope-rs (fallback)
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(path) = env::var("IPSCOPE_DATA_HOME") {
        return Ok(PathBuf::from(path));
    }

    if let Ok(path) = env::var("IPSCOPE_HOME") {
        return Ok(PathBuf::from(path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join(APP_DIR));
    }

    Err(GeoError::config("Unable to determine data directory"))
}

/// Get the path to the config file
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.yaml"))
}

/// Get the path to a file in the data directory
pub fn data_file(name: &str) -> Result<PathBuf> {
    Ok(data_dir()?.join(name))
}

/// Ensure directory exists, create if necessary
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .map_err(|e| GeoError::config(format!("Failed to create directory: {}", e)))?;
    }
    Ok(())
}

/// Ensure the config and data directories exist
pub fn ensure_app_dirs() -> Result<()> {
    ensure_dir(&config_dir()?)?;
    ensure_dir(&data_dir()?)?;
    Ok(())
}

/// Expand tilde (~) in path
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_name() {
        let file = config_file().unwrap();
        assert!(file.ends_with("config.yaml"));
    }

    #[test]
    fn test_data_file_name() {
        let file = data_file("storage.json").unwrap();
        assert!(file.ends_with("storage.json"));
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/test");
        assert!(!path.to_string_lossy().starts_with("~"));
        assert_eq!(expand_tilde("/tmp/x"), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn test_ensure_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
