// ABOUTME: Configuration management for the oh-sqlite app
// ABOUTME: Database name, data directory, log level and record display thresholds in a JSON file

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "OhSqlite";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Config directory not found")]
    NoDirFound,
}

/// Settings for the home page record list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordsConfig {
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_excellent_score")]
    pub excellent_score: f64,
    #[serde(default = "default_good_score")]
    pub good_score: f64,
}

fn default_table() -> String {
    "users".to_string()
}

fn default_excellent_score() -> f64 {
    90.0
}

fn default_good_score() -> f64 {
    60.0
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            excellent_score: default_excellent_score(),
            good_score: default_good_score(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_database_name")]
    pub database_name: String,
    /// Overrides the platform app-data directory when set
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub records: RecordsConfig,
}

fn default_version() -> u32 {
    1
}

fn default_database_name() -> String {
    "app".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            database_name: default_database_name(),
            data_dir: None,
            log_level: default_log_level(),
            records: RecordsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Get the config file path based on OS
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoDirFound)?;
        Ok(config_dir.join(APP_DIR).join("config.json"))
    }

    /// Load config from file, or create default if not exists
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save config to file
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Directory holding the `.db` files: explicit override, then the
    /// platform directory handed in by the shell, then the local data dir
    pub fn resolve_data_dir(&self, platform_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = self.data_dir.as_deref().filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(dir));
        }
        if let Some(dir) = platform_dir {
            return Ok(dir);
        }
        let data_dir = dirs::data_local_dir().ok_or(ConfigError::NoDirFound)?;
        Ok(data_dir.join(APP_DIR))
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
