//! Configuration management for tidesh
//!
//! This module handles loading, parsing, and managing configuration:
//! - Configuration files (TOML format)
//! - Default values
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result, ShellError};

fn default_true() -> bool {
    true
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Completion configuration
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Display configuration
    #[serde(default)]
    pub display: DisplayConfig,

    /// History configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Completion engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Directories searched for `<command>.tish` definition files
    #[serde(default = "CompletionConfig::default_path")]
    pub path: Vec<PathBuf>,

    /// Enable fuzzy (substring and subsequence) matching
    #[serde(default = "default_true")]
    pub fuzzy: bool,

    /// Fetch candidate descriptions
    #[serde(default = "default_true")]
    pub descriptions: bool,
}

impl CompletionConfig {
    fn default_path() -> Vec<PathBuf> {
        let mut path = Vec::new();
        if let Some(data) = dirs::data_dir() {
            path.push(data.join("tidesh").join("completions"));
        }
        path.push(PathBuf::from("/usr/share/tidesh/completions"));
        path
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            fuzzy: true,
            descriptions: true,
        }
    }
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color_output: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { color_output: true }
    }
}

/// History configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// History file location
    #[serde(default = "HistoryConfig::default_file_path")]
    pub file_path: PathBuf,

    /// Maximum entries kept
    #[serde(default = "HistoryConfig::default_max_entries")]
    pub max_entries: usize,
}

impl HistoryConfig {
    fn default_file_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tidesh_history")
    }

    fn default_max_entries() -> usize {
        10_000
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            file_path: Self::default_file_path(),
            max_entries: Self::default_max_entries(),
        }
    }
}

/// Log verbosity levels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Map to the tracing crate's level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum level that gets emitted
    #[serde(default)]
    pub level: LogLevel,

    /// Prefix log lines with timestamps
    #[serde(default)]
    pub timestamps: bool,
}

impl Config {
    /// Get the default configuration file path (~/.tideshrc)
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tideshrc")
    }

    /// Load configuration from file
    ///
    /// # Arguments
    /// * `path` - Path to configuration file (None for default path)
    ///
    /// # Returns
    /// * `Result<Self>` - Loaded configuration or error
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_config_path);

        // A missing config file just means defaults
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|e| {
            ShellError::Config(ConfigError::Unreadable(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            )))
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            ShellError::Config(ConfigError::InvalidFormat(format!(
                "Failed to parse config file '{}': {}",
                config_path.display(),
                e
            )))
        })?;

        Ok(config)
    }

    /// Save configuration to file
    ///
    /// # Arguments
    /// * `path` - Path to save configuration (None for default path)
    ///
    /// # Returns
    /// * `Result<()>` - Success or error
    pub fn save_to_file(&self, path: Option<&Path>) -> Result<()> {
        let config_path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_config_path);

        let body = toml::to_string_pretty(self).map_err(|e| {
            ShellError::Config(ConfigError::Generic(format!(
                "Failed to serialize config: {}",
                e
            )))
        })?;
        let content = format!("# tidesh configuration\n\n{}", body);

        fs::write(&config_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.completion.fuzzy);
        assert!(config.completion.descriptions);
        assert!(!config.completion.path.is_empty());
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load_from_file(Some(Path::new("/nonexistent/.tideshrc"))).unwrap();
        assert!(config.display.color_output);
    }

    #[test]
    fn test_save_and_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tideshrc");

        let mut config = Config::default();
        config.completion.fuzzy = false;
        config.logging.level = LogLevel::Debug;
        config.save_to_file(Some(&path)).unwrap();

        let loaded = Config::load_from_file(Some(&path)).unwrap();
        assert!(!loaded.completion.fuzzy);
        assert_eq!(loaded.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tideshrc");
        fs::write(&path, "[logging]\nlevel = \"trace\"\n").unwrap();

        let config = Config::load_from_file(Some(&path)).unwrap();
        assert_eq!(config.logging.level, LogLevel::Trace);
        assert!(config.completion.fuzzy);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tideshrc");
        fs::write(&path, "not valid toml [").unwrap();
        assert!(Config::load_from_file(Some(&path)).is_err());
    }
}
