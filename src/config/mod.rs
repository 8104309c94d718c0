//! Configuration management for docq.
//!
//! Configuration is read from a TOML file, looked up in order:
//! 1. `./.docq.toml` (current directory)
//! 2. `<config dir>/docq/config.toml` (per-user configuration directory)
//!
//! A missing file, a missing key, or an unreadable candidate is never an
//! error: the next candidate is tried and defaults apply. Command-line
//! arguments override anything loaded here.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Theme selection
    pub theme: ThemeConfig,

    /// Display configuration
    pub display: DisplayConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Theme selection
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Named display theme (e.g. "monokai", "dracula")
    pub name: Option<String>,
}

/// Display and output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Enable colored output
    pub color_output: bool,

    /// Indentation width for structural output
    pub indent: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: LogLevel,

    /// Enable timestamps in logs
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color_output: true,
            indent: 2,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            timestamps: false,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Warn
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl Config {
    /// Candidate configuration file locations, highest priority first.
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".docq.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("docq").join("config.toml"));
        }
        paths
    }

    /// Load configuration from the first readable candidate.
    ///
    /// Candidates that are absent or fail to parse are skipped; when none
    /// works, the default configuration applies.
    pub fn load() -> Self {
        for path in Self::candidate_paths() {
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(config) => {
                    tracing::debug!(path = %path.display(), "loaded configuration");
                    return config;
                }
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping config");
                    continue;
                }
            }
        }
        Self::default()
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Unreadable(format!("{}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.theme.name, None);
        assert!(config.display.color_output);
        assert_eq!(config.display.indent, 2);
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            "[theme]\nname = \"dracula\"\n\n[display]\ncolor_output = false\nindent = 4\n\n\
             [logging]\nlevel = \"debug\"\ntimestamps = true\n",
        )
        .unwrap();
        assert_eq!(config.theme.name.as_deref(), Some("dracula"));
        assert!(!config.display.color_output);
        assert_eq!(config.display.indent, 4);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.logging.timestamps);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[theme]\nname = \"nord\"\n").unwrap();
        assert_eq!(config.theme.name.as_deref(), Some("nord"));
        assert!(config.display.color_output);
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.theme.name, None);
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }

    #[test]
    fn test_candidate_paths_start_with_cwd() {
        let paths = Config::candidate_paths();
        assert_eq!(paths[0], PathBuf::from(".docq.toml"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Config::from_file(Path::new("/nonexistent/.docq.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable(_)));
    }
}
