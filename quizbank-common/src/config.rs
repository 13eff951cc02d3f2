//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable `QUIZBANK_ROOT_FOLDER`
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never prevents startup: a warning is
//! logged and compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "QUIZBANK_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "quizbank.db";

/// Media directory name inside the root folder
pub const MEDIA_DIR: &str = "question-images";

/// TOML configuration file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Root folder holding the database and media directory
    pub root_folder: Option<PathBuf>,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Media resolver configuration
    pub media: MediaConfig,
    /// Batch import configuration
    pub import: ImportConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing directive (overridden by RUST_LOG)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Media resolver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Ceiling for downloaded images in bytes
    pub max_image_bytes: u64,
    /// Timeout for a single external image fetch
    pub fetch_timeout_secs: u64,
    /// Path prefix under which stored images are served
    pub public_prefix: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: 5 * 1024 * 1024,
            fetch_timeout_secs: 10,
            public_prefix: "/api/images/".to_string(),
        }
    }
}

/// Batch import configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Maximum number of failure messages kept in an import report
    pub max_report_errors: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_report_errors: 10,
        }
    }
}

/// Default location of the TOML config file for this platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("quizbank").join("quizbank.toml"))
}

/// Parse TOML configuration text
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load TOML configuration, falling back to defaults
///
/// An explicit path that cannot be read or parsed is logged at WARN; a
/// missing default file is silent.
pub fn load_toml_config(explicit: Option<&Path>) -> TomlConfig {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                debug!("No config file found, using compiled defaults");
                return TomlConfig::default();
            }
        },
    };

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Config file unreadable, using defaults");
            return TomlConfig::default();
        }
    };

    match parse_toml_config(&content) {
        Ok(config) => {
            debug!(path = %path.display(), "Loaded config file");
            config
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Config file invalid, using defaults");
            TomlConfig::default()
        }
    }
}

/// Root folder resolution across CLI, environment, TOML and compiled default
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, config: &TomlConfig) -> Self {
        Self {
            cli_arg,
            toml_root: config.root_folder.clone(),
        }
    }

    /// Resolve the root folder
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            return path.clone();
        }

        default_root_folder()
    }
}

/// OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("quizbank"))
        .unwrap_or_else(|| PathBuf::from("./quizbank_data"))
}

/// Creates the root folder layout on first start
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder and media directory if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        std::fs::create_dir_all(self.media_path())?;
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn media_path(&self) -> PathBuf {
        self.root_folder.join(MEDIA_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_defaults() {
        let config = MediaConfig::default();
        assert_eq!(config.max_image_bytes, 5_242_880);
        assert_eq!(config.fetch_timeout_secs, 10);
        assert_eq!(config.public_prefix, "/api/images/");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = parse_toml_config("[media]\nfetch_timeout_secs = 3\n").unwrap();
        assert_eq!(config.media.fetch_timeout_secs, 3);
        assert_eq!(config.media.max_image_bytes, 5 * 1024 * 1024);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.import.max_report_errors, 10);
        assert!(config.root_folder.is_none());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = parse_toml_config("root_folder = [").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
