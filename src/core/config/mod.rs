//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first hit wins:
//! 1. An explicit path (the CLI's `--config`)
//! 2. `$GITDOKU_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/gitdoku/config.toml`
//! 4. `~/.gitdoku/config.toml`
//!
//! A missing file is not an error; defaults are used. An explicit path that
//! does not exist is an error.
//!
//! # Example
//!
//! ```no_run
//! use gitdoku::core::config::Config;
//!
//! let result = Config::load(None).unwrap();
//! let config = result.config;
//!
//! println!("capacity: {}", config.settings.notify_capacity());
//! println!("branch: {}", config.settings.initial_branch());
//! ```

pub mod schema;

pub use schema::{Backpressure, GameConfig, GameSettings, NotifyConfig, StorageConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "GITDOKU_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("config file '{0}' does not exist")]
    NotFound(PathBuf),

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Loaded configuration and where it came from.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed and validated settings
    pub settings: GameConfig,
    /// Path to the file the settings were read from, if any
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `explicit` or the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed or
    /// validated, or if `explicit` names a missing file.
    pub fn load(explicit: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let path = match explicit {
            Some(path) if path.exists() => Some(path.to_path_buf()),
            Some(path) => return Err(ConfigError::NotFound(path.to_path_buf())),
            None => Self::search(&mut warnings),
        };

        let settings = match &path {
            Some(path) => Self::read(path)?,
            None => GameConfig::default(),
        };
        settings.validate()?;

        Ok(ConfigLoadResult {
            config: Config {
                settings,
                loaded_from: path,
            },
            warnings,
        })
    }

    /// Wrap already-built settings, validating them.
    pub fn from_settings(settings: GameConfig) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            settings,
            loaded_from: None,
        })
    }

    fn search(warnings: &mut Vec<ConfigWarning>) -> Option<PathBuf> {
        // 1. $GITDOKU_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            warnings.push(ConfigWarning {
                message: format!("${} points at a missing file, ignoring it", CONFIG_ENV),
                path,
            });
        }

        // 2. $XDG_CONFIG_HOME/gitdoku/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("gitdoku/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. ~/.gitdoku/config.toml
        dirs::home_dir()
            .map(|home| home.join(".gitdoku/config.toml"))
            .filter(|path| path.exists())
    }

    fn read(path: &Path) -> Result<GameConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_path_is_loaded() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [notify]
            capacity = 7
            backpressure = "drop"
            "#,
        )
        .unwrap();

        let result = Config::load(Some(&path)).unwrap();
        assert_eq!(result.config.settings.notify_capacity(), 7);
        assert_eq!(result.config.settings.backpressure(), Backpressure::Drop);
        assert_eq!(result.config.loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let temp = TempDir::new().unwrap();
        let result = Config::load(Some(&temp.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[notify\ncapacity = ").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn validation_runs_after_parse() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[notify]\ncapacity = 0\n").unwrap();

        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn from_settings_validates() {
        let settings = GameConfig {
            notify: Some(NotifyConfig {
                capacity: Some(0),
                backpressure: None,
            }),
            ..Default::default()
        };
        assert!(Config::from_settings(settings).is_err());
        assert!(Config::from_settings(GameConfig::default()).is_ok());
    }
}
