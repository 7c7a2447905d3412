//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Layout
//!
//! ```toml
//! [storage]
//! path = "/var/lib/gitdoku"
//!
//! [game]
//! puzzle = """
//! 070308100
//! ...
//! """
//! initial_branch = "master"
//!
//! [notify]
//! capacity = 3
//! backpressure = "block"
//! ```
//!
//! Every table and every key is optional; accessors on [`GameConfig`] fill in
//! defaults.
//!
//! # Validation
//!
//! Values are checked after parsing: the notification capacity is at least 1,
//! the initial branch is a valid branch name (enforced by deserialization) and
//! the puzzle parses and has a solution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::board::{Board, SAMPLE_PUZZLE};
use crate::core::puzzle;
use crate::core::types::BranchName;

/// Default per-observer channel capacity.
pub const DEFAULT_NOTIFY_CAPACITY: usize = 3;

/// Complete configuration for one game.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Where the object store lives
    pub storage: Option<StorageConfig>,

    /// Puzzle and branch defaults
    pub game: Option<GameSettings>,

    /// Observer channel settings
    pub notify: Option<NotifyConfig>,
}

impl GameConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(notify) = &self.notify {
            notify.validate()?;
        }

        if let Some(settings) = &self.game {
            if let Some(seed) = &settings.puzzle {
                let board = Board::from_puzzle(seed)
                    .map_err(|e| ConfigError::InvalidValue(format!("invalid puzzle: {}", e)))?;
                puzzle::solve(&board)
                    .map_err(|e| ConfigError::InvalidValue(format!("invalid puzzle: {}", e)))?;
            }
        }

        Ok(())
    }

    /// Persistent storage directory, or `None` for an ephemeral game.
    pub fn storage_path(&self) -> Option<&Path> {
        self.storage.as_ref().and_then(|s| s.path.as_deref())
    }

    /// The puzzle seed. Defaults to the built-in sample.
    pub fn puzzle(&self) -> &str {
        self.game
            .as_ref()
            .and_then(|g| g.puzzle.as_deref())
            .unwrap_or(SAMPLE_PUZZLE)
    }

    /// Branch created at the INITIAL commit. Defaults to `master`.
    pub fn initial_branch(&self) -> BranchName {
        self.game
            .as_ref()
            .and_then(|g| g.initial_branch.clone())
            .unwrap_or_default()
    }

    /// Per-observer channel capacity. Defaults to 3.
    pub fn notify_capacity(&self) -> usize {
        self.notify
            .as_ref()
            .and_then(|n| n.capacity)
            .unwrap_or(DEFAULT_NOTIFY_CAPACITY)
    }

    /// What publishing does when an observer's channel is full.
    pub fn backpressure(&self) -> Backpressure {
        self.notify
            .as_ref()
            .and_then(|n| n.backpressure)
            .unwrap_or_default()
    }

    /// Builder-style override of the storage path.
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage = Some(StorageConfig {
            path: Some(path.into()),
        });
        self
    }
}

/// Storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Game directory; absent means a temp dir removed when the game drops
    pub path: Option<PathBuf>,
}

/// Puzzle settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GameSettings {
    /// 9 rows of 9 digits, `0` for blanks
    pub puzzle: Option<String>,

    /// Branch created at the INITIAL commit
    pub initial_branch: Option<BranchName>,
}

/// Notification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    /// Channel capacity per observer (>= 1)
    pub capacity: Option<usize>,

    /// Full-channel policy
    pub backpressure: Option<Backpressure>,
}

impl NotifyConfig {
    /// Validate the notification settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == Some(0) {
            return Err(ConfigError::InvalidValue(
                "notify.capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Policy for publishing to an observer whose channel is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backpressure {
    /// Wait for the observer to make room. The publishing writer stalls.
    #[default]
    Block,
    /// Skip the observer for this commit and log a warning.
    Drop,
}
