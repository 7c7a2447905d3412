//! cli
//!
//! Command-line front end for gitdoku.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Resolve the game directory and the acting player
//! - Delegate to command handlers, which call into [`crate::game::Game`]
//!
//! The CLI never touches the object store directly.

pub mod args;
pub mod commands;

pub use args::Cli;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::core::config::{Config, GameConfig};
use crate::core::types::Author;

/// Directory used when neither `--dir` nor the config names one.
pub const DEFAULT_GAME_DIR: &str = ".gitdoku";

/// Everything a command handler needs besides its own arguments.
#[derive(Debug, Clone)]
pub struct Context {
    /// Settings with the storage path already resolved
    pub settings: GameConfig,
    /// Commit author for mutations
    pub player: Author,
    pub json: bool,
    pub debug: bool,
}

impl Context {
    /// The resolved game directory.
    pub fn game_dir(&self) -> &Path {
        self.settings
            .storage_path()
            .unwrap_or_else(|| Path::new(DEFAULT_GAME_DIR))
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let loaded = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    for warning in &loaded.warnings {
        tracing::warn!(path = %warning.path.display(), "{}", warning.message);
    }

    let settings = loaded.config.settings;
    let dir = cli
        .dir
        .clone()
        .or_else(|| settings.storage_path().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_GAME_DIR));

    let name = cli.player_name.clone().unwrap_or_else(|| cli.player.clone());
    let player = Author::new(cli.player.clone(), name).context("Invalid --player")?;

    let ctx = Context {
        settings: settings.with_storage_path(dir),
        player,
        json: cli.json,
        debug: cli.debug,
    };

    commands::dispatch(cli.command, &ctx)
}
