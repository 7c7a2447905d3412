//! core::paths
//!
//! Path routing for one game directory.
//!
//! # Storage Layout
//!
//! Everything a game persists lives under its root:
//! - `repo.git/` - bare object store (commits, trees, blobs, refs)
//! - `gitdoku.lock` - exclusive lock file held while the game is open
//!
//! No code outside this module should join these names onto a game root.
//!
//! # Example
//!
//! ```
//! use gitdoku::core::paths::GamePaths;
//! use std::path::PathBuf;
//!
//! let paths = GamePaths::new("/var/lib/gitdoku");
//! assert_eq!(paths.repo_dir(), PathBuf::from("/var/lib/gitdoku/repo.git"));
//! assert_eq!(paths.lock_path(), PathBuf::from("/var/lib/gitdoku/gitdoku.lock"));
//! ```

use std::path::{Path, PathBuf};

/// Name of the file each commit's board snapshot is stored under.
pub const BOARD_FILE: &str = "game.dat";

/// Path routing for one game directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamePaths {
    root: PathBuf,
}

impl GamePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The game directory itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The bare object store.
    pub fn repo_dir(&self) -> PathBuf {
        self.root.join("repo.git")
    }

    /// The exclusive lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.root.join("gitdoku.lock")
    }

    /// Whether a game has been created here.
    pub fn is_initialized(&self) -> bool {
        self.repo_dir().join("HEAD").is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn layout_is_under_root() {
        let paths = GamePaths::new("/games/one");
        assert_eq!(paths.root(), Path::new("/games/one"));
        assert!(paths.repo_dir().starts_with(paths.root()));
        assert!(paths.lock_path().starts_with(paths.root()));
    }

    #[test]
    fn empty_dir_is_not_initialized() {
        let temp = TempDir::new().unwrap();
        assert!(!GamePaths::new(temp.path()).is_initialized());
    }
}
