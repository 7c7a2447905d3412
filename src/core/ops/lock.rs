//! core::ops::lock
//!
//! Exclusive cross-process lock on a game directory.
//!
//! # Invariants
//!
//! - Held for the whole lifetime of an open [`Game`](crate::game::Game)
//! - Released automatically on drop
//! - Acquisition is non-blocking (fails fast if locked)
//!
//! # Example
//!
//! ```no_run
//! use gitdoku::core::ops::lock::GameLock;
//! use gitdoku::core::paths::GamePaths;
//!
//! let paths = GamePaths::new("/var/lib/gitdoku");
//! let lock = GameLock::acquire(&paths)?;
//! assert!(lock.is_held());
//! drop(lock);
//! # Ok::<(), gitdoku::core::ops::lock::LockError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::GamePaths;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process has the game open.
    #[error("game is locked by another gitdoku process")]
    AlreadyLocked,

    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),
}

/// An exclusive lock on a game directory, released on drop.
#[derive(Debug)]
pub struct GameLock {
    path: PathBuf,
    file: Option<File>,
}

impl GameLock {
    /// Attempt to acquire the lock for `paths`.
    ///
    /// Creates the game directory if needed.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another process holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be acquired
    pub fn acquire(paths: &GamePaths) -> Result<Self, LockError> {
        fs::create_dir_all(paths.root()).map_err(|e| {
            LockError::CreateFailed(format!("cannot create {}: {}", paths.root().display(), e))
        })?;

        let path = paths.lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path,
                file: Some(file),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for GameLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}
