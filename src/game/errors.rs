//! game::errors
//!
//! The request-boundary error and its stable code.
//!
//! Every failure a caller can see is a [`GameError`]. Transports map it to
//! their own error shape through [`GameError::code`], whose `Display` form is
//! a fixed upper-case name such as `FIXED_CELL` or `AMBIGUOUS_MERGE_BASE`.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::core::board::DecodeError;
use crate::core::config::ConfigError;
use crate::core::operation::{MessageError, OperationKind};
use crate::core::ops::LockError;
use crate::core::puzzle::PuzzleError;
use crate::core::types::TypeError;
use crate::git::GitError;

/// Stable, transport-independent error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput,
    NotFound,
    AlreadyExists,
    FixedCell,
    Unsolvable,
    NoEmptyCell,
    AmbiguousMergeBase,
    NoMergeBase,
    UnreachableOperation,
    DecodeError,
    MalformedMessage,
    BlobNotFound,
    StorageError,
    Locked,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::FixedCell => "FIXED_CELL",
            ErrorCode::Unsolvable => "UNSOLVABLE",
            ErrorCode::NoEmptyCell => "NO_EMPTY_CELL",
            ErrorCode::AmbiguousMergeBase => "AMBIGUOUS_MERGE_BASE",
            ErrorCode::NoMergeBase => "NO_MERGE_BASE",
            ErrorCode::UnreachableOperation => "UNREACHABLE_OPERATION",
            ErrorCode::DecodeError => "DECODE_ERROR",
            ErrorCode::MalformedMessage => "MALFORMED_MESSAGE",
            ErrorCode::BlobNotFound => "BLOB_NOT_FOUND",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::Locked => "LOCKED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`Game`](super::Game) operations.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    InvalidName(#[from] TypeError),

    #[error(transparent)]
    Puzzle(#[from] PuzzleError),

    #[error("branch '{0}' not found")]
    BranchNotFound(String),

    #[error("commit {0} not found")]
    CommitNotFound(String),

    #[error("branch '{0}' already exists")]
    BranchExists(String),

    #[error("observer '{observer}' is already subscribed to '{branch}'")]
    ObserverExists { branch: String, observer: String },

    #[error("no game found at {0}")]
    GameNotFound(PathBuf),

    #[error("a game already exists at {0}")]
    GameExists(PathBuf),

    /// More than one best common ancestor (criss-cross history).
    #[error("'{source_branch}' and '{target_branch}' have {count} merge bases")]
    AmbiguousMergeBase {
        source_branch: String,
        target_branch: String,
        count: usize,
    },

    #[error("'{source_branch}' and '{target_branch}' share no history")]
    NoMergeBase {
        source_branch: String,
        target_branch: String,
    },

    /// A commit in the replay set cannot be re-applied.
    #[error("cannot replay {kind} commit {commit}")]
    UnreachableOperation { commit: String, kind: OperationKind },

    /// A commit in the replay set whose message does not parse.
    #[error("cannot replay commit {commit}: {error}")]
    UnreplayableMessage { commit: String, error: MessageError },

    #[error("board of commit {commit} is corrupt: {error}")]
    Decode { commit: String, error: DecodeError },

    #[error("message of commit {commit} is malformed: {error}")]
    MalformedMessage { commit: String, error: MessageError },

    #[error("commit {0} has no board snapshot")]
    BlobNotFound(String),

    #[error("game directory is locked by another process")]
    Locked,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(String),
}

impl GameError {
    /// The stable category for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            GameError::InvalidInput(_) | GameError::InvalidName(_) | GameError::Config(_) => {
                ErrorCode::InvalidInput
            }
            GameError::Puzzle(err) => match err {
                PuzzleError::FixedCell { .. } => ErrorCode::FixedCell,
                PuzzleError::CoordinateOutOfRange { .. } | PuzzleError::ValueOutOfRange { .. } => {
                    ErrorCode::InvalidInput
                }
                PuzzleError::Unsolvable => ErrorCode::Unsolvable,
                PuzzleError::NoEmptyCell => ErrorCode::NoEmptyCell,
            },
            GameError::BranchNotFound(_)
            | GameError::CommitNotFound(_)
            | GameError::GameNotFound(_) => ErrorCode::NotFound,
            GameError::BranchExists(_)
            | GameError::ObserverExists { .. }
            | GameError::GameExists(_) => ErrorCode::AlreadyExists,
            GameError::AmbiguousMergeBase { .. } => ErrorCode::AmbiguousMergeBase,
            GameError::NoMergeBase { .. } => ErrorCode::NoMergeBase,
            GameError::UnreachableOperation { .. } | GameError::UnreplayableMessage { .. } => {
                ErrorCode::UnreachableOperation
            }
            GameError::Decode { .. } => ErrorCode::DecodeError,
            GameError::MalformedMessage { .. } => ErrorCode::MalformedMessage,
            GameError::BlobNotFound(_) => ErrorCode::BlobNotFound,
            GameError::Locked => ErrorCode::Locked,
            GameError::Storage(_) => ErrorCode::StorageError,
        }
    }
}

impl From<GitError> for GameError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::ObjectNotFound { oid } => GameError::CommitNotFound(oid),
            GitError::FileNotFound { commit, .. } => GameError::BlobNotFound(commit),
            GitError::InvalidOid { oid } => {
                GameError::InvalidInput(format!("invalid commit id '{}'", oid))
            }
            other => GameError::Storage(other.to_string()),
        }
    }
}

impl From<LockError> for GameError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::AlreadyLocked => GameError::Locked,
            other => GameError::Storage(other.to_string()),
        }
    }
}

impl From<std::io::Error> for GameError {
    fn from(err: std::io::Error) -> Self {
        GameError::Storage(err.to_string())
    }
}
