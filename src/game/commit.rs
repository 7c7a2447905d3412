//! game::commit
//!
//! Commits as the game sees them, and the adapter between boards and the
//! object store.
//!
//! # Storage
//!
//! Each commit's tree holds a single file, `game.dat`, with the full board
//! snapshot in the text format of [`Board::encode`]. The commit message
//! carries the operation (see [`crate::core::operation`]) and the author
//! signature carries the player: display name as the name, player id as the
//! email.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::errors::GameError;
use crate::core::board::Board;
use crate::core::operation::Operation;
use crate::core::paths::BOARD_FILE;
use crate::core::types::{Author, Oid};
use crate::git::{CommitInfo, Git, GitError, Signature};

/// An immutable node of the edit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub id: Oid,
    /// Empty for the initial commit, two entries for merges.
    pub parent_ids: Vec<Oid>,
    pub author_id: String,
    pub author_name: String,
    pub author_timestamp: DateTime<Utc>,
    pub operation: Operation,
}

impl Commit {
    pub fn is_merge(&self) -> bool {
        self.parent_ids.len() > 1
    }
}

/// Rebuild a [`Commit`] from raw commit data.
///
/// Commits with more than one parent are merges whatever their message says.
///
/// # Errors
///
/// [`GameError::MalformedMessage`] if the message does not parse.
pub fn parse_commit(info: CommitInfo) -> Result<Commit, GameError> {
    let operation = if info.parents.len() > 1 {
        Operation::Merge
    } else {
        Operation::parse_message(&info.message).map_err(|error| GameError::MalformedMessage {
            commit: info.oid.to_string(),
            error,
        })?
    };

    Ok(Commit {
        id: info.oid,
        parent_ids: info.parents,
        author_id: info.author_email,
        author_name: info.author_name,
        author_timestamp: info.author_time,
        operation,
    })
}

/// Look up and parse one commit.
pub fn load_commit(git: &Git, id: &Oid) -> Result<Commit, GameError> {
    parse_commit(git.commit_info(id)?)
}

/// Read the board snapshot attached to a commit.
///
/// # Errors
///
/// - [`GameError::BlobNotFound`] if the snapshot is missing
/// - [`GameError::Decode`] if it does not decode
pub fn read_board(git: &Git, commit: &Oid) -> Result<Board, GameError> {
    let bytes = git
        .read_commit_file(commit, BOARD_FILE)
        .map_err(|err| match err {
            GitError::FileNotFound { .. } | GitError::ObjectNotFound { .. } => {
                GameError::BlobNotFound(commit.to_string())
            }
            other => other.into(),
        })?;

    Board::decode(&bytes).map_err(|error| GameError::Decode {
        commit: commit.to_string(),
        error,
    })
}

/// Store `board` as a new commit. Does not move any branch.
///
/// `message` is normally `operation.to_message()`; merges pass the longer
/// `MERGE <source> <target>` form.
pub fn commit_board(
    git: &Git,
    board: &Board,
    parents: &[Oid],
    operation: Operation,
    message: &str,
    author: &Author,
) -> Result<Commit, GameError> {
    let blob = git.write_blob(&board.encode())?;
    let tree = git.write_single_file_tree(BOARD_FILE, &blob)?;

    let time = now_seconds();
    let signature = Signature::new(author.display_name.as_str(), author.id.as_str(), time);
    let id = git.create_commit(&tree, parents, &signature, message)?;

    Ok(Commit {
        id,
        parent_ids: parents.to_vec(),
        author_id: author.id.clone(),
        author_name: author.display_name.clone(),
        author_timestamp: time,
        operation,
    })
}

/// The current time at the precision commits store it.
fn now_seconds() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now)
}
