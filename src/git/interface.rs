//! git::interface
//!
//! Object-store access through git2.
//!
//! # Architecture
//!
//! The `Git` struct is the only way to touch the object store. No other
//! module imports `git2`. The store is always a bare repository: boards are
//! written straight to blobs and trees, so there is no working tree to keep
//! consistent.
//!
//! # Error Handling
//!
//! git2 errors are normalized into [`GitError`]:
//! - [`GitError::NotARepo`]: path holds no object store
//! - [`GitError::RefNotFound`]: requested ref does not exist
//! - [`GitError::ObjectNotFound`]: commit or blob id is unknown
//! - [`GitError::FileNotFound`]: a commit's tree lacks the requested file
//! - [`GitError::CasFailed`]: compare-and-swap precondition failed
//!
//! # Example
//!
//! ```no_run
//! use gitdoku::git::{Git, Signature};
//! use std::path::Path;
//!
//! let git = Git::init_bare(Path::new("/tmp/store.git"))?;
//! let blob = git.write_blob(b"hello")?;
//! let tree = git.write_single_file_tree("game.dat", &blob)?;
//! let sig = Signature::now("Game Master", "gm@gitdoku.io");
//! let commit = git.create_commit(&tree, &[], &sig, "INITIAL")?;
//! git.update_ref_cas("refs/heads/master", &commit, None, "gitdoku: init")?;
//! # Ok::<(), gitdoku::git::GitError>(())
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::types::{Oid, TypeError};

/// Errors from object-store operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// No object store at the path.
    #[error("not a gitdoku object store: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Compare-and-swap precondition failed.
    #[error("CAS failed for {refname}: expected {expected}, found {actual}")]
    CasFailed {
        /// The ref being updated
        refname: String,
        /// The expected old value
        expected: String,
        /// The actual current value
        actual: String,
    },

    /// Object not found in the store.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The id that was not found
        oid: String,
    },

    /// A commit's tree has no entry with the requested name.
    #[error("commit {commit} has no file '{name}'")]
    FileNotFound {
        /// The commit whose tree was searched
        commit: String,
        /// The missing file name
        name: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid id string
        oid: String,
    },

    /// Invalid ref name or signature text.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the problem
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    fn internal(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(oid) => GitError::InvalidOid { oid },
            other => GitError::InvalidInput {
                message: other.to_string(),
            },
        }
    }
}

/// A ref with its name and target id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefEntry {
    /// The full ref name
    pub name: String,
    /// The commit the ref points to
    pub oid: Oid,
}

/// Who a commit is attributed to, and when.
///
/// Timestamps are stored with whole-second precision in UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub time: DateTime<Utc>,
}

impl Signature {
    pub fn new(name: impl Into<String>, email: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            time,
        }
    }

    /// A signature stamped with the current time.
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::new(name, email, Utc::now())
    }

    fn to_git2(&self) -> Result<git2::Signature<'static>, GitError> {
        let when = git2::Time::new(self.time.timestamp(), 0);
        git2::Signature::new(&self.name, &self.email, &when).map_err(|e| GitError::InvalidInput {
            message: format!("signature '{} <{}>': {}", self.name, self.email, e.message()),
        })
    }
}

/// Information about a commit.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// The commit id
    pub oid: Oid,
    /// Parent ids in commit order
    pub parents: Vec<Oid>,
    /// Full commit message
    pub message: String,
    /// Author name
    pub author_name: String,
    /// Author email
    pub author_email: String,
    /// Author timestamp
    pub author_time: DateTime<Utc>,
}

/// Handle on one object store.
///
/// `git2::Repository` is `Send` but not `Sync`, so a `Git` is opened for the
/// duration of one operation and dropped afterwards.
pub struct Git {
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Opening
    // =========================================================================

    /// Create an empty bare object store at `path`.
    pub fn init_bare(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::init_bare(path).map_err(|e| GitError::Internal {
            message: format!("cannot create store at {}: {}", path.display(), e.message()),
        })?;
        Ok(Self { repo })
    }

    /// Open the bare object store at `path`.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if nothing usable is there
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open_bare(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        Ok(Self { repo })
    }

    /// Path to the store directory.
    pub fn path(&self) -> &Path {
        self.repo.path()
    }

    // =========================================================================
    // Refs
    // =========================================================================

    /// Resolve a ref to the commit it points at.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the ref doesn't exist
    pub fn resolve_ref(&self, refname: &str) -> Result<Oid, GitError> {
        let reference = self
            .repo
            .find_reference(refname)
            .map_err(|e| GitError::from_git2(e, refname))?;

        let oid = reference
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, refname))?
            .id();

        Ok(Oid::new(oid.to_string())?)
    }

    /// Resolve a ref, returning None if it doesn't exist.
    pub fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        match self.resolve_ref(refname) {
            Ok(oid) => Ok(Some(oid)),
            Err(GitError::RefNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Point the store's symbolic `HEAD` at `refname`.
    pub fn set_head(&self, refname: &str) -> Result<(), GitError> {
        self.repo
            .set_head(refname)
            .map_err(|e| GitError::from_git2(e, refname))
    }

    /// The ref `HEAD` points at, e.g. `refs/heads/master`.
    pub fn head_ref(&self) -> Result<Option<String>, GitError> {
        match self.repo.find_reference("HEAD") {
            Ok(head) => Ok(head.symbolic_target().map(str::to_string)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, "HEAD")),
        }
    }

    /// List all refs under a prefix, e.g. `refs/heads/`.
    pub fn list_refs_by_prefix(&self, prefix: &str) -> Result<Vec<RefEntry>, GitError> {
        let pattern = format!("{}*", prefix);
        let refs = self
            .repo
            .references_glob(&pattern)
            .map_err(GitError::internal)?;

        let mut entries = Vec::new();
        for reference in refs {
            let reference = reference.map_err(GitError::internal)?;

            // Skip refs with non-UTF8 names
            let Some(name) = reference.name() else {
                continue;
            };
            let Some(target) = reference.target() else {
                continue;
            };

            entries.push(RefEntry {
                name: name.to_string(),
                oid: Oid::new(target.to_string())?,
            });
        }

        Ok(entries)
    }

    /// Update a ref with compare-and-swap semantics.
    ///
    /// The update only succeeds if the ref's current value matches
    /// `expected_old`. `None` means the ref must not exist yet.
    ///
    /// # Errors
    ///
    /// - [`GitError::CasFailed`] if the current value doesn't match expected
    pub fn update_ref_cas(
        &self,
        refname: &str,
        new_oid: &Oid,
        expected_old: Option<&Oid>,
        message: &str,
    ) -> Result<(), GitError> {
        let new = to_git2_oid(new_oid)?;
        let result = match expected_old {
            Some(expected) => self.repo.reference_matching(
                refname,
                new,
                true,
                to_git2_oid(expected)?,
                message,
            ),
            None => self.repo.reference(refname, new, false, message),
        };

        match result {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.code(), git2::ErrorCode::Modified | git2::ErrorCode::Exists) => {
                let actual = self
                    .try_resolve_ref(refname)?
                    .map_or_else(|| "<none>".to_string(), |oid| oid.to_string());
                Err(GitError::CasFailed {
                    refname: refname.to_string(),
                    expected: expected_old.map_or_else(|| "<none>".to_string(), Oid::to_string),
                    actual,
                })
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Err(GitError::CasFailed {
                refname: refname.to_string(),
                expected: expected_old.map_or_else(|| "<none>".to_string(), Oid::to_string),
                actual: "<none>".to_string(),
            }),
            Err(e) => Err(GitError::from_git2(e, refname)),
        }
    }

    // =========================================================================
    // Blobs and trees
    // =========================================================================

    /// Write content as a blob and return its id.
    pub fn write_blob(&self, content: &[u8]) -> Result<Oid, GitError> {
        let oid = self.repo.blob(content).map_err(GitError::internal)?;
        Ok(Oid::new(oid.to_string())?)
    }

    /// Read a blob by id.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the blob doesn't exist
    pub fn read_blob(&self, oid: &Oid) -> Result<Vec<u8>, GitError> {
        let blob = self
            .repo
            .find_blob(to_git2_oid(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        Ok(blob.content().to_vec())
    }

    /// Write a tree holding exactly one regular file.
    pub fn write_single_file_tree(&self, name: &str, blob: &Oid) -> Result<Oid, GitError> {
        let mut builder = self.repo.treebuilder(None).map_err(GitError::internal)?;
        builder
            .insert(name, to_git2_oid(blob)?, 0o100644)
            .map_err(|e| GitError::from_git2(e, blob.as_str()))?;
        let oid = builder.write().map_err(GitError::internal)?;
        Ok(Oid::new(oid.to_string())?)
    }

    /// Read the file `name` from a commit's tree.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the commit or the blob is missing
    /// - [`GitError::FileNotFound`] if the tree has no such entry
    pub fn read_commit_file(&self, commit: &Oid, name: &str) -> Result<Vec<u8>, GitError> {
        let tree = self
            .find_commit(commit)?
            .tree()
            .map_err(|e| GitError::from_git2(e, commit.as_str()))?;

        let entry = tree.get_name(name).ok_or_else(|| GitError::FileNotFound {
            commit: commit.to_string(),
            name: name.to_string(),
        })?;

        let blob = self
            .repo
            .find_blob(entry.id())
            .map_err(|e| GitError::from_git2(e, &entry.id().to_string()))?;
        Ok(blob.content().to_vec())
    }

    // =========================================================================
    // Commits
    // =========================================================================

    /// Create a commit object without moving any ref.
    pub fn create_commit(
        &self,
        tree: &Oid,
        parents: &[Oid],
        author: &Signature,
        message: &str,
    ) -> Result<Oid, GitError> {
        let tree = self
            .repo
            .find_tree(to_git2_oid(tree)?)
            .map_err(|e| GitError::from_git2(e, tree.as_str()))?;

        let parents = parents
            .iter()
            .map(|oid| self.find_commit(oid))
            .collect::<Result<Vec<_>, _>>()?;
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

        let signature = author.to_git2()?;
        let oid = self
            .repo
            .commit(None, &signature, &signature, message, &tree, &parent_refs)
            .map_err(GitError::internal)?;
        Ok(Oid::new(oid.to_string())?)
    }

    /// Get information about a commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the commit doesn't exist
    pub fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        let commit = self.find_commit(oid)?;

        let parents = commit
            .parent_ids()
            .map(|id| Oid::new(id.to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        let author = commit.author();
        let author_time = DateTime::from_timestamp(author.when().seconds(), 0)
            .unwrap_or(DateTime::UNIX_EPOCH);

        Ok(CommitInfo {
            oid: oid.clone(),
            parents,
            message: commit.message().unwrap_or("").to_string(),
            author_name: author.name().unwrap_or("").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            author_time,
        })
    }

    /// Whether a commit with this id exists.
    pub fn has_commit(&self, oid: &Oid) -> Result<bool, GitError> {
        match self.find_commit(oid) {
            Ok(_) => Ok(true),
            Err(GitError::ObjectNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// All commits reachable from `from`, children before parents, newest
    /// first among unrelated commits.
    pub fn walk_history(&self, from: &Oid) -> Result<Vec<Oid>, GitError> {
        let mut revwalk = self.repo.revwalk().map_err(GitError::internal)?;
        revwalk
            .set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)
            .map_err(GitError::internal)?;
        revwalk
            .push(to_git2_oid(from)?)
            .map_err(|e| GitError::from_git2(e, from.as_str()))?;

        revwalk
            .map(|id| -> Result<Oid, GitError> {
                let id = id.map_err(GitError::internal)?;
                Ok(Oid::new(id.to_string())?)
            })
            .collect()
    }

    fn find_commit(&self, oid: &Oid) -> Result<git2::Commit<'_>, GitError> {
        self.repo
            .find_commit(to_git2_oid(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))
    }
}

fn to_git2_oid(oid: &Oid) -> Result<git2::Oid, GitError> {
    git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, Git) {
        let temp = TempDir::new().unwrap();
        let git = Git::init_bare(&temp.path().join("store.git")).unwrap();
        (temp, git)
    }

    fn sig(secs: i64) -> Signature {
        Signature::new("Tester", "t@example.com", DateTime::from_timestamp(secs, 0).unwrap())
    }

    fn commit_file(git: &Git, content: &[u8], parents: &[Oid], secs: i64) -> Oid {
        let blob = git.write_blob(content).unwrap();
        let tree = git.write_single_file_tree("game.dat", &blob).unwrap();
        git.create_commit(&tree, parents, &sig(secs), "msg").unwrap()
    }

    #[test]
    fn open_missing_store_fails() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            Git::open(&temp.path().join("nothing")),
            Err(GitError::NotARepo { .. })
        ));
    }

    #[test]
    fn blob_round_trip() {
        let (_temp, git) = store();
        let oid = git.write_blob(b"board bytes").unwrap();
        assert_eq!(git.read_blob(&oid).unwrap(), b"board bytes");
    }

    #[test]
    fn commit_file_and_info() {
        let (_temp, git) = store();
        let root = commit_file(&git, b"one", &[], 1_700_000_000);
        let child = commit_file(&git, b"two", &[root.clone()], 1_700_000_001);

        assert_eq!(git.read_commit_file(&child, "game.dat").unwrap(), b"two");
        assert!(matches!(
            git.read_commit_file(&child, "other.dat"),
            Err(GitError::FileNotFound { .. })
        ));

        let info = git.commit_info(&child).unwrap();
        assert_eq!(info.parents, vec![root.clone()]);
        assert_eq!(info.message, "msg");
        assert_eq!(info.author_name, "Tester");
        assert_eq!(info.author_email, "t@example.com");
        assert_eq!(info.author_time.timestamp(), 1_700_000_001);

        assert_eq!(git.walk_history(&child).unwrap(), vec![child, root]);
    }

    #[test]
    fn unknown_commit() {
        let (_temp, git) = store();
        let missing = Oid::new("0123456789abcdef0123456789abcdef01234567").unwrap();
        assert!(!git.has_commit(&missing).unwrap());
        assert!(matches!(
            git.commit_info(&missing),
            Err(GitError::ObjectNotFound { .. })
        ));
    }

    #[test]
    fn cas_create_and_update() {
        let (_temp, git) = store();
        let a = commit_file(&git, b"a", &[], 1);
        let b = commit_file(&git, b"b", &[a.clone()], 2);
        let refname = "refs/heads/master";

        git.update_ref_cas(refname, &a, None, "create").unwrap();
        assert_eq!(git.resolve_ref(refname).unwrap(), a);

        // creating again must fail
        assert!(matches!(
            git.update_ref_cas(refname, &b, None, "create"),
            Err(GitError::CasFailed { .. })
        ));

        // stale expectation must fail
        assert!(matches!(
            git.update_ref_cas(refname, &a, Some(&b), "advance"),
            Err(GitError::CasFailed { .. })
        ));

        git.update_ref_cas(refname, &b, Some(&a), "advance").unwrap();
        assert_eq!(git.resolve_ref(refname).unwrap(), b);

        let refs = git.list_refs_by_prefix("refs/heads/").unwrap();
        assert_eq!(
            refs,
            vec![RefEntry {
                name: refname.to_string(),
                oid: b
            }]
        );
        assert_eq!(git.try_resolve_ref("refs/heads/none").unwrap(), None);
    }

    #[test]
    fn head_follows_set_head() {
        let (_temp, git) = store();
        let a = commit_file(&git, b"a", &[], 1);
        git.update_ref_cas("refs/heads/main", &a, None, "create").unwrap();
        git.set_head("refs/heads/main").unwrap();
        assert_eq!(git.head_ref().unwrap().as_deref(), Some("refs/heads/main"));
    }
}
