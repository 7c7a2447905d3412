//! game::refs
//!
//! The branch registry: named, mutable pointers into the commit graph.
//!
//! Branches are stored as `refs/heads/<id>` in the object store. Every write
//! is a compare-and-swap, so a branch is either absent or points at exactly
//! one commit, and a stale head can never overwrite a newer one.

use serde::Serialize;
use tracing::debug;

use super::errors::GameError;
use crate::core::types::{BranchName, Oid, BRANCH_REF_PREFIX};
use crate::git::{Git, GitError};

/// A branch and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub id: BranchName,
    pub head: Oid,
}

/// Where a new branch starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchTarget {
    /// An existing commit.
    Commit(Oid),
    /// The current head of another branch.
    Branch(BranchName),
}

impl BranchTarget {
    /// Build a target from two optional inputs, exactly one of which must be
    /// present. Used by transports that accept both as separate fields.
    pub fn from_options(commit: Option<&str>, branch: Option<&str>) -> Result<Self, GameError> {
        match (commit, branch) {
            (Some(commit), None) => Ok(BranchTarget::Commit(Oid::new(commit)?)),
            (None, Some(branch)) => Ok(BranchTarget::Branch(BranchName::new(branch)?)),
            (None, None) => Err(GameError::InvalidInput(
                "one of commit id or branch id is required".to_string(),
            )),
            (Some(_), Some(_)) => Err(GameError::InvalidInput(
                "commit id and branch id are mutually exclusive".to_string(),
            )),
        }
    }
}

/// Branch operations over one open store.
pub struct Refs<'a> {
    git: &'a Git,
}

impl<'a> Refs<'a> {
    pub fn new(git: &'a Git) -> Self {
        Self { git }
    }

    /// Look up a branch.
    ///
    /// # Errors
    ///
    /// [`GameError::BranchNotFound`] if it does not exist.
    pub fn get(&self, id: &BranchName) -> Result<Branch, GameError> {
        self.try_get(id)?
            .ok_or_else(|| GameError::BranchNotFound(id.to_string()))
    }

    pub fn try_get(&self, id: &BranchName) -> Result<Option<Branch>, GameError> {
        Ok(self.git.try_resolve_ref(&id.ref_name())?.map(|head| Branch {
            id: id.clone(),
            head,
        }))
    }

    /// All branches, in ref-name order.
    pub fn list(&self) -> Result<Vec<Branch>, GameError> {
        let entries = self.git.list_refs_by_prefix(BRANCH_REF_PREFIX)?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                BranchName::from_ref(&entry.name).map(|id| Branch {
                    id,
                    head: entry.oid,
                })
            })
            .collect())
    }

    /// Create a branch at `target`.
    ///
    /// # Errors
    ///
    /// - [`GameError::BranchExists`] if `id` is taken
    /// - [`GameError::CommitNotFound`] / [`GameError::BranchNotFound`] if the
    ///   target does not resolve
    pub fn create(&self, id: &BranchName, target: &BranchTarget) -> Result<Branch, GameError> {
        if self.try_get(id)?.is_some() {
            return Err(GameError::BranchExists(id.to_string()));
        }

        let head = match target {
            BranchTarget::Commit(oid) => {
                if !self.git.has_commit(oid)? {
                    return Err(GameError::CommitNotFound(oid.to_string()));
                }
                oid.clone()
            }
            BranchTarget::Branch(from) => self.get(from)?.head,
        };

        self.git
            .update_ref_cas(&id.ref_name(), &head, None, "gitdoku: create branch")
            .map_err(|err| match err {
                GitError::CasFailed { .. } => GameError::BranchExists(id.to_string()),
                other => other.into(),
            })?;

        debug!(branch = %id, head = %head.short(7), "created branch ref");
        Ok(Branch {
            id: id.clone(),
            head,
        })
    }

    /// Repoint `branch` at `new_head`, provided it still points where the
    /// caller last saw it.
    pub fn advance(&self, branch: &Branch, new_head: &Oid) -> Result<Branch, GameError> {
        self.git.update_ref_cas(
            &branch.id.ref_name(),
            new_head,
            Some(&branch.head),
            "gitdoku: advance",
        )?;
        Ok(Branch {
            id: branch.id.clone(),
            head: new_head.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::Signature;
    use tempfile::TempDir;

    fn store_with_root() -> (TempDir, Git, Oid) {
        let temp = TempDir::new().unwrap();
        let git = Git::init_bare(&temp.path().join("repo.git")).unwrap();
        let blob = git.write_blob(b"x").unwrap();
        let tree = git.write_single_file_tree("game.dat", &blob).unwrap();
        let root = git
            .create_commit(&tree, &[], &Signature::now("GM", "gm@x"), "INITIAL")
            .unwrap();
        (temp, git, root)
    }

    fn name(s: &str) -> BranchName {
        BranchName::new(s).unwrap()
    }

    #[test]
    fn create_get_list() {
        let (_temp, git, root) = store_with_root();
        let refs = Refs::new(&git);

        let master = refs
            .create(&name("master"), &BranchTarget::Commit(root.clone()))
            .unwrap();
        let copy = refs
            .create(&name("copy"), &BranchTarget::Branch(name("master")))
            .unwrap();
        assert_eq!(copy.head, master.head);
        assert_eq!(refs.get(&name("master")).unwrap(), master);

        let ids: Vec<_> = refs.list().unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![name("copy"), name("master")]);
    }

    #[test]
    fn create_rejects_duplicates_and_missing_targets() {
        let (_temp, git, root) = store_with_root();
        let refs = Refs::new(&git);
        refs.create(&name("master"), &BranchTarget::Commit(root.clone()))
            .unwrap();

        assert!(matches!(
            refs.create(&name("master"), &BranchTarget::Commit(root)),
            Err(GameError::BranchExists(_))
        ));
        assert!(matches!(
            refs.create(&name("x"), &BranchTarget::Branch(name("nope"))),
            Err(GameError::BranchNotFound(_))
        ));
        let ghost = Oid::new("0123456789abcdef0123456789abcdef01234567").unwrap();
        assert!(matches!(
            refs.create(&name("y"), &BranchTarget::Commit(ghost)),
            Err(GameError::CommitNotFound(_))
        ));
    }

    #[test]
    fn advance_is_compare_and_swap() {
        let (_temp, git, root) = store_with_root();
        let refs = Refs::new(&git);
        let master = refs
            .create(&name("master"), &BranchTarget::Commit(root.clone()))
            .unwrap();

        let blob = git.write_blob(b"y").unwrap();
        let tree = git.write_single_file_tree("game.dat", &blob).unwrap();
        let next = git
            .create_commit(&tree, &[root], &Signature::now("GM", "gm@x"), "x")
            .unwrap();

        let advanced = refs.advance(&master, &next).unwrap();
        assert_eq!(advanced.head, next);

        // `master` is now stale
        assert!(refs.advance(&master, &next).is_err());
    }

    #[test]
    fn target_from_options() {
        assert!(matches!(
            BranchTarget::from_options(None, Some("master")),
            Ok(BranchTarget::Branch(_))
        ));
        let none = BranchTarget::from_options(None, None).unwrap_err();
        assert_eq!(none.code(), crate::game::ErrorCode::InvalidInput);
        let both = BranchTarget::from_options(Some(&"a".repeat(40)), Some("master")).unwrap_err();
        assert_eq!(both.code(), crate::game::ErrorCode::InvalidInput);
    }
}
