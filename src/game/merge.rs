//! game::merge
//!
//! Merging one branch's history into another.
//!
//! # Algorithm
//!
//! 1. Collect the ancestor sets of both heads (each head included).
//! 2. The common ancestors are the intersection. The merge base is the one
//!    common ancestor that is not a parent of another common ancestor. Zero
//!    candidates means unrelated histories; more than one means criss-cross
//!    ancestry, which is rejected rather than resolved.
//! 3. If the base is the source head, the source fast-forwards to the target
//!    head and no commit is created.
//! 4. Otherwise every commit reachable from exactly one head is replayed onto
//!    the base board in author-timestamp order, and the result is committed on
//!    the source with parents `[source head, target head]`.
//!
//! Ties in timestamp keep encounter order: the source side first, then the
//! target side, each oldest first.
//!
//! The target branch is never modified.

use std::collections::HashSet;

use tracing::{debug, info};

use super::commit::{self, Commit};
use super::errors::GameError;
use super::refs::{Branch, Refs};
use crate::core::operation::{merge_message, Operation};
use crate::core::puzzle;
use crate::core::types::{Author, BranchName, Oid};
use crate::git::Git;

/// How a merge was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The source pointer moved to the target head.
    FastForward { head: Commit },
    /// A new merge commit was created from `replayed` edits.
    Replayed { commit: Commit, replayed: usize },
}

impl MergeOutcome {
    /// The commit the source branch now points at.
    pub fn head(&self) -> &Commit {
        match self {
            MergeOutcome::FastForward { head } => head,
            MergeOutcome::Replayed { commit, .. } => commit,
        }
    }

    pub fn is_fast_forward(&self) -> bool {
        matches!(self, MergeOutcome::FastForward { .. })
    }
}

/// Result of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// The updated source branch.
    pub branch: Branch,
    pub outcome: MergeOutcome,
}

/// One head's full ancestry in topological order (children first).
struct Ancestry {
    order: Vec<Oid>,
    set: HashSet<Oid>,
}

impl Ancestry {
    fn of(git: &Git, head: &Oid) -> Result<Self, GameError> {
        let order = git.walk_history(head)?;
        let set = order.iter().cloned().collect();
        Ok(Self { order, set })
    }
}

/// Best common ancestors of `a` and `b`.
///
/// A commit is a candidate if both heads reach it and it is not a parent of
/// another candidate. Since the common set is closed under ancestry, that
/// removes exactly the commits that are proper ancestors of other candidates.
pub fn merge_bases(git: &Git, a: &Oid, b: &Oid) -> Result<Vec<Oid>, GameError> {
    let left = Ancestry::of(git, a)?;
    let right = Ancestry::of(git, b)?;
    best_common(git, &left, &right)
}

fn best_common(git: &Git, left: &Ancestry, right: &Ancestry) -> Result<Vec<Oid>, GameError> {
    let common: Vec<&Oid> = left
        .order
        .iter()
        .filter(|oid| right.set.contains(*oid))
        .collect();

    let mut redundant = HashSet::new();
    for oid in &common {
        redundant.extend(git.commit_info(oid)?.parents);
    }

    Ok(common
        .into_iter()
        .filter(|oid| !redundant.contains(*oid))
        .cloned()
        .collect())
}

/// Load a commit that is about to be replayed. A message that does not parse
/// names no operation to re-apply.
fn load_replayable(git: &Git, oid: &Oid) -> Result<Commit, GameError> {
    commit::load_commit(git, oid).map_err(|err| match err {
        GameError::MalformedMessage { commit, error } => {
            GameError::UnreplayableMessage { commit, error }
        }
        other => other,
    })
}

/// Merge `source` with `target`, updating only `source`.
///
/// # Errors
///
/// - [`GameError::BranchNotFound`] if either branch is missing
/// - [`GameError::NoMergeBase`] / [`GameError::AmbiguousMergeBase`]
/// - [`GameError::UnreachableOperation`] if a merge or initial commit would
///   have to be replayed
/// - [`GameError::UnreplayableMessage`] if a commit to replay has a message
///   that does not parse
/// - whatever replaying an edit reports
///
/// Nothing is written unless every step succeeds; the final ref update is a
/// compare-and-swap against the source head read at the start.
pub fn merge(
    git: &Git,
    source: &BranchName,
    target: &BranchName,
    author: &Author,
) -> Result<MergeResult, GameError> {
    let refs = Refs::new(git);
    let src = refs.get(source)?;
    let tgt = refs.get(target)?;

    let src_history = Ancestry::of(git, &src.head)?;
    let tgt_history = Ancestry::of(git, &tgt.head)?;
    let bases = best_common(git, &src_history, &tgt_history)?;

    let base = match bases.as_slice() {
        [] => {
            return Err(GameError::NoMergeBase {
                source_branch: source.to_string(),
                target_branch: target.to_string(),
            })
        }
        [base] => base.clone(),
        many => {
            return Err(GameError::AmbiguousMergeBase {
                source_branch: source.to_string(),
                target_branch: target.to_string(),
                count: many.len(),
            })
        }
    };
    debug!(%source, %target, base = %base.short(7), "found merge base");

    if base == src.head {
        let head = commit::load_commit(git, &tgt.head)?;
        let branch = refs.advance(&src, &tgt.head)?;
        info!(%source, %target, head = %head.id.short(7), "fast-forwarded");
        return Ok(MergeResult {
            branch,
            outcome: MergeOutcome::FastForward { head },
        });
    }

    // Commits reachable from one head only, oldest first per side. The two
    // sides cannot overlap: a commit reachable from both heads is common.
    let mut pending = Vec::new();
    for (history, other) in [(&src_history, &tgt_history), (&tgt_history, &src_history)] {
        for oid in history.order.iter().rev() {
            if !other.set.contains(oid) {
                pending.push(load_replayable(git, oid)?);
            }
        }
    }
    pending.sort_by_key(|c| c.author_timestamp);

    let mut board = commit::read_board(git, &base)?;
    for step in &pending {
        match step.operation {
            Operation::Edit(edit) => puzzle::apply(&mut board, &edit)?,
            Operation::Initial | Operation::Merge => {
                return Err(GameError::UnreachableOperation {
                    commit: step.id.to_string(),
                    kind: step.operation.kind(),
                })
            }
        }
    }

    let merged = commit::commit_board(
        git,
        &board,
        &[src.head.clone(), tgt.head.clone()],
        Operation::Merge,
        &merge_message(source.as_str(), target.as_str()),
        author,
    )?;
    let branch = refs.advance(&src, &merged.id)?;
    info!(
        %source,
        %target,
        commit = %merged.id.short(7),
        replayed = pending.len(),
        "merged by replay"
    );

    Ok(MergeResult {
        branch,
        outcome: MergeOutcome::Replayed {
            commit: merged,
            replayed: pending.len(),
        },
    })
}
