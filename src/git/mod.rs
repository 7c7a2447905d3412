//! git
//!
//! Single interface to the object store.
//!
//! # Architecture
//!
//! This module is the **only doorway** to `git2`. Blobs, trees, commits and
//! refs are all created and read here; no other module imports `git2`.
//!
//! # Responsibilities
//!
//! - Creating and opening the bare store
//! - Ref operations (resolve, enumerate, CAS update)
//! - Object operations (blobs, single-file trees, commits)
//! - History traversal
//!
//! # Invariants
//!
//! - All ref updates use CAS (compare-and-swap) semantics
//! - All operations return strong types (`Oid`)

mod interface;

pub use interface::{CommitInfo, Git, GitError, RefEntry, Signature};
