//! gitdoku - collaborative sudoku with git-style history
//!
//! One puzzle, many players, many branches. Every cell edit is a commit in a
//! content-addressed object store; branches are named pointers into the
//! commit graph; branches merge by fast-forward or by replaying each side's
//! edits in author-time order. Observers subscribe to a branch and receive
//! every commit made on it while they are registered.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface (parses args, delegates to [`game`])
//! - [`game`] - The shared game: branch registry, merge engine, observer hub
//! - [`core`] - Domain types, board codec, puzzle rules, config
//! - [`git`] - Single interface to the object store
//!
//! # Correctness Invariants
//!
//! 1. Commits are immutable; branch heads only move by compare-and-swap
//! 2. A mutation either lands completely or leaves no trace
//! 3. Immutable puzzle cells never change on any branch
//! 4. The target of a merge is never modified

pub mod cli;
pub mod core;
pub mod game;
pub mod git;
