//! core
//!
//! Core domain types, codecs and rules for gitdoku.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, ObserverId, Author
//! - [`board`] - The 9×9 board and its text codec
//! - [`puzzle`] - Validity, solving, hints and edits
//! - [`operation`] - Edit operations and commit-message encoding
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Path routing for a game directory
//! - [`ops`] - Cross-process locking
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Everything here is independent of the object store

pub mod board;
pub mod config;
pub mod operation;
pub mod ops;
pub mod paths;
pub mod puzzle;
pub mod types;
