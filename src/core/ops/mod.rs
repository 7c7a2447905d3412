//! core::ops
//!
//! Cross-process coordination.
//!
//! # Modules
//!
//! - [`lock`] - Exclusive game-directory lock

pub mod lock;

pub use lock::{GameLock, LockError};
