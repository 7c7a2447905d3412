//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`BranchName`] - Validated branch id (stored as `refs/heads/<id>`)
//! - [`Oid`] - Content hash of a commit or blob
//! - [`ObserverId`] - Identity of a live subscriber
//! - [`Author`] - Player attribution for a commit
//!
//! # Validation
//!
//! These types enforce validity at construction time, so an invalid branch id
//! or hash can never reach the object store.
//!
//! # Examples
//!
//! ```
//! use gitdoku::core::types::{BranchName, Oid};
//!
//! let branch = BranchName::new("alice/left-column").unwrap();
//! assert_eq!(branch.ref_name(), "refs/heads/alice/left-column");
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid observer id: {0}")]
    InvalidObserverId(String),

    #[error("invalid author: {0}")]
    InvalidAuthor(String),
}

/// Namespace all branch refs live under.
pub const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// A validated branch id.
///
/// Branch ids follow git's refname rules because every branch is a ref in the
/// object store:
/// - Cannot be empty or exactly `@`
/// - No component may start with `.` or end with `.lock`
/// - Cannot start with `-` or `/`, or end with `/`
/// - Cannot contain `..`, `@{`, `//`, whitespace, `~^:\?*[` or control characters
///
/// # Example
///
/// ```
/// use gitdoku::core::types::BranchName;
///
/// let name = BranchName::new("master").unwrap();
/// assert_eq!(name.as_str(), "master");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new(".hidden").is_err());
/// assert!(BranchName::new("has space").is_err());
/// assert!(BranchName::new("@").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name).map_err(|reason| {
            TypeError::InvalidBranchName(format!("'{}': {}", name, reason))
        })?;
        Ok(Self(name))
    }

    /// Build a branch name back from a full ref (`refs/heads/<id>`).
    ///
    /// Returns `None` for refs outside the branch namespace.
    pub fn from_ref(refname: &str) -> Option<Self> {
        refname
            .strip_prefix(BRANCH_REF_PREFIX)
            .and_then(|name| Self::new(name).ok())
    }

    fn validate(name: &str) -> Result<(), String> {
        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        const INVALID_SEQUENCES: [&str; 3] = ["..", "@{", "//"];

        if name.is_empty() {
            return Err("cannot be empty".into());
        }
        if name == "@" {
            return Err("'@' is reserved".into());
        }
        if name.starts_with('-') || name.starts_with('/') || name.ends_with('/') {
            return Err("cannot start with '-' or '/', or end with '/'".into());
        }
        if let Some(seq) = INVALID_SEQUENCES.iter().find(|s| name.contains(*s)) {
            return Err(format!("cannot contain '{seq}'"));
        }
        if let Some(c) = name
            .chars()
            .find(|c| INVALID_CHARS.contains(c) || c.is_ascii_control())
        {
            return Err(format!("cannot contain {c:?}"));
        }
        if name
            .split('/')
            .any(|component| component.starts_with('.') || component.ends_with(".lock"))
        {
            return Err("components cannot start with '.' or end with '.lock'".into());
        }
        Ok(())
    }

    /// The full ref this branch is stored under.
    pub fn ref_name(&self) -> String {
        format!("{}{}", BRANCH_REF_PREFIX, self.0)
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Id of the branch a fresh game starts on.
pub const DEFAULT_BRANCH: &str = "master";

impl Default for BranchName {
    fn default() -> Self {
        Self(DEFAULT_BRANCH.to_string())
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A content hash identifying a commit or blob in the object store.
///
/// OIDs are normalized to lowercase.
///
/// # Example
///
/// ```
/// use gitdoku::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id (40 hex chars for SHA-1, 64 for SHA-256).
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(format!("'{oid}' is not hexadecimal")));
        }
        Ok(Self(oid))
    }

    /// Abbreviated form, at most `len` characters.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one live subscriber on one branch.
///
/// Transports usually pick one per connection; [`ObserverId::generate`]
/// hands out a fresh uuid when the caller has nothing better.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObserverId(String);

impl ObserverId {
    /// Create an observer id from a caller-chosen string.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidObserverId` if the id is empty or blank.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TypeError::InvalidObserverId(
                "observer id cannot be blank".into(),
            ));
        }
        Ok(Self(id))
    }

    /// A fresh random observer id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ObserverId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ObserverId> for String {
    fn from(id: ObserverId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The player a commit is attributed to.
///
/// Stored in the commit signature as `display_name <id>`, so neither part may
/// contain angle brackets or line breaks.
///
/// # Example
///
/// ```
/// use gitdoku::core::types::Author;
///
/// let author = Author::new("p-42", "Brave Turing").unwrap();
/// assert_eq!(author.to_string(), "Brave Turing <p-42>");
/// assert!(Author::new("p-1", "Eve <evil>").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    /// Stable player id
    pub id: String,
    /// Human-readable name
    pub display_name: String,
}

impl Author {
    /// Create a validated author.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidAuthor` for blank parts or parts that would
    /// break the signature format.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        let display_name = display_name.into();
        for (field, value) in [("id", &id), ("display name", &display_name)] {
            if value.trim().is_empty() {
                return Err(TypeError::InvalidAuthor(format!("{field} cannot be blank")));
            }
            if value.contains(['<', '>', '\n', '\r']) {
                return Err(TypeError::InvalidAuthor(format!(
                    "{field} cannot contain '<', '>' or line breaks"
                )));
            }
        }
        Ok(Self { id, display_name })
    }

    /// The author of every INITIAL commit.
    pub fn game_master() -> Self {
        Self {
            id: "gm@gitdoku.io".into(),
            display_name: "Game Master".into(),
        }
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.display_name, self.id)
    }
}
