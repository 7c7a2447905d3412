//! core::operation
//!
//! Edit operations and their commit-message encoding.
//!
//! # Message Format
//!
//! Every commit message starts with a type token:
//!
//! | Operation     | Message                     |
//! |---------------|-----------------------------|
//! | `INITIAL`     | `INITIAL`                   |
//! | `ADD_FILL`    | `ADD_FILL <row> <col> <val>`|
//! | `REMOVE_FILL` | `REMOVE_FILL <row> <col> 0` |
//! | `TOGGLE_NOTE` | `TOGGLE_NOTE <row> <col> <val>` |
//! | `MERGE`       | `MERGE <source> <target>`   |
//!
//! Merge commits are recognised by their parent count, not their message, so
//! the branch names after `MERGE` are informational only.
//!
//! # Example
//!
//! ```
//! use gitdoku::core::operation::{Edit, Operation};
//!
//! let op = Operation::Edit(Edit::AddFill { row: 0, col: 0, val: 5 });
//! assert_eq!(op.to_message(), "ADD_FILL 0 0 5");
//! assert_eq!(Operation::parse_message("ADD_FILL 0 0 5").unwrap(), op);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing a commit message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("empty commit message")]
    Empty,

    #[error("unknown operation type '{0}'")]
    UnknownType(String),

    #[error("{kind} expects {expected} tokens, found {found}")]
    TokenCount {
        kind: OperationKind,
        expected: usize,
        found: usize,
    },

    #[error("'{token}' is not a valid {field}")]
    NotANumber { field: &'static str, token: String },
}

/// The type tag of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    Initial,
    AddFill,
    RemoveFill,
    ToggleNote,
    Merge,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Initial => "INITIAL",
            OperationKind::AddFill => "ADD_FILL",
            OperationKind::RemoveFill => "REMOVE_FILL",
            OperationKind::ToggleNote => "TOGGLE_NOTE",
            OperationKind::Merge => "MERGE",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "INITIAL" => OperationKind::Initial,
            "ADD_FILL" => OperationKind::AddFill,
            "REMOVE_FILL" => OperationKind::RemoveFill,
            "TOGGLE_NOTE" => OperationKind::ToggleNote,
            "MERGE" => OperationKind::Merge,
            _ => return None,
        })
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single-cell change a player can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Edit {
    AddFill { row: usize, col: usize, val: u8 },
    RemoveFill { row: usize, col: usize },
    ToggleNote { row: usize, col: usize, val: u8 },
}

impl Edit {
    pub fn coordinate(&self) -> (usize, usize) {
        match *self {
            Edit::AddFill { row, col, .. }
            | Edit::RemoveFill { row, col }
            | Edit::ToggleNote { row, col, .. } => (row, col),
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Edit::AddFill { .. } => OperationKind::AddFill,
            Edit::RemoveFill { .. } => OperationKind::RemoveFill,
            Edit::ToggleNote { .. } => OperationKind::ToggleNote,
        }
    }

    /// The value token written to the message (`0` for removals).
    pub fn value(&self) -> u8 {
        match *self {
            Edit::AddFill { val, .. } | Edit::ToggleNote { val, .. } => val,
            Edit::RemoveFill { .. } => 0,
        }
    }
}

/// What a commit did to its parent's board.
///
/// Serializes flat: `{"type": "ADD_FILL", "row": 0, "col": 1, "val": 2}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "OperationRepr")]
pub enum Operation {
    Initial,
    Edit(Edit),
    Merge,
}

#[derive(Serialize)]
struct OperationRepr {
    #[serde(rename = "type")]
    kind: OperationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    col: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    val: Option<u8>,
}

impl From<Operation> for OperationRepr {
    fn from(op: Operation) -> Self {
        let mut repr = OperationRepr {
            kind: op.kind(),
            row: None,
            col: None,
            val: None,
        };
        if let Operation::Edit(edit) = op {
            let (row, col) = edit.coordinate();
            repr.row = Some(row);
            repr.col = Some(col);
            if !matches!(edit, Edit::RemoveFill { .. }) {
                repr.val = Some(edit.value());
            }
        }
        repr
    }
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Initial => OperationKind::Initial,
            Operation::Edit(edit) => edit.kind(),
            Operation::Merge => OperationKind::Merge,
        }
    }

    /// Message for this operation. Merge messages carry no branch names here;
    /// see [`merge_message`].
    pub fn to_message(&self) -> String {
        match self {
            Operation::Edit(edit) => {
                let (row, col) = edit.coordinate();
                format!("{} {} {} {}", edit.kind(), row, col, edit.value())
            }
            other => other.kind().as_str().to_string(),
        }
    }

    /// Parse a commit message back into an operation.
    ///
    /// Tokens are whitespace-separated; the count must match the shape of the
    /// leading type token exactly.
    pub fn parse_message(message: &str) -> Result<Self, MessageError> {
        let tokens: Vec<&str> = message.split_whitespace().collect();
        let (&head, args) = tokens.split_first().ok_or(MessageError::Empty)?;
        let kind =
            OperationKind::from_token(head).ok_or_else(|| MessageError::UnknownType(head.into()))?;

        let expect = |expected: usize| {
            if tokens.len() == expected {
                Ok(())
            } else {
                Err(MessageError::TokenCount {
                    kind,
                    expected,
                    found: tokens.len(),
                })
            }
        };

        match kind {
            OperationKind::Initial => {
                expect(1)?;
                Ok(Operation::Initial)
            }
            OperationKind::Merge => Ok(Operation::Merge),
            OperationKind::AddFill | OperationKind::RemoveFill | OperationKind::ToggleNote => {
                expect(4)?;
                let row = parse_number::<usize>(args[0], "row")?;
                let col = parse_number::<usize>(args[1], "column")?;
                let val = parse_number::<u8>(args[2], "value")?;
                Ok(Operation::Edit(match kind {
                    OperationKind::AddFill => Edit::AddFill { row, col, val },
                    OperationKind::RemoveFill => Edit::RemoveFill { row, col },
                    _ => Edit::ToggleNote { row, col, val },
                }))
            }
        }
    }
}

/// Message for a merge commit of `source` with `target`.
pub fn merge_message(source: &str, target: &str) -> String {
    format!("{} {} {}", OperationKind::Merge, source, target)
}

fn parse_number<T: std::str::FromStr>(token: &str, field: &'static str) -> Result<T, MessageError> {
    token.parse().map_err(|_| MessageError::NotANumber {
        field,
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_messages() {
        let cases = [
            (Edit::AddFill { row: 1, col: 2, val: 3 }, "ADD_FILL 1 2 3"),
            (Edit::RemoveFill { row: 4, col: 5 }, "REMOVE_FILL 4 5 0"),
            (Edit::ToggleNote { row: 8, col: 0, val: 9 }, "TOGGLE_NOTE 8 0 9"),
        ];
        for (edit, message) in cases {
            assert_eq!(Operation::Edit(edit).to_message(), message);
            assert_eq!(Operation::parse_message(message), Ok(Operation::Edit(edit)));
        }
    }

    #[test]
    fn remove_fill_ignores_value_token() {
        assert_eq!(
            Operation::parse_message("REMOVE_FILL 1 1 7"),
            Ok(Operation::Edit(Edit::RemoveFill { row: 1, col: 1 }))
        );
    }

    #[test]
    fn initial_and_merge() {
        assert_eq!(Operation::Initial.to_message(), "INITIAL");
        assert_eq!(Operation::parse_message("INITIAL"), Ok(Operation::Initial));
        assert_eq!(
            Operation::parse_message(&merge_message("a", "b")),
            Ok(Operation::Merge)
        );
    }

    #[test]
    fn malformed_messages() {
        assert_eq!(Operation::parse_message("   "), Err(MessageError::Empty));
        assert!(matches!(
            Operation::parse_message("SHUFFLE 1 2 3"),
            Err(MessageError::UnknownType(_))
        ));
        assert!(matches!(
            Operation::parse_message("ADD_FILL 1 2"),
            Err(MessageError::TokenCount { expected: 4, found: 3, .. })
        ));
        assert!(matches!(
            Operation::parse_message("INITIAL extra"),
            Err(MessageError::TokenCount { expected: 1, .. })
        ));
        assert!(matches!(
            Operation::parse_message("TOGGLE_NOTE -1 2 3"),
            Err(MessageError::NotANumber { field: "row", .. })
        ));
    }

    #[test]
    fn serde_shape() {
        let json = serde_json::to_value(Operation::Edit(Edit::AddFill { row: 0, col: 1, val: 2 }))
            .unwrap();
        assert_eq!(json["type"], "ADD_FILL");
        assert_eq!(json["val"], 2);
        let initial = serde_json::to_value(Operation::Initial).unwrap();
        assert_eq!(initial, serde_json::json!({ "type": "INITIAL" }));
        let remove = serde_json::to_value(Operation::Edit(Edit::RemoveFill { row: 3, col: 4 }))
            .unwrap();
        assert_eq!(remove, serde_json::json!({ "type": "REMOVE_FILL", "row": 3, "col": 4 }));
    }
}
