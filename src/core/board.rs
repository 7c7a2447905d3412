//! core::board
//!
//! The 9×9 board and its fixed-width text codec.
//!
//! # Format
//!
//! A board encodes as 9 lines, each holding 9 space-separated cell tokens and
//! terminated by a line feed. A token is exactly 11 ASCII digits:
//!
//! ```text
//! I V N1 N2 N3 N4 N5 N6 N7 N8 N9     (no spaces inside a token)
//! │ │ └────────── note flags for digits 1..=9, '0' or '1'
//! │ └──────────── value, '0' (empty) ..= '9'
//! └────────────── immutable flag, '0' or '1'
//! ```
//!
//! # Invariants
//!
//! - Dimensions are always 9×9 (enforced by the array type)
//! - Cell values are in `0..=9`; `0` means empty
//! - `Board::decode(&board.encode()) == Ok(board)` for every board
//!
//! # Example
//!
//! ```
//! use gitdoku::core::board::Board;
//!
//! let board = Board::from_puzzle(gitdoku::core::board::SAMPLE_PUZZLE).unwrap();
//! let bytes = board.encode();
//! assert_eq!(Board::decode(&bytes).unwrap(), board);
//! ```

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Board edge length.
pub const SIZE: usize = 9;

/// Length of one encoded cell token.
pub const TOKEN_LEN: usize = 11;

/// The puzzle a fresh game starts from unless configured otherwise.
pub const SAMPLE_PUZZLE: &str = "\
070308100
040100000
000090082
001000500
000000230
000283070
094005000
526000700
000000009";

/// Errors from decoding a board blob or a puzzle seed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("board is missing row {row}")]
    MissingLine { row: usize },

    #[error("row {row} has {found} cells, expected 9")]
    CellCount { row: usize, found: usize },

    #[error("cell [{row}][{col}] token is {len} bytes, expected 11")]
    TokenLength { row: usize, col: usize, len: usize },

    #[error("cell [{row}][{col}] has unexpected byte {byte:#04x} at offset {offset}")]
    InvalidByte {
        row: usize,
        col: usize,
        offset: usize,
        byte: u8,
    },

    #[error("unexpected data after row 8")]
    TrailingData,

    #[error("invalid puzzle: {0}")]
    Puzzle(String),
}

/// Per-cell pencil marks for digits 1..=9.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Notes(u16);

impl Serialize for Notes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.digits())
    }
}

impl Notes {
    const MASK: u16 = 0x1ff;

    /// Whether `digit` (1..=9) is marked. Out-of-range digits are never marked.
    pub fn contains(self, digit: u8) -> bool {
        Self::bit(digit).is_some_and(|bit| self.0 & bit != 0)
    }

    /// Flip the mark for `digit`. Returns `false` if the digit is out of range.
    pub fn toggle(&mut self, digit: u8) -> bool {
        match Self::bit(digit) {
            Some(bit) => {
                self.0 ^= bit;
                true
            }
            None => false,
        }
    }

    pub fn is_empty(self) -> bool {
        self.0 & Self::MASK == 0
    }

    /// Marked digits in ascending order.
    pub fn digits(self) -> Vec<u8> {
        (1..=9).filter(|d| self.contains(*d)).collect()
    }

    fn bit(digit: u8) -> Option<u16> {
        (1..=9).contains(&digit).then(|| 1 << (digit - 1))
    }
}

impl FromIterator<u8> for Notes {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut notes = Notes::default();
        for digit in iter {
            if !notes.contains(digit) {
                notes.toggle(digit);
            }
        }
        notes
    }
}

/// One square of the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Cell {
    immutable: bool,
    value: u8,
    notes: Notes,
}

impl Cell {
    /// An empty, editable cell.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A given digit from the puzzle. Values outside 1..=9 yield `None`.
    pub fn fixed(value: u8) -> Option<Self> {
        (1..=9).contains(&value).then_some(Self {
            immutable: true,
            value,
            notes: Notes::default(),
        })
    }

    /// A cell with every field chosen. Values above 9 yield `None`.
    pub fn new(immutable: bool, value: u8, notes: Notes) -> Option<Self> {
        (value <= 9).then_some(Self {
            immutable,
            value,
            notes,
        })
    }

    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    /// Current value, `0` when empty.
    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value == 0
    }

    pub fn notes(&self) -> Notes {
        self.notes
    }

    pub(crate) fn set_value(&mut self, value: u8) {
        debug_assert!(value <= 9, "cell value out of range: {value}");
        self.value = value;
    }

    pub(crate) fn notes_mut(&mut self) -> &mut Notes {
        &mut self.notes
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(if self.immutable { b'1' } else { b'0' });
        out.push(b'0' + self.value);
        for digit in 1..=9 {
            out.push(if self.notes.contains(digit) { b'1' } else { b'0' });
        }
    }

    fn decode(token: &[u8], row: usize, col: usize) -> Result<Self, DecodeError> {
        if token.len() != TOKEN_LEN {
            return Err(DecodeError::TokenLength {
                row,
                col,
                len: token.len(),
            });
        }
        let invalid = |offset: usize| DecodeError::InvalidByte {
            row,
            col,
            offset,
            byte: token[offset],
        };

        let immutable = match token[0] {
            b'0' => false,
            b'1' => true,
            _ => return Err(invalid(0)),
        };
        let value = match token[1] {
            b @ b'0'..=b'9' => b - b'0',
            _ => return Err(invalid(1)),
        };
        let mut notes = Notes::default();
        for (i, byte) in token[2..].iter().enumerate() {
            match byte {
                b'0' => {}
                b'1' => {
                    notes.toggle(i as u8 + 1);
                }
                _ => return Err(invalid(i + 2)),
            }
        }

        Ok(Self {
            immutable,
            value,
            notes,
        })
    }
}

/// A 9×9 grid of cells in row-major order.
///
/// Serializes as `{"cells": [[{"immutable", "value", "notes"}; 9]; 9]}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Board {
    cells: [[Cell; SIZE]; SIZE],
}

impl Board {
    /// The all-empty board.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a puzzle seed: 9 rows of 9 digits, `0` for blanks.
    ///
    /// Non-zero digits become immutable cells. Blank lines and surrounding
    /// whitespace are ignored.
    pub fn from_puzzle(input: &str) -> Result<Self, DecodeError> {
        let rows: Vec<&str> = input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if rows.len() != SIZE {
            return Err(DecodeError::Puzzle(format!(
                "expected 9 rows, found {}",
                rows.len()
            )));
        }

        let mut board = Self::empty();
        for (row, line) in rows.iter().enumerate() {
            let digits: Vec<char> = line.chars().collect();
            if digits.len() != SIZE {
                return Err(DecodeError::Puzzle(format!(
                    "row {} has {} digits, expected 9",
                    row,
                    digits.len()
                )));
            }
            for (col, ch) in digits.into_iter().enumerate() {
                let value = ch.to_digit(10).ok_or_else(|| {
                    DecodeError::Puzzle(format!("row {row} contains non-digit {ch:?}"))
                })? as u8;
                if value != 0 {
                    board.cells[row][col] = Cell {
                        immutable: true,
                        value,
                        notes: Notes::default(),
                    };
                }
            }
        }
        Ok(board)
    }

    /// Build a board from a full grid of cells.
    pub fn from_cells(cells: [[Cell; SIZE]; SIZE]) -> Self {
        Self { cells }
    }

    /// The cell at `(row, col)`, or `None` outside the grid.
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    pub(crate) fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.cells.get_mut(row).and_then(|r| r.get_mut(col))
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell; SIZE]> {
        self.cells.iter()
    }

    /// Value grid, `0` for empty cells.
    pub fn values(&self) -> [[u8; SIZE]; SIZE] {
        self.cells.map(|row| row.map(|cell| cell.value))
    }

    /// Only the puzzle givens; every editable cell cleared.
    pub fn givens(&self) -> Self {
        Self {
            cells: self.cells.map(|row| {
                row.map(|cell| if cell.immutable { cell } else { Cell::empty() })
            }),
        }
    }

    /// Encode to the fixed-width text format.
    pub fn encode(&self) -> Vec<u8> {
        // 9 tokens + 8 separators + LF per row
        let mut out = Vec::with_capacity(SIZE * (SIZE * (TOKEN_LEN + 1)));
        for row in &self.cells {
            for (col, cell) in row.iter().enumerate() {
                if col > 0 {
                    out.push(b' ');
                }
                cell.encode_into(&mut out);
            }
            out.push(b'\n');
        }
        out
    }

    /// Decode from the fixed-width text format.
    ///
    /// The trailing line feed after the last row is optional; anything else
    /// after row 8 is rejected.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut lines = data.split(|b| *b == b'\n');
        let mut board = Self::empty();

        for row in 0..SIZE {
            let line = match lines.next() {
                Some(line) if !line.is_empty() => line,
                _ => return Err(DecodeError::MissingLine { row }),
            };
            let tokens: Vec<&[u8]> = line.split(|b| *b == b' ').collect();
            if tokens.len() != SIZE {
                return Err(DecodeError::CellCount {
                    row,
                    found: tokens.len(),
                });
            }
            for (col, token) in tokens.into_iter().enumerate() {
                board.cells[row][col] = Cell::decode(token, row, col)?;
            }
        }

        if lines.any(|rest| !rest.is_empty()) {
            return Err(DecodeError::TrailingData);
        }
        Ok(board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const RULE: &str = "   +-------+-------+-------+";
        writeln!(f, "     0 1 2   3 4 5   6 7 8")?;
        for (r, row) in self.cells.iter().enumerate() {
            if r % 3 == 0 {
                writeln!(f, "{RULE}")?;
            }
            write!(f, " {r} |")?;
            for (c, cell) in row.iter().enumerate() {
                match cell.value {
                    0 => write!(f, " .")?,
                    v => write!(f, " {v}")?,
                }
                if c % 3 == 2 {
                    write!(f, " |")?;
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "{RULE}")
    }
}
