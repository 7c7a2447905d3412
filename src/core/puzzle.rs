//! core::puzzle
//!
//! Sudoku rules: validity, backtracking solve, hints and single-cell edits.
//!
//! Every function here is pure apart from [`apply`], which mutates exactly one
//! cell of the board it is given.

use rand::Rng;
use thiserror::Error;

use super::board::{Board, SIZE};
use super::operation::Edit;

/// Errors from puzzle rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PuzzleError {
    /// The target cell is a puzzle given.
    #[error("cell [{row}][{col}] is fixed")]
    FixedCell { row: usize, col: usize },

    /// Row or column outside `[0, 9)`.
    #[error("coordinate [{row}][{col}] is out of range")]
    CoordinateOutOfRange { row: usize, col: usize },

    /// Digit outside `[1, 9]`.
    #[error("value {val} is out of range")]
    ValueOutOfRange { val: u8 },

    #[error("board has no solution")]
    Unsolvable,

    #[error("board has no empty cell")]
    NoEmptyCell,
}

/// A suggested placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hint {
    pub row: usize,
    pub col: usize,
    pub val: u8,
}

/// True iff no row, column or 3×3 box holds a repeated non-zero value.
pub fn validate(board: &Board) -> bool {
    let values = board.values();
    (0..SIZE).all(|i| {
        unique((0..SIZE).map(|j| values[i][j]))
            && unique((0..SIZE).map(|j| values[j][i]))
            && unique((0..SIZE).map(|j| values[(i / 3) * 3 + j / 3][(i % 3) * 3 + j % 3]))
    })
}

/// True iff every cell is filled and the board is valid.
pub fn is_complete(board: &Board) -> bool {
    board.rows().all(|row| row.iter().all(|cell| !cell.is_empty())) && validate(board)
}

fn unique(values: impl Iterator<Item = u8>) -> bool {
    let mut seen = 0u16;
    for v in values.filter(|v| *v != 0) {
        let bit = 1u16 << v;
        if seen & bit != 0 {
            return false;
        }
        seen |= bit;
    }
    true
}

/// Solve by exhaustive backtracking.
///
/// Empty cells are filled in row-major order, candidates tried ascending, and
/// the board is re-checked after every placement. Identical input always
/// yields the identical solution.
///
/// # Errors
///
/// [`PuzzleError::Unsolvable`] if the givens contradict each other or no
/// assignment completes the grid.
pub fn solve(board: &Board) -> Result<Board, PuzzleError> {
    if !validate(board) {
        return Err(PuzzleError::Unsolvable);
    }
    let mut grid = board.values();
    if fill(&mut grid, 0) {
        let mut solved = *board;
        for (r, row) in grid.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if let Some(cell) = solved.cell_mut(r, c) {
                    cell.set_value(*value);
                }
            }
        }
        Ok(solved)
    } else {
        Err(PuzzleError::Unsolvable)
    }
}

fn fill(grid: &mut [[u8; SIZE]; SIZE], from: usize) -> bool {
    let Some(pos) = (from..SIZE * SIZE).find(|p| grid[p / SIZE][p % SIZE] == 0) else {
        return true;
    };
    let (row, col) = (pos / SIZE, pos % SIZE);
    for candidate in 1..=9 {
        grid[row][col] = candidate;
        if placement_ok(grid, row, col) && fill(grid, pos + 1) {
            return true;
        }
    }
    grid[row][col] = 0;
    false
}

/// Whether the value just written at `(row, col)` keeps its row, column and
/// box free of duplicates. Equivalent to a full re-validation when the board
/// was valid before the placement.
fn placement_ok(grid: &[[u8; SIZE]; SIZE], row: usize, col: usize) -> bool {
    let value = grid[row][col];
    let (box_row, box_col) = (row / 3 * 3, col / 3 * 3);
    (0..SIZE).all(|i| {
        (i == col || grid[row][i] != value)
            && (i == row || grid[i][col] != value)
            && {
                let (r, c) = (box_row + i / 3, box_col + i % 3);
                (r == row && c == col) || grid[r][c] != value
            }
    })
}

/// Pick a hint from `solved` for the first empty cell of `board`.
///
/// The scan starts at a random row/column offset and wraps around in
/// row-major order, so repeated hints spread over the board.
///
/// # Errors
///
/// [`PuzzleError::NoEmptyCell`] when the board is already full.
pub fn hint<R: Rng + ?Sized>(
    board: &Board,
    solved: &Board,
    rng: &mut R,
) -> Result<Hint, PuzzleError> {
    let row_offset = rng.random_range(0..SIZE);
    let col_offset = rng.random_range(0..SIZE);

    for i in 0..SIZE {
        for j in 0..SIZE {
            let (row, col) = ((i + row_offset) % SIZE, (j + col_offset) % SIZE);
            let empty = board.cell(row, col).is_some_and(|cell| cell.is_empty());
            if !empty {
                continue;
            }
            let val = solved.cell(row, col).map_or(0, |cell| cell.value());
            if val != 0 {
                return Ok(Hint { row, col, val });
            }
        }
    }
    Err(PuzzleError::NoEmptyCell)
}

/// Check an edit's coordinates and value without touching a board.
pub fn check_edit(edit: &Edit) -> Result<(), PuzzleError> {
    let (row, col) = edit.coordinate();
    if row >= SIZE || col >= SIZE {
        return Err(PuzzleError::CoordinateOutOfRange { row, col });
    }
    match *edit {
        Edit::AddFill { val, .. } | Edit::ToggleNote { val, .. } if !(1..=9).contains(&val) => {
            Err(PuzzleError::ValueOutOfRange { val })
        }
        _ => Ok(()),
    }
}

/// Apply one edit to the board.
///
/// # Errors
///
/// - [`PuzzleError::CoordinateOutOfRange`] / [`PuzzleError::ValueOutOfRange`]
/// - [`PuzzleError::FixedCell`] if the target is a puzzle given
pub fn apply(board: &mut Board, edit: &Edit) -> Result<(), PuzzleError> {
    check_edit(edit)?;
    let (row, col) = edit.coordinate();
    let cell = board
        .cell_mut(row, col)
        .ok_or(PuzzleError::CoordinateOutOfRange { row, col })?;
    if cell.is_immutable() {
        return Err(PuzzleError::FixedCell { row, col });
    }

    match *edit {
        Edit::AddFill { val, .. } => cell.set_value(val),
        Edit::RemoveFill { .. } => cell.set_value(0),
        Edit::ToggleNote { val, .. } => {
            cell.notes_mut().toggle(val);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::core::board::{Cell, SAMPLE_PUZZLE};

    fn sample() -> Board {
        Board::from_puzzle(SAMPLE_PUZZLE).unwrap()
    }

    fn with_values(entries: &[(usize, usize, u8)]) -> Board {
        let mut board = Board::empty();
        for &(r, c, v) in entries {
            board.cell_mut(r, c).unwrap().set_value(v);
        }
        board
    }

    #[test]
    fn empty_board_is_valid() {
        assert!(validate(&Board::empty()));
        assert!(!is_complete(&Board::empty()));
    }

    #[test]
    fn duplicates_are_detected() {
        assert!(!validate(&with_values(&[(0, 0, 5), (0, 8, 5)])), "row");
        assert!(!validate(&with_values(&[(0, 4, 5), (8, 4, 5)])), "column");
        assert!(!validate(&with_values(&[(3, 3, 5), (5, 5, 5)])), "box");
        assert!(validate(&with_values(&[(0, 0, 5), (1, 3, 5), (3, 1, 5)])));
    }

    #[test]
    fn solve_sample_is_complete_and_keeps_givens() {
        let puzzle = sample();
        let solved = solve(&puzzle).unwrap();
        assert!(is_complete(&solved));
        for r in 0..SIZE {
            for c in 0..SIZE {
                let given = puzzle.cell(r, c).unwrap();
                if given.is_immutable() {
                    assert_eq!(solved.cell(r, c).unwrap().value(), given.value());
                    assert!(solved.cell(r, c).unwrap().is_immutable());
                }
            }
        }
    }

    #[test]
    fn solve_is_deterministic() {
        let puzzle = sample();
        assert_eq!(solve(&puzzle).unwrap(), solve(&puzzle).unwrap());
    }

    #[test]
    fn solve_rejects_contradictions() {
        // Row 0 holds 1..=8, and column 8 already has a 9 lower down.
        let mut entries: Vec<(usize, usize, u8)> = (0..8).map(|c| (0, c, c as u8 + 1)).collect();
        entries.push((5, 8, 9));
        let board = with_values(&entries);
        assert!(validate(&board));
        assert_eq!(solve(&board), Err(PuzzleError::Unsolvable));

        let invalid = with_values(&[(0, 0, 1), (0, 1, 1)]);
        assert_eq!(solve(&invalid), Err(PuzzleError::Unsolvable));
    }

    #[test]
    fn hint_points_at_an_empty_cell() {
        let puzzle = sample();
        let solved = solve(&puzzle).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let hint = hint(&puzzle, &solved, &mut rng).unwrap();
            assert!(puzzle.cell(hint.row, hint.col).unwrap().is_empty());
            assert_eq!(solved.cell(hint.row, hint.col).unwrap().value(), hint.val);
        }
    }

    #[test]
    fn hint_on_full_board_fails() {
        let solved = solve(&sample()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(hint(&solved, &solved, &mut rng), Err(PuzzleError::NoEmptyCell));
    }

    #[test]
    fn edits_respect_fixed_cells() {
        let mut board = sample();
        // (0, 1) holds the given 7
        for edit in [
            Edit::AddFill { row: 0, col: 1, val: 3 },
            Edit::RemoveFill { row: 0, col: 1 },
            Edit::ToggleNote { row: 0, col: 1, val: 3 },
        ] {
            assert_eq!(
                apply(&mut board, &edit),
                Err(PuzzleError::FixedCell { row: 0, col: 1 })
            );
        }
        assert_eq!(board, sample());
    }

    #[test]
    fn edits_check_ranges() {
        let mut board = Board::empty();
        assert!(matches!(
            apply(&mut board, &Edit::AddFill { row: 9, col: 0, val: 1 }),
            Err(PuzzleError::CoordinateOutOfRange { .. })
        ));
        assert_eq!(
            apply(&mut board, &Edit::AddFill { row: 0, col: 0, val: 0 }),
            Err(PuzzleError::ValueOutOfRange { val: 0 })
        );
        assert_eq!(
            apply(&mut board, &Edit::ToggleNote { row: 0, col: 0, val: 10 }),
            Err(PuzzleError::ValueOutOfRange { val: 10 })
        );
    }

    #[test]
    fn edits_mutate_one_cell() {
        let mut board = Board::empty();
        apply(&mut board, &Edit::AddFill { row: 2, col: 3, val: 4 }).unwrap();
        apply(&mut board, &Edit::ToggleNote { row: 2, col: 3, val: 8 }).unwrap();
        let cell = *board.cell(2, 3).unwrap();
        assert_eq!(cell.value(), 4);
        assert!(cell.notes().contains(8));

        apply(&mut board, &Edit::RemoveFill { row: 2, col: 3 }).unwrap();
        apply(&mut board, &Edit::ToggleNote { row: 2, col: 3, val: 8 }).unwrap();
        assert_eq!(*board.cell(2, 3).unwrap(), Cell::empty());
    }
}
