//! Integration tests for the game API.
//!
//! These tests drive `Game` end to end against real object stores in temp
//! directories: edits, branches, hints, auto-solve and concurrent writers.

use std::collections::HashSet;
use std::sync::Arc;

use gitdoku::core::board::SAMPLE_PUZZLE;
use gitdoku::core::config::{GameConfig, GameSettings};
use gitdoku::core::operation::{Edit, Operation};
use gitdoku::core::types::{Author, BranchName, Oid};
use gitdoku::game::{BranchOrder, BranchTarget, ErrorCode, Game};

// =============================================================================
// Test Helpers
// =============================================================================

const EMPTY_PUZZLE: &str = "\
000000000
000000000
000000000
000000000
000000000
000000000
000000000
000000000
000000000";

fn config_with(puzzle: &str) -> GameConfig {
    GameConfig {
        game: Some(GameSettings {
            puzzle: Some(puzzle.to_string()),
            initial_branch: None,
        }),
        ..Default::default()
    }
}

fn sample_game() -> Game {
    Game::create(&config_with(SAMPLE_PUZZLE)).expect("create game")
}

fn empty_game() -> Game {
    Game::create(&config_with(EMPTY_PUZZLE)).expect("create game")
}

fn branch(name: &str) -> BranchName {
    BranchName::new(name).unwrap()
}

fn player() -> Author {
    Author::new("p-1", "Ada").unwrap()
}

// =============================================================================
// Bootstrap
// =============================================================================

#[tokio::test]
async fn new_game_starts_at_initial_commit() {
    let game = sample_game();
    let master = game.initial_branch().clone();
    assert_eq!(master.as_str(), "master");

    let view = game.read_board(&master).await.unwrap();
    assert_eq!(view.head, game.puzzle().initial_commit);
    assert_eq!(view.board, game.puzzle().board);
    assert!(!view.completed);

    let initial = game.get_commit(&view.head).await.unwrap();
    assert_eq!(initial.operation, Operation::Initial);
    assert!(initial.parent_ids.is_empty());
    assert_eq!(initial.author_id, Author::game_master().id);
    assert!(game.parents(&initial.id).await.unwrap().is_empty());
}

#[test]
fn unsolvable_puzzle_is_rejected() {
    // two 5s in the first row
    let bad = SAMPLE_PUZZLE.replacen("070308100", "570308105", 1);
    let err = Game::create(&config_with(&bad)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Unsolvable);

    let err = Game::create(&config_with("123")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidInput);
}

#[test]
fn custom_initial_branch() {
    let config = GameConfig {
        game: Some(GameSettings {
            puzzle: None,
            initial_branch: Some(branch("main")),
        }),
        ..Default::default()
    };
    let game = Game::create(&config).unwrap();
    assert_eq!(game.initial_branch().as_str(), "main");
}

// =============================================================================
// Edits
// =============================================================================

#[tokio::test]
async fn edits_advance_the_branch() {
    let game = sample_game();
    let master = game.initial_branch().clone();
    let initial = game.puzzle().initial_commit.clone();

    let fill = game
        .apply_edit(&master, Edit::AddFill { row: 0, col: 0, val: 6 }, &player())
        .await
        .unwrap();
    assert_eq!(fill.parent_ids, vec![initial]);
    assert_eq!(fill.author_name, "Ada");

    let note = game
        .apply_edit(&master, Edit::ToggleNote { row: 0, col: 2, val: 3 }, &player())
        .await
        .unwrap();
    assert_eq!(note.parent_ids, vec![fill.id.clone()]);

    let view = game.read_board(&master).await.unwrap();
    assert_eq!(view.head, note.id);
    assert_eq!(view.board.cell(0, 0).unwrap().value(), 6);
    assert!(view.board.cell(0, 2).unwrap().notes().contains(3));

    let removed = game
        .apply_edit(&master, Edit::RemoveFill { row: 0, col: 0 }, &player())
        .await
        .unwrap();
    assert_eq!(
        removed.operation,
        Operation::Edit(Edit::RemoveFill { row: 0, col: 0 })
    );
    assert!(game.board_at(&removed.id).await.unwrap().cell(0, 0).unwrap().is_empty());

    // earlier snapshots are untouched
    assert_eq!(game.board_at(&fill.id).await.unwrap().cell(0, 0).unwrap().value(), 6);
}

#[tokio::test]
async fn fixed_cells_reject_every_edit() {
    let game = sample_game();
    let master = game.initial_branch().clone();
    let before = game.get_branch(&master).await.unwrap();

    // (0, 1) holds the given 7
    for edit in [
        Edit::AddFill { row: 0, col: 1, val: 3 },
        Edit::RemoveFill { row: 0, col: 1 },
        Edit::ToggleNote { row: 0, col: 1, val: 3 },
    ] {
        let err = game.apply_edit(&master, edit, &player()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::FixedCell, "{:?}", edit);
    }

    assert_eq!(game.get_branch(&master).await.unwrap(), before);
}

#[tokio::test]
async fn out_of_range_edits_are_invalid_input() {
    let game = sample_game();
    let master = game.initial_branch().clone();

    for edit in [
        Edit::AddFill { row: 9, col: 0, val: 1 },
        Edit::AddFill { row: 0, col: 0, val: 0 },
        Edit::ToggleNote { row: 0, col: 0, val: 10 },
    ] {
        let err = game.apply_edit(&master, edit, &player()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput, "{:?}", edit);
    }
}

#[tokio::test]
async fn edit_on_missing_branch_is_not_found() {
    let game = sample_game();
    let err = game
        .apply_edit(&branch("nope"), Edit::AddFill { row: 0, col: 0, val: 6 }, &player())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

// =============================================================================
// Branches
// =============================================================================

#[tokio::test]
async fn branches_are_independent() {
    let game = sample_game();
    let master = game.initial_branch().clone();
    let alt = branch("alt");

    game.create_branch(&alt, BranchTarget::Branch(master.clone()))
        .await
        .unwrap();
    game.apply_edit(&alt, Edit::AddFill { row: 0, col: 0, val: 6 }, &player())
        .await
        .unwrap();

    let on_master = game.read_board(&master).await.unwrap();
    let on_alt = game.read_board(&alt).await.unwrap();
    assert!(on_master.board.cell(0, 0).unwrap().is_empty());
    assert_eq!(on_alt.board.cell(0, 0).unwrap().value(), 6);
}

#[tokio::test]
async fn create_branch_errors() {
    let game = sample_game();
    let master = game.initial_branch().clone();

    let err = game
        .create_branch(&master, BranchTarget::Branch(master.clone()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AlreadyExists);

    let err = game
        .create_branch(&branch("x"), BranchTarget::Branch(branch("missing")))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    let ghost = Oid::new("0123456789abcdef0123456789abcdef01234567").unwrap();
    let err = game
        .create_branch(&branch("y"), BranchTarget::Commit(ghost))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    let err = BranchTarget::from_options(None, None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidInput);
}

#[tokio::test]
async fn branch_at_older_commit() {
    let game = sample_game();
    let master = game.initial_branch().clone();
    let first = game
        .apply_edit(&master, Edit::AddFill { row: 0, col: 0, val: 6 }, &player())
        .await
        .unwrap();
    game.apply_edit(&master, Edit::AddFill { row: 0, col: 2, val: 2 }, &player())
        .await
        .unwrap();

    let old = game
        .create_branch(&branch("old"), BranchTarget::Commit(first.id.clone()))
        .await
        .unwrap();
    assert_eq!(old.head, first.id);
    let view = game.read_board(&branch("old")).await.unwrap();
    assert!(view.board.cell(0, 2).unwrap().is_empty());
}

#[tokio::test]
async fn list_branches_orders() {
    let game = sample_game();
    let master = game.initial_branch().clone();
    for name in ["zeta", "alpha"] {
        game.create_branch(&branch(name), BranchTarget::Branch(master.clone()))
            .await
            .unwrap();
    }

    let by_name: Vec<String> = game
        .list_branches(BranchOrder::Name)
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.id.to_string())
        .collect();
    assert_eq!(by_name, vec!["alpha", "master", "zeta"]);

    // move zeta forward in time
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    game.apply_edit(&branch("zeta"), Edit::AddFill { row: 0, col: 0, val: 6 }, &player())
        .await
        .unwrap();

    let recent: Vec<String> = game
        .list_branches(BranchOrder::RecentFirst)
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.id.to_string())
        .collect();
    assert_eq!(recent, vec!["zeta", "alpha", "master"]);
}

// =============================================================================
// Log
// =============================================================================

#[tokio::test]
async fn log_lists_children_before_parents() {
    let game = sample_game();
    let master = game.initial_branch().clone();
    let a = game
        .apply_edit(&master, Edit::AddFill { row: 0, col: 0, val: 6 }, &player())
        .await
        .unwrap();
    let b = game
        .apply_edit(&master, Edit::AddFill { row: 0, col: 2, val: 2 }, &player())
        .await
        .unwrap();

    let ids: Vec<Oid> = game.log(&b.id).await.unwrap().into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![b.id.clone(), a.id.clone(), game.puzzle().initial_commit.clone()]);

    let parents = game.parents(&b.id).await.unwrap();
    assert_eq!(parents.len(), 1);
    assert_eq!(parents[0].id, a.id);
}

// =============================================================================
// Hints and auto-solve
// =============================================================================

#[tokio::test]
async fn hint_fills_an_empty_cell_from_the_solution() {
    let game = sample_game();
    let master = game.initial_branch().clone();

    let commit = game.hint(&master, &player()).await.unwrap();
    let Operation::Edit(Edit::AddFill { row, col, val }) = commit.operation else {
        panic!("hint produced {:?}", commit.operation);
    };
    assert!(game.puzzle().board.cell(row, col).unwrap().is_empty());
    assert_eq!(game.solution().cell(row, col).unwrap().value(), val);
}

#[tokio::test]
async fn auto_solve_completes_the_board() {
    let game = sample_game();
    let master = game.initial_branch().clone();

    // a wrong player value gets corrected too
    let wrong = if game.solution().cell(0, 0).unwrap().value() == 1 { 2 } else { 1 };
    game.apply_edit(&master, Edit::AddFill { row: 0, col: 0, val: wrong }, &player())
        .await
        .unwrap();

    let givens = game
        .puzzle()
        .board
        .rows()
        .flatten()
        .filter(|c| c.is_immutable())
        .count();
    let commits = game.auto_solve(&master, &player()).await.unwrap();
    assert_eq!(commits.len(), 81 - givens);

    let view = game.read_board(&master).await.unwrap();
    assert!(view.completed);
    assert_eq!(view.board.values(), game.solution().values());

    let err = game.hint(&master, &player()).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoEmptyCell);
    assert!(game.auto_solve(&master, &player()).await.unwrap().is_empty());
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_edits_form_a_linear_chain() {
    const N: usize = 9;
    let game = Arc::new(empty_game());
    let master = game.initial_branch().clone();

    let mut tasks = Vec::new();
    for col in 0..N {
        let game = Arc::clone(&game);
        let master = master.clone();
        tasks.push(tokio::spawn(async move {
            let edit = Edit::AddFill { row: 4, col, val: (col + 1) as u8 };
            game.apply_edit(&master, edit, &player()).await
        }));
    }

    let mut created = HashSet::new();
    for task in tasks {
        created.insert(task.await.unwrap().unwrap().id);
    }
    assert_eq!(created.len(), N);

    let head = game.get_branch(&master).await.unwrap().head;
    let history = game.log(&head).await.unwrap();
    assert_eq!(history.len(), N + 1);
    for pair in history.windows(2) {
        assert_eq!(pair[0].parent_ids, vec![pair[1].id.clone()]);
    }
    assert_eq!(history[N].id, game.puzzle().initial_commit);

    let board = game.read_board(&master).await.unwrap().board;
    for col in 0..N {
        assert_eq!(board.cell(4, col).unwrap().value(), (col + 1) as u8);
    }
}
