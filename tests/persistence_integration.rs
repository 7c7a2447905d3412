//! Integration tests for persistent game directories.
//!
//! These tests exercise create/open round-trips and the cross-process lock
//! against real directories created with tempfile.

use tempfile::TempDir;

use gitdoku::core::config::GameConfig;
use gitdoku::core::operation::Edit;
use gitdoku::core::paths::GamePaths;
use gitdoku::core::types::{Author, BranchName};
use gitdoku::game::{BranchOrder, BranchTarget, ErrorCode, Game};
use gitdoku::git::Git;

fn config_in(dir: &TempDir) -> GameConfig {
    GameConfig::default().with_storage_path(dir.path().join("game"))
}

#[tokio::test]
async fn reopened_game_keeps_history() {
    let dir = TempDir::new().unwrap();
    let player = Author::new("p-1", "Ada").unwrap();

    let (initial, head) = {
        let game = Game::create(&config_in(&dir)).unwrap();
        let master = game.initial_branch().clone();
        game.create_branch(&BranchName::new("alt").unwrap(), BranchTarget::Branch(master.clone()))
            .await
            .unwrap();
        let commit = game
            .apply_edit(&master, Edit::AddFill { row: 0, col: 0, val: 6 }, &player)
            .await
            .unwrap();
        (game.puzzle().initial_commit.clone(), commit.id)
    };

    let game = Game::open(&config_in(&dir)).unwrap();
    assert_eq!(game.puzzle().initial_commit, initial);
    assert_eq!(game.initial_branch().as_str(), "master");
    assert!(game.puzzle().board.cell(0, 0).unwrap().is_empty());

    let master = game.initial_branch().clone();
    let view = game.read_board(&master).await.unwrap();
    assert_eq!(view.head, head);
    assert_eq!(view.board.cell(0, 0).unwrap().value(), 6);

    let names: Vec<String> = game
        .list_branches(BranchOrder::Name)
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.id.to_string())
        .collect();
    assert_eq!(names, vec!["alt", "master"]);
}

#[test]
fn open_requires_an_existing_game() {
    let dir = TempDir::new().unwrap();
    let err = Game::open(&config_in(&dir)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    let err = Game::open(&GameConfig::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidInput);
}

#[test]
fn create_twice_fails() {
    let dir = TempDir::new().unwrap();
    drop(Game::create(&config_in(&dir)).unwrap());

    let err = Game::create(&config_in(&dir)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::AlreadyExists);
}

#[test]
fn interrupted_create_is_not_a_game() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let paths = GamePaths::new(dir.path().join("game"));

    // a bare store with no INITIAL commit
    Git::init_bare(&paths.repo_dir()).unwrap();
    assert!(paths.is_initialized());

    let err = Game::open(&config).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    let game = Game::create(&config).unwrap();
    let initial = game.puzzle().initial_commit.clone();
    drop(game);

    let reopened = Game::open(&config).unwrap();
    assert_eq!(reopened.puzzle().initial_commit, initial);
}

#[test]
fn open_game_is_locked() {
    let dir = TempDir::new().unwrap();
    let game = Game::create(&config_in(&dir)).unwrap();

    let err = Game::open(&config_in(&dir)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Locked);

    drop(game);
    assert!(Game::open(&config_in(&dir)).is_ok());
}

#[test]
fn ephemeral_game_is_removed_on_drop() {
    let game = Game::create(&GameConfig::default()).unwrap();
    let path = game.path().to_path_buf();
    assert!(game.paths().is_initialized());

    drop(game);
    assert!(!path.exists());
}
