//! game
//!
//! A single puzzle's shared, branching edit history.
//!
//! # Architecture
//!
//! [`Game`] ties the layers together:
//!
//! - [`commit`] - boards in and out of the object store
//! - [`refs`] - the branch registry
//! - [`merge`] - merge-base discovery, fast-forward and replay
//! - [`hub`] - live notification of new commits
//!
//! # Concurrency
//!
//! One `tokio::sync::RwLock` covers the object store and the branch refs.
//! Mutations take it exclusively and publish to observers before releasing
//! it, so an observer registered when a commit lands always receives it.
//! Subscribing takes it too. Queries share it. Unsubscribing only touches the
//! hub's own registry, so it never waits behind a publish blocked on a slow
//! observer. A persistent game directory is additionally guarded by a
//! cross-process file lock for as long as the `Game` lives.
//!
//! # Example
//!
//! ```no_run
//! use gitdoku::core::config::GameConfig;
//! use gitdoku::core::operation::Edit;
//! use gitdoku::core::types::{Author, ObserverId};
//! use gitdoku::game::Game;
//!
//! # async fn demo() -> Result<(), gitdoku::game::GameError> {
//! let game = Game::create(&GameConfig::default())?;
//! let master = game.initial_branch().clone();
//! let mut sub = game.subscribe(&master, &ObserverId::generate()).await?;
//!
//! let player = Author::new("p-1", "Ada")?;
//! let commit = game
//!     .apply_edit(&master, Edit::AddFill { row: 0, col: 0, val: 6 }, &player)
//!     .await?;
//! assert_eq!(sub.recv().await.map(|c| c.id), Some(commit.id));
//! # Ok(())
//! # }
//! ```

pub mod commit;
mod errors;
pub mod hub;
pub mod merge;
pub mod refs;

pub use commit::Commit;
pub use errors::{ErrorCode, GameError};
pub use hub::{PublishReport, Subscription};
pub use merge::{MergeOutcome, MergeResult};
pub use refs::{Branch, BranchTarget};

use std::path::Path;

use serde::Serialize;
use tempfile::TempDir;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use self::hub::Hub;
use self::refs::Refs;
use crate::core::board::{Board, SIZE};
use crate::core::config::GameConfig;
use crate::core::operation::{Edit, Operation};
use crate::core::ops::GameLock;
use crate::core::paths::GamePaths;
use crate::core::puzzle;
use crate::core::types::{Author, BranchName, ObserverId, Oid};
use crate::git::Git;

/// Ref holding the INITIAL commit, outside the branch namespace.
const INITIAL_REF: &str = "refs/gitdoku/initial";

/// A branch's current board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub branch: BranchName,
    pub head: Oid,
    pub board: Board,
    /// Every cell filled and no rule broken.
    pub completed: bool,
}

/// The starting grid of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PuzzleView {
    pub board: Board,
    pub initial_branch: BranchName,
    pub initial_commit: Oid,
}

/// Order for [`Game::list_branches`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BranchOrder {
    /// By branch id.
    #[default]
    Name,
    /// By head commit author time, newest first. Ties fall back to id.
    RecentFirst,
}

/// An open game.
pub struct Game {
    store_lock: RwLock<()>,
    hub: Hub,
    paths: GamePaths,
    puzzle: PuzzleView,
    solution: Board,
    _lock: GameLock,
    // declared last so the directory outlives the lock file handle
    _temp: Option<TempDir>,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("path", &self.paths.root())
            .field("initial_branch", &self.puzzle.initial_branch)
            .finish()
    }
}

impl Game {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start a new game.
    ///
    /// The puzzle's non-zero digits become immutable cells of the INITIAL
    /// commit, authored by the game master, on the configured initial branch.
    /// Without a storage path the game lives in a temp dir removed on drop.
    ///
    /// # Errors
    ///
    /// - `UNSOLVABLE` if the puzzle has no solution
    /// - [`GameError::GameExists`] if the directory already holds a game
    /// - [`GameError::Locked`] if another process has it open
    ///
    /// A store left behind by an interrupted create is replaced, and a failed
    /// create removes the store it started.
    pub fn create(config: &GameConfig) -> Result<Self, GameError> {
        let board = Board::from_puzzle(config.puzzle())
            .map_err(|e| GameError::InvalidInput(format!("invalid puzzle: {}", e)))?;
        let solution = puzzle::solve(&board)?;
        config.validate()?;

        let (paths, temp) = match config.storage_path() {
            Some(path) => (GamePaths::new(path), None),
            None => {
                let temp = TempDir::new()?;
                (GamePaths::new(temp.path()), Some(temp))
            }
        };

        let lock = GameLock::acquire(&paths)?;
        if holds_game(&paths)? {
            return Err(GameError::GameExists(paths.root().to_path_buf()));
        }
        if paths.is_initialized() {
            warn!(path = %paths.root().display(), "removing store left by an interrupted create");
            std::fs::remove_dir_all(paths.repo_dir())?;
        }

        let branch_id = config.initial_branch();
        let initial = match init_store(&paths, &board, &branch_id) {
            Ok(initial) => initial,
            Err(err) => {
                if let Err(cleanup) = std::fs::remove_dir_all(paths.repo_dir()) {
                    warn!(path = %paths.root().display(), error = %cleanup, "failed to remove incomplete store");
                }
                return Err(err);
            }
        };

        info!(
            path = %paths.root().display(),
            branch = %branch_id,
            commit = %initial.id.short(7),
            "created game"
        );

        Ok(Self {
            store_lock: RwLock::new(()),
            hub: Hub::new(config.notify_capacity(), config.backpressure()),
            paths,
            puzzle: PuzzleView {
                board,
                initial_branch: branch_id,
                initial_commit: initial.id,
            },
            solution,
            _lock: lock,
            _temp: temp,
        })
    }

    /// Reopen a persistent game.
    ///
    /// Puzzle and puzzle-related settings come from the store; only the
    /// notification settings are taken from `config`.
    ///
    /// # Errors
    ///
    /// - [`GameError::InvalidInput`] if `config` has no storage path
    /// - [`GameError::GameNotFound`] if no game was created there
    /// - [`GameError::Locked`] if another process has it open
    pub fn open(config: &GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        let root = config.storage_path().ok_or_else(|| {
            GameError::InvalidInput("opening a game requires a storage path".to_string())
        })?;
        let paths = GamePaths::new(root);
        if !holds_game(&paths)? {
            return Err(GameError::GameNotFound(paths.root().to_path_buf()));
        }
        let lock = GameLock::acquire(&paths)?;

        let git = Git::open(&paths.repo_dir())?;
        let initial_commit = git.resolve_ref(INITIAL_REF)?;
        let board = commit::read_board(&git, &initial_commit)?.givens();
        let solution = puzzle::solve(&board)?;
        let initial_branch = git
            .head_ref()?
            .and_then(|head| BranchName::from_ref(&head))
            .unwrap_or_else(|| config.initial_branch());

        info!(path = %paths.root().display(), branch = %initial_branch, "opened game");

        Ok(Self {
            store_lock: RwLock::new(()),
            hub: Hub::new(config.notify_capacity(), config.backpressure()),
            paths,
            puzzle: PuzzleView {
                board,
                initial_branch,
                initial_commit,
            },
            solution,
            _lock: lock,
            _temp: None,
        })
    }

    /// The game directory.
    pub fn path(&self) -> &Path {
        self.paths.root()
    }

    /// Path routing for the game directory.
    pub fn paths(&self) -> &GamePaths {
        &self.paths
    }

    /// The starting grid and where it was committed.
    pub fn puzzle(&self) -> &PuzzleView {
        &self.puzzle
    }

    pub fn initial_branch(&self) -> &BranchName {
        &self.puzzle.initial_branch
    }

    /// The puzzle's solution.
    pub fn solution(&self) -> &Board {
        &self.solution
    }

    fn store(&self) -> Result<Git, GameError> {
        Ok(Git::open(&self.paths.repo_dir())?)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The board at a branch head.
    pub async fn read_board(&self, branch: &BranchName) -> Result<BoardView, GameError> {
        let _guard = self.store_lock.read().await;
        let git = self.store()?;
        let head = Refs::new(&git).get(branch)?.head;
        let board = commit::read_board(&git, &head)?;
        debug!(%branch, head = %head.short(7), "read board");

        Ok(BoardView {
            branch: branch.clone(),
            head,
            completed: puzzle::is_complete(&board),
            board,
        })
    }

    /// The board stored with any commit.
    pub async fn board_at(&self, id: &Oid) -> Result<Board, GameError> {
        let _guard = self.store_lock.read().await;
        let git = self.store()?;
        commit::read_board(&git, id)
    }

    pub async fn get_branch(&self, branch: &BranchName) -> Result<Branch, GameError> {
        let _guard = self.store_lock.read().await;
        let git = self.store()?;
        Refs::new(&git).get(branch)
    }

    /// All branches in the requested order.
    pub async fn list_branches(&self, order: BranchOrder) -> Result<Vec<Branch>, GameError> {
        let _guard = self.store_lock.read().await;
        let git = self.store()?;
        let mut branches = Refs::new(&git).list()?;

        if order == BranchOrder::RecentFirst {
            let mut stamped = branches
                .into_iter()
                .map(|b| -> Result<_, GameError> { Ok((git.commit_info(&b.head)?.author_time, b)) })
                .collect::<Result<Vec<_>, GameError>>()?;
            stamped.sort_by(|(ta, a), (tb, b)| tb.cmp(ta).then_with(|| a.id.cmp(&b.id)));
            branches = stamped.into_iter().map(|(_, b)| b).collect();
        }
        Ok(branches)
    }

    /// Look up one commit.
    pub async fn get_commit(&self, id: &Oid) -> Result<Commit, GameError> {
        let _guard = self.store_lock.read().await;
        let git = self.store()?;
        commit::load_commit(&git, id)
    }

    /// The parents of a commit, in parent order.
    pub async fn parents(&self, id: &Oid) -> Result<Vec<Commit>, GameError> {
        let _guard = self.store_lock.read().await;
        let git = self.store()?;
        let child = commit::load_commit(&git, id)?;
        child
            .parent_ids
            .iter()
            .map(|parent| commit::load_commit(&git, parent))
            .collect()
    }

    /// Every commit reachable from `from`, children before parents.
    pub async fn log(&self, from: &Oid) -> Result<Vec<Commit>, GameError> {
        let _guard = self.store_lock.read().await;
        let git = self.store()?;
        git.walk_history(from)?
            .iter()
            .map(|id| commit::load_commit(&git, id))
            .collect()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Apply one edit on top of a branch and advance it.
    ///
    /// # Errors
    ///
    /// - [`GameError::BranchNotFound`]
    /// - `FIXED_CELL` / `INVALID_INPUT` from the puzzle rules
    pub async fn apply_edit(
        &self,
        branch: &BranchName,
        edit: Edit,
        author: &Author,
    ) -> Result<Commit, GameError> {
        let _guard = self.store_lock.write().await;
        let commit = {
            let git = self.store()?;
            commit_edit(&git, branch, edit, author)?
        };
        self.hub.publish(branch, &commit).await;
        Ok(commit)
    }

    /// Fill one empty cell with its solution value.
    ///
    /// # Errors
    ///
    /// `NO_EMPTY_CELL` if the branch's board is full.
    pub async fn hint(&self, branch: &BranchName, author: &Author) -> Result<Commit, GameError> {
        let _guard = self.store_lock.write().await;
        let commit = {
            let git = self.store()?;
            let head = Refs::new(&git).get(branch)?.head;
            let board = commit::read_board(&git, &head)?;
            let hint = puzzle::hint(&board, &self.solution, &mut rand::rng())?;
            debug!(%branch, row = hint.row, col = hint.col, "picked hint");
            let edit = Edit::AddFill {
                row: hint.row,
                col: hint.col,
                val: hint.val,
            };
            commit_edit(&git, branch, edit, author)?
        };
        self.hub.publish(branch, &commit).await;
        Ok(commit)
    }

    /// Fill every editable cell whose value differs from the solution, one
    /// commit per cell in row-major order.
    ///
    /// Each commit advances the branch and is published before the next one
    /// is written. If a later step fails, the commits before it stay on the
    /// branch and have already reached observers, but the error carries only
    /// the failure. Callers recover them from the branch log.
    pub async fn auto_solve(
        &self,
        branch: &BranchName,
        author: &Author,
    ) -> Result<Vec<Commit>, GameError> {
        let _guard = self.store_lock.write().await;
        let git = self.store()?;
        let head = Refs::new(&git).get(branch)?.head;
        let board = commit::read_board(&git, &head)?;

        let mut commits = Vec::new();
        for row in 0..SIZE {
            for col in 0..SIZE {
                let (Some(cell), Some(solved)) = (board.cell(row, col), self.solution.cell(row, col))
                else {
                    continue;
                };
                if cell.is_immutable() || cell.value() == solved.value() {
                    continue;
                }
                let edit = Edit::AddFill {
                    row,
                    col,
                    val: solved.value(),
                };
                let commit = commit_edit(&git, branch, edit, author)?;
                self.hub.publish(branch, &commit).await;
                commits.push(commit);
            }
        }

        info!(%branch, filled = commits.len(), "auto-solved");
        Ok(commits)
    }

    /// Create a branch at a commit or at another branch's head.
    pub async fn create_branch(
        &self,
        id: &BranchName,
        target: BranchTarget,
    ) -> Result<Branch, GameError> {
        let _guard = self.store_lock.write().await;
        let git = self.store()?;
        let branch = Refs::new(&git).create(id, &target)?;
        info!(branch = %id, head = %branch.head.short(7), "created branch");
        Ok(branch)
    }

    /// Merge `source` with `target`, updating `source` only.
    ///
    /// Observers of `source` receive the commit it ends up on: the target
    /// head after a fast-forward, the new merge commit after a replay.
    pub async fn merge(
        &self,
        source: &BranchName,
        target: &BranchName,
        author: &Author,
    ) -> Result<MergeResult, GameError> {
        let _guard = self.store_lock.write().await;
        let result = {
            let git = self.store()?;
            merge::merge(&git, source, target, author)?
        };
        self.hub.publish(source, result.outcome.head()).await;
        Ok(result)
    }

    /// Register for new commits on `branch`.
    ///
    /// # Errors
    ///
    /// `ALREADY_EXISTS` if this observer is already registered there.
    pub async fn subscribe(
        &self,
        branch: &BranchName,
        observer: &ObserverId,
    ) -> Result<Subscription, GameError> {
        let _guard = self.store_lock.write().await;
        self.hub.subscribe(branch, observer)
    }

    /// Remove a registration. Unknown pairs are ignored.
    ///
    /// Returns promptly even while a publish is blocked on this observer's
    /// full channel; that publish skips the observer and completes.
    pub async fn unsubscribe(&self, branch: &BranchName, observer: &ObserverId) {
        self.hub.unsubscribe(branch, observer);
    }

    /// Number of observers registered on `branch`.
    pub async fn observer_count(&self, branch: &BranchName) -> usize {
        self.hub.observer_count(branch)
    }
}

/// Whether `paths` holds a finished game. The INITIAL ref is written last
/// by [`init_store`], so a store without it is an interrupted create.
fn holds_game(paths: &GamePaths) -> Result<bool, GameError> {
    if !paths.is_initialized() {
        return Ok(false);
    }
    let git = Git::open(&paths.repo_dir())?;
    Ok(git.try_resolve_ref(INITIAL_REF)?.is_some())
}

/// Create the store with the INITIAL commit on `branch_id`.
fn init_store(
    paths: &GamePaths,
    board: &Board,
    branch_id: &BranchName,
) -> Result<Commit, GameError> {
    let git = Git::init_bare(&paths.repo_dir())?;
    let initial = commit::commit_board(
        &git,
        board,
        &[],
        Operation::Initial,
        &Operation::Initial.to_message(),
        &Author::game_master(),
    )?;
    Refs::new(&git).create(branch_id, &BranchTarget::Commit(initial.id.clone()))?;
    git.set_head(&branch_id.ref_name())?;
    git.update_ref_cas(INITIAL_REF, &initial.id, None, "gitdoku: initial")?;
    Ok(initial)
}

/// Read the head, apply `edit`, write the commit and advance the branch.
fn commit_edit(
    git: &Git,
    branch: &BranchName,
    edit: Edit,
    author: &Author,
) -> Result<Commit, GameError> {
    let refs = Refs::new(git);
    let current = refs.get(branch)?;
    let mut board = commit::read_board(git, &current.head)?;
    puzzle::apply(&mut board, &edit)?;

    let operation = Operation::Edit(edit);
    let commit = commit::commit_board(
        git,
        &board,
        std::slice::from_ref(&current.head),
        operation,
        &operation.to_message(),
        author,
    )?;
    refs.advance(&current, &commit.id)?;

    info!(
        %branch,
        commit = %commit.id.short(7),
        op = %operation.kind(),
        author = %author.id,
        "committed edit"
    );
    Ok(commit)
}
