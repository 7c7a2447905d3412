//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--dir <path>`: Game directory (default: config `storage.path`, then `./.gitdoku`)
//! - `--config <path>`: Config file to load instead of the default search
//! - `--player <id>` / `--player-name <name>`: Who authors new commits
//! - `--json`: Machine-readable output
//! - `--debug`: Enable debug logging

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// gitdoku - collaborative sudoku with branches, merges and live updates
#[derive(Parser, Debug)]
#[command(name = "gitdoku")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Game directory
    #[arg(long, global = true, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Config file (overrides $GITDOKU_CONFIG and the default locations)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Player id recorded as commit author
    #[arg(long, global = true, default_value = "player")]
    pub player: String,

    /// Player display name (defaults to the player id)
    #[arg(long, global = true)]
    pub player_name: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a new game in the game directory
    #[command(
        after_help = "\
EXAMPLES:
    # Start the built-in sample puzzle
    gitdoku --dir ./game init

    # Start your own puzzle: 9 lines of 9 digits, 0 for empty
    gitdoku --dir ./game init --puzzle-file puzzle.txt --branch main"
    )]
    Init {
        /// Puzzle file: 9 rows of 9 digits, 0 for an empty cell
        #[arg(long, value_name = "PATH")]
        puzzle_file: Option<PathBuf>,

        /// Name of the branch created at the initial commit
        #[arg(long)]
        branch: Option<String>,
    },

    /// Show the board at a branch head
    Show {
        /// Branch to show (defaults to the initial branch)
        branch: Option<String>,
    },

    /// Change one cell on a branch
    Edit {
        #[command(subcommand)]
        action: EditAction,
    },

    /// Fill one random empty cell with its solution value
    Hint {
        #[command(flatten)]
        on: BranchArg,
    },

    /// Fill every editable cell with its solution value
    Solve {
        #[command(flatten)]
        on: BranchArg,
    },

    /// Create and list branches
    Branch {
        #[command(subcommand)]
        action: BranchAction,
    },

    /// Merge TARGET into SOURCE, updating SOURCE only
    #[command(
        after_help = "\
If SOURCE's head is an ancestor of TARGET's head, SOURCE fast-forwards.
Otherwise the edits made on each side since the merge base are replayed
in author-time order and recorded as a merge commit on SOURCE."
    )]
    Merge {
        /// Branch that receives the merge
        source: String,

        /// Branch whose edits are merged in
        target: String,
    },

    /// List the history reachable from a branch head or commit
    Log {
        /// Branch to start from (defaults to the initial branch)
        branch: Option<String>,

        /// Start from this commit instead of a branch
        #[arg(long, value_name = "OID", conflicts_with = "branch")]
        commit: Option<String>,
    },

    /// Show one commit
    Commit {
        /// Commit id (full 40-character hex)
        oid: String,

        /// Also print the board stored with it
        #[arg(long)]
        board: bool,
    },
}

/// The branch a mutation applies to.
#[derive(Args, Debug)]
pub struct BranchArg {
    /// Branch to commit on (defaults to the initial branch)
    #[arg(long, short)]
    pub branch: Option<String>,
}

/// Cell edits.
#[derive(Subcommand, Debug)]
pub enum EditAction {
    /// Place a value in an empty or player-filled cell
    Add {
        row: usize,
        col: usize,
        val: u8,
        #[command(flatten)]
        on: BranchArg,
    },

    /// Clear a player-filled cell
    Remove {
        row: usize,
        col: usize,
        #[command(flatten)]
        on: BranchArg,
    },

    /// Toggle a pencil mark
    Note {
        row: usize,
        col: usize,
        val: u8,
        #[command(flatten)]
        on: BranchArg,
    },
}

/// Branch management.
#[derive(Subcommand, Debug)]
pub enum BranchAction {
    /// Create a branch at a commit or another branch's head
    Create {
        /// New branch name
        name: String,

        /// Start at this commit
        #[arg(long, value_name = "OID")]
        from_commit: Option<String>,

        /// Start at this branch's head
        #[arg(long, value_name = "BRANCH")]
        from_branch: Option<String>,
    },

    /// List branches
    List {
        /// Most recently changed first
        #[arg(long)]
        recent: bool,
    },
}
