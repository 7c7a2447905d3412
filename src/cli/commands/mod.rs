//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Opens the game (or creates it, for `init`)
//! 3. Calls one [`Game`] operation
//! 4. Formats and displays output, as text or `--json`
//!
//! # Async Commands
//!
//! [`Game`] operations are async. Handlers are synchronous wrappers that
//! build a tokio runtime and block on the async implementation.

mod branch;
mod edit;
mod init;
mod log_cmd;
mod merge;
mod show;

pub use branch::{create_branch, list_branches};
pub use edit::{edit, hint, solve};
pub use init::init;
pub use log_cmd::{commit, log};
pub use merge::merge;
pub use show::show;

use std::future::Future;

use anyhow::{Context as _, Result};
use serde::Serialize;

use crate::cli::args::{BranchAction, Command, EditAction};
use crate::cli::Context;
use crate::core::operation::Edit;
use crate::core::types::BranchName;
use crate::game::{Commit, Game};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init {
            puzzle_file,
            branch,
        } => init(ctx, puzzle_file.as_deref(), branch.as_deref()),
        Command::Show { branch } => show(ctx, branch.as_deref()),
        Command::Edit { action } => {
            let (edit_op, on) = match action {
                EditAction::Add { row, col, val, on } => (Edit::AddFill { row, col, val }, on),
                EditAction::Remove { row, col, on } => (Edit::RemoveFill { row, col }, on),
                EditAction::Note { row, col, val, on } => {
                    (Edit::ToggleNote { row, col, val }, on)
                }
            };
            edit(ctx, on.branch.as_deref(), edit_op)
        }
        Command::Hint { on } => hint(ctx, on.branch.as_deref()),
        Command::Solve { on } => solve(ctx, on.branch.as_deref()),
        Command::Branch { action } => match action {
            BranchAction::Create {
                name,
                from_commit,
                from_branch,
            } => create_branch(ctx, &name, from_commit.as_deref(), from_branch.as_deref()),
            BranchAction::List { recent } => list_branches(ctx, recent),
        },
        Command::Merge { source, target } => merge(ctx, &source, &target),
        Command::Log { branch, commit } => log(ctx, branch.as_deref(), commit.as_deref()),
        Command::Commit { oid, board } => commit(ctx, &oid, board),
    }
}

/// Run an async handler body on a fresh runtime.
fn block_on<F: Future<Output = Result<()>>>(future: F) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(future)
}

/// Open the game in the resolved directory.
fn open_game(ctx: &Context) -> Result<Game> {
    Game::open(&ctx.settings)
        .with_context(|| format!("Failed to open game in {}", ctx.game_dir().display()))
}

/// Parse a branch argument, falling back to the game's initial branch.
fn branch_or_initial(game: &Game, branch: Option<&str>) -> Result<BranchName> {
    match branch {
        Some(name) => BranchName::new(name).with_context(|| format!("Invalid branch name '{}'", name)),
        None => Ok(game.initial_branch().clone()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

/// One-line summary of a commit, as used by `log` and mutation output.
fn commit_line(commit: &Commit) -> String {
    format!(
        "{} {} {} {}",
        commit.id.short(7),
        commit.author_timestamp.format("%Y-%m-%d %H:%M:%S"),
        commit.author_name,
        commit.operation.to_message()
    )
}
