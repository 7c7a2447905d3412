//! edit, hint and solve commands - Commit cell changes on a branch
//!
//! Each edit becomes one commit on the branch. `solve` writes one commit per
//! cell it fills.

use anyhow::Result;

use super::{block_on, branch_or_initial, commit_line, open_game, print_json};
use crate::cli::Context;
use crate::core::operation::Edit;

/// Apply one edit.
pub fn edit(ctx: &Context, branch: Option<&str>, edit: Edit) -> Result<()> {
    let game = open_game(ctx)?;
    let branch = branch_or_initial(&game, branch)?;

    block_on(async {
        let commit = game.apply_edit(&branch, edit, &ctx.player).await?;
        if ctx.json {
            return print_json(&commit);
        }
        println!("[{}] {}", branch, commit_line(&commit));
        Ok(())
    })
}

/// Fill one cell from the solution.
pub fn hint(ctx: &Context, branch: Option<&str>) -> Result<()> {
    let game = open_game(ctx)?;
    let branch = branch_or_initial(&game, branch)?;

    block_on(async {
        let commit = game.hint(&branch, &ctx.player).await?;
        if ctx.json {
            return print_json(&commit);
        }
        println!("[{}] {}", branch, commit_line(&commit));
        Ok(())
    })
}

/// Fill every remaining cell from the solution.
pub fn solve(ctx: &Context, branch: Option<&str>) -> Result<()> {
    let game = open_game(ctx)?;
    let branch = branch_or_initial(&game, branch)?;

    block_on(async {
        let commits = game.auto_solve(&branch, &ctx.player).await?;
        if ctx.json {
            return print_json(&commits);
        }
        if commits.is_empty() {
            println!("Nothing to fill on '{}'", branch);
        } else {
            println!("Filled {} cell(s) on '{}'", commits.len(), branch);
        }
        Ok(())
    })
}
