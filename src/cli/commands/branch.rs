//! branch command - Create and list branches

use anyhow::{Context as _, Result};

use super::{block_on, open_game, print_json};
use crate::cli::Context;
use crate::core::types::BranchName;
use crate::game::{BranchOrder, BranchTarget};

/// Create a branch at a commit or another branch's head.
pub fn create_branch(
    ctx: &Context,
    name: &str,
    from_commit: Option<&str>,
    from_branch: Option<&str>,
) -> Result<()> {
    let id = BranchName::new(name).with_context(|| format!("Invalid branch name '{}'", name))?;
    let game = open_game(ctx)?;

    // Default to the initial branch when no start point is given.
    let target = match (from_commit, from_branch) {
        (None, None) => BranchTarget::Branch(game.initial_branch().clone()),
        (commit, branch) => BranchTarget::from_options(commit, branch)?,
    };

    block_on(async {
        let branch = game.create_branch(&id, target).await?;
        if ctx.json {
            return print_json(&branch);
        }
        println!("Created branch '{}' at {}", branch.id, branch.head.short(7));
        Ok(())
    })
}

/// List branches by name, or most recently changed first.
pub fn list_branches(ctx: &Context, recent: bool) -> Result<()> {
    let game = open_game(ctx)?;
    let order = if recent {
        BranchOrder::RecentFirst
    } else {
        BranchOrder::Name
    };

    block_on(async {
        let branches = game.list_branches(order).await?;
        if ctx.json {
            return print_json(&branches);
        }
        for branch in &branches {
            let marker = if &branch.id == game.initial_branch() {
                "*"
            } else {
                " "
            };
            println!("{} {} {}", marker, branch.head.short(7), branch.id);
        }
        Ok(())
    })
}
