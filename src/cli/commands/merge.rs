//! merge command - Merge one branch's edits into another
//!
//! Only the source branch moves. See [`crate::game::merge`] for the
//! fast-forward and replay rules.

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::{block_on, commit_line, open_game, print_json};
use crate::cli::Context;
use crate::core::types::{BranchName, Oid};
use crate::game::MergeOutcome;

#[derive(Serialize)]
struct MergeReport<'a> {
    branch: &'a BranchName,
    head: &'a Oid,
    fast_forward: bool,
    replayed: usize,
}

/// Run the merge command.
pub fn merge(ctx: &Context, source: &str, target: &str) -> Result<()> {
    let source =
        BranchName::new(source).with_context(|| format!("Invalid branch name '{}'", source))?;
    let target =
        BranchName::new(target).with_context(|| format!("Invalid branch name '{}'", target))?;
    let game = open_game(ctx)?;

    block_on(async {
        let result = game.merge(&source, &target, &ctx.player).await?;
        let replayed = match &result.outcome {
            MergeOutcome::FastForward { .. } => 0,
            MergeOutcome::Replayed { replayed, .. } => *replayed,
        };

        if ctx.json {
            return print_json(&MergeReport {
                branch: &result.branch.id,
                head: &result.branch.head,
                fast_forward: result.outcome.is_fast_forward(),
                replayed,
            });
        }

        if result.outcome.is_fast_forward() {
            println!(
                "Fast-forwarded '{}' to {}",
                source,
                result.branch.head.short(7)
            );
        } else {
            println!("Merged '{}' into '{}' ({} edit(s) replayed)", target, source, replayed);
            println!("[{}] {}", source, commit_line(result.outcome.head()));
        }
        Ok(())
    })
}
