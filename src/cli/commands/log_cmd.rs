//! log and commit commands - Read the commit graph

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::{block_on, branch_or_initial, commit_line, open_game, print_json};
use crate::cli::Context;
use crate::core::board::Board;
use crate::core::types::Oid;
use crate::game::Commit;

/// List every commit reachable from a branch head or a commit.
pub fn log(ctx: &Context, branch: Option<&str>, from_commit: Option<&str>) -> Result<()> {
    let game = open_game(ctx)?;

    block_on(async {
        let start = match from_commit {
            Some(oid) => parse_oid(oid)?,
            None => {
                let branch = branch_or_initial(&game, branch)?;
                game.get_branch(&branch).await?.head
            }
        };

        let commits = game.log(&start).await?;
        if ctx.json {
            return print_json(&commits);
        }
        for commit in &commits {
            println!("{}", commit_line(commit));
        }
        Ok(())
    })
}

#[derive(Serialize)]
struct CommitReport<'a> {
    #[serde(flatten)]
    commit: &'a Commit,
    #[serde(skip_serializing_if = "Option::is_none")]
    board: Option<&'a Board>,
}

/// Show one commit, optionally with its board.
pub fn commit(ctx: &Context, oid: &str, with_board: bool) -> Result<()> {
    let id = parse_oid(oid)?;
    let game = open_game(ctx)?;

    block_on(async {
        let commit = game.get_commit(&id).await?;
        let board = if with_board {
            Some(game.board_at(&id).await?)
        } else {
            None
        };

        if ctx.json {
            return print_json(&CommitReport {
                commit: &commit,
                board: board.as_ref(),
            });
        }

        println!("commit {}", commit.id);
        for parent in &commit.parent_ids {
            println!("parent {}", parent);
        }
        println!("Author: {} <{}>", commit.author_name, commit.author_id);
        println!("Date:   {}", commit.author_timestamp.to_rfc3339());
        println!();
        println!("    {}", commit.operation.to_message());
        if let Some(board) = board {
            println!();
            print!("{}", board);
        }
        Ok(())
    })
}

fn parse_oid(oid: &str) -> Result<Oid> {
    Oid::new(oid).with_context(|| format!("Invalid commit id '{}'", oid))
}
