//! show command - Print the board at a branch head

use anyhow::Result;

use super::{block_on, branch_or_initial, open_game, print_json};
use crate::cli::Context;

/// Run the show command.
pub fn show(ctx: &Context, branch: Option<&str>) -> Result<()> {
    let game = open_game(ctx)?;
    let branch = branch_or_initial(&game, branch)?;

    block_on(async {
        let view = game.read_board(&branch).await?;
        if ctx.json {
            return print_json(&view);
        }

        println!("Branch: {}", view.branch);
        println!("Head: {}", view.head);
        print!("{}", view.board);
        if view.completed {
            println!("Solved!");
        }
        Ok(())
    })
}
