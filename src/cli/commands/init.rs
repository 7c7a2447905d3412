//! init command - Start a new game
//!
//! Writes the INITIAL commit for the puzzle and creates the initial branch.
//! Fails if the directory already holds a game.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};

use super::print_json;
use crate::cli::Context;
use crate::core::types::BranchName;
use crate::game::Game;

/// Run the init command.
pub fn init(ctx: &Context, puzzle_file: Option<&Path>, branch: Option<&str>) -> Result<()> {
    let mut settings = ctx.settings.clone();
    let game_settings = settings.game.get_or_insert_with(Default::default);

    if let Some(path) = puzzle_file {
        let seed = fs::read_to_string(path)
            .with_context(|| format!("Failed to read puzzle file {}", path.display()))?;
        game_settings.puzzle = Some(seed);
    }
    if let Some(name) = branch {
        let name =
            BranchName::new(name).with_context(|| format!("Invalid branch name '{}'", name))?;
        game_settings.initial_branch = Some(name);
    }

    let game = Game::create(&settings)
        .with_context(|| format!("Failed to create game in {}", ctx.game_dir().display()))?;
    let puzzle = game.puzzle();

    if ctx.json {
        return print_json(puzzle);
    }

    println!("Initialized game in {}", game.path().display());
    println!(
        "Branch '{}' at {}",
        puzzle.initial_branch,
        puzzle.initial_commit.short(7)
    );
    print!("{}", puzzle.board);
    Ok(())
}
