//! Show config location and an example job file

use crate::config;
use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;

/// Print the config file the other commands would read
pub fn run_path(config: Option<&Path>) -> Result<()> {
    let provider = super::provider(config)?;
    let path = provider.path();

    let status = if path.exists() {
        "(exists)".green().to_string()
    } else {
        "(not found)".yellow().to_string()
    };
    println!("{} {}", path.display(), status);

    Ok(())
}

/// Print an example config
pub fn run_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}
