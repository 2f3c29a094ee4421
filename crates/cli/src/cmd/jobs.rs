//! List configured jobs

use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(config: Option<&Path>) -> Result<()> {
    let coordinator = super::coordinator(config, true)?;
    let definitions = coordinator.definitions()?;

    if definitions.is_empty() {
        println!("{}", "No jobs configured".dimmed());
        return Ok(());
    }

    for definition in &definitions {
        println!(
            "{}  {} {}",
            definition.name.cyan().bold(),
            "→".dimmed(),
            definition.destination
        );
        println!(
            "    {} source(s), method {}",
            definition.source.len(),
            definition.method.dimmed()
        );
    }

    Ok(())
}
