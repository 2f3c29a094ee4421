//! Restore an archived version of a job

use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(
    config: Option<&Path>,
    job: &str,
    version: Option<u64>,
    target: Option<&Path>,
    no_lock: bool,
) -> Result<()> {
    let coordinator = super::coordinator(config, no_lock)?;

    // Extraction overwrites files at the same paths without prompting
    let outcome = coordinator.restore(job, version, target)?;

    println!("{} {}", "✓".green(), outcome);
    println!(
        "  {} {} ({} entries)",
        "Archive:".dimmed(),
        outcome.record.path.display(),
        outcome.unpacked
    );

    if !outcome.rejected.is_empty() {
        println!(
            "  {} {} entries outside the target were not restored:",
            "⚠".yellow(),
            outcome.rejected.len()
        );
        for entry in &outcome.rejected {
            println!("    {}", entry.display().dimmed());
        }
    }

    Ok(())
}
