//! Back up a configured job

use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;

use crate::coordinator::BackupOutcome;

pub fn run(config: Option<&Path>, job: &str, no_lock: bool) -> Result<()> {
    // 1. Load config and build the coordinator
    let coordinator = super::coordinator(config, no_lock)?;

    // 2. Hash, compare and archive if needed
    let outcome = coordinator.backup(job)?;

    // 3. Report
    match &outcome {
        BackupOutcome::Unchanged { .. } => {
            println!("{} {}", "•".dimmed(), outcome);
        }
        BackupOutcome::Created {
            skipped, entries, ..
        } => {
            println!("{} {}", "✓".green(), outcome);
            println!("  {} {} entries", "Archived:".dimmed(), entries);
            for source in skipped {
                println!(
                    "  {} Source not found, skipped: {}",
                    "⚠".yellow(),
                    source.display()
                );
            }
        }
    }

    Ok(())
}
