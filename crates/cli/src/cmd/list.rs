//! List the archived versions of a job

use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(config: Option<&Path>, job: &str) -> Result<()> {
    let coordinator = super::coordinator(config, true)?;
    let records = coordinator.list(job)?;

    if records.is_empty() {
        println!("{}", format!("No backups found for job '{}'", job).dimmed());
        return Ok(());
    }

    println!("{} {}", "Archives of".bold(), job.cyan().bold());
    println!("{}", "━".repeat(60).dimmed());

    for record in records.iter().rev() {
        let (size, age) = match util::archive_stats(&record.path) {
            Some((size, modified_ms)) => (
                util::format_size(size),
                util::format_relative_time(modified_ms),
            ),
            None => ("?".to_string(), "unknown".to_string()),
        };

        println!(
            "  {:>6}  {:>10}  {:<16}  {}",
            format!("v{}", record.version).yellow(),
            size,
            age.dimmed(),
            record.path.display()
        );
    }

    println!("{}", "━".repeat(60).dimmed());
    println!("{} version(s)", records.len());

    Ok(())
}
