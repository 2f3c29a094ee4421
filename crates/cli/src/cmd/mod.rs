//! CLI command implementations

pub mod backup;
pub mod config;
pub mod jobs;
pub mod list;
pub mod restore;

use crate::config::FileConfigProvider;
use crate::coordinator::BackupCoordinator;
use anyhow::{Context, Result};
use std::path::Path;

/// Config provider for `--config`, falling back to the default location
pub fn provider(config: Option<&Path>) -> Result<FileConfigProvider> {
    match config {
        Some(path) => Ok(FileConfigProvider::new(path)),
        None => FileConfigProvider::from_default_path()
            .context("Pass --config or set $SHELF_CONFIG"),
    }
}

/// Coordinator reading jobs from the selected config file
pub fn coordinator(
    config: Option<&Path>,
    no_lock: bool,
) -> Result<BackupCoordinator<FileConfigProvider>> {
    Ok(BackupCoordinator::new(provider(config)?).locking(!no_lock))
}
