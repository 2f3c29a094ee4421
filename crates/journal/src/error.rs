//! Error types for version lookup and restore

use shelf_core::CoreError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("Failed to list {}: {source}", path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No backups found in {}", destination.display())]
    NoBackups { destination: PathBuf },

    #[error("No archive version {version} found for job '{job}'")]
    VersionNotFound { job: String, version: u64 },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for journal operations
pub type Result<T> = std::result::Result<T, JournalError>;
