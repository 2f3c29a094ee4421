//! Errors surfaced by the backup coordinator

use crate::config::ConfigError;
use shelf_core::CoreError;
use shelf_journal::JournalError;
use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ShelfError {
    #[error("No job named '{0}' in config")]
    JobNotFound(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Could not determine home directory")]
    NoHome,

    #[error("None of the sources of job '{job}' exist")]
    NoSources { job: String, skipped: Vec<PathBuf> },

    #[error("No backups found in {}", destination.display())]
    NoBackups { destination: PathBuf },

    #[error("No archive version {version} found for job '{job}'")]
    VersionNotFound { job: String, version: u64 },

    #[error("Job '{job}' is locked by another shelf process{}", describe_holder(.holder_pid))]
    Locked { job: String, holder_pid: Option<u32> },

    #[error("Failed to {action} at {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Journal(JournalError),
}

impl ShelfError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

impl From<JournalError> for ShelfError {
    fn from(err: JournalError) -> Self {
        match err {
            JournalError::NoBackups { destination } => Self::NoBackups { destination },
            JournalError::VersionNotFound { job, version } => {
                Self::VersionNotFound { job, version }
            }
            JournalError::Core(core) => Self::Core(core),
            other => Self::Journal(other),
        }
    }
}

fn describe_holder(pid: &Option<u32>) -> String {
    match pid {
        Some(pid) => format!(" (pid {})", pid),
        None => String::new(),
    }
}

/// Result type for coordinator operations
pub type Result<T> = std::result::Result<T, ShelfError>;
