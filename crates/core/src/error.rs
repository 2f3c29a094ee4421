//! Error types for hashing, archiving and state persistence

use std::io;
use std::path::{Path, PathBuf};

/// Errors raised by the core storage primitives
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Invalid digest: {0}")]
    InvalidDigest(String),

    #[error("Archive already exists: {}", .0.display())]
    ArchiveExists(PathBuf),
}

impl CoreError {
    /// Attach a path to an I/O error
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
