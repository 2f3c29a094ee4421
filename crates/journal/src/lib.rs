//! Archive version journal and restore
//!
//! This crate provides:
//! - Archive records parsed from `<job>-<version>.tar.gz` file names
//! - A per-job version index rebuilt from the destination directory
//! - Version selection (latest or exact) and extraction

pub mod checkpoint;
pub mod error;
pub mod journal;
pub mod restore;

// Re-exports
pub use checkpoint::{parse_version, ArchiveRecord};
pub use error::{JournalError, Result};
pub use journal::{list_versions, next_version, Journal};
pub use restore::{RestoreReport, Restorer, VersionSelector};
