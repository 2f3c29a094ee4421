//! Shelf Core - hashing, archiving and state primitives for versioned job backups
//!
//! This crate provides the storage layer used by the backup coordinator:
//! - BLAKE3 content digests over a job's sources
//! - Gzip-compressed tar archive creation and extraction
//! - Per-job state files recording the last archived digest
//!
//! Nothing in this crate logs or prints; every operation returns a value or a
//! typed [`CoreError`].

pub mod archive;
pub mod error;
pub mod hash;
pub mod job;
pub mod store;

// Re-export main types for convenience
pub use archive::{extract_archive, list_entries, ArchiveReport, ArchivedSource, Archiver, ExtractReport};
pub use error::{CoreError, Result};
pub use hash::{compute_digest, ContentDigest, IncrementalHasher};
pub use job::{archive_file_name, archive_path, Job, ARCHIVE_EXTENSION};
pub use store::StateStore;
