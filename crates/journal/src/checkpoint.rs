//! Archive records and archive file name matching

use shelf_core::ARCHIVE_EXTENSION;
use std::path::PathBuf;

/// One versioned archive of a job found in its destination directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    pub job_name: String,
    /// Positive, strictly increasing per job (gaps allowed)
    pub version: u64,
    pub path: PathBuf,
}

/// Parse the version out of an archive file name belonging to `job_name`.
///
/// Only `<job_name>-<digits>.tar.gz` matches, anchored on the whole name, so
/// `db` never picks up archives of `db2` or `db-old`.
pub fn parse_version(job_name: &str, file_name: &str) -> Option<u64> {
    let digits = file_name
        .strip_prefix(job_name)?
        .strip_prefix('-')?
        .strip_suffix(ARCHIVE_EXTENSION)?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok()
}
