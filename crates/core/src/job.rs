//! Resolved backup job definitions

use std::path::{Path, PathBuf};

/// Extension shared by every archive a job produces
pub const ARCHIVE_EXTENSION: &str = ".tar.gz";

/// A named backup task with fully resolved paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Unique job name, also the archive file prefix
    pub name: String,
    /// Paths archived by this job, in declaration order
    pub sources: Vec<PathBuf>,
    /// Directory holding the job's archives and state file
    pub destination: PathBuf,
}

impl Job {
    pub fn new(
        name: impl Into<String>,
        sources: Vec<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            sources,
            destination: destination.into(),
        }
    }

    /// Path of the archive for `version`: `<destination>/<name>-<version>.tar.gz`
    pub fn archive_path(&self, version: u64) -> PathBuf {
        archive_path(&self.destination, &self.name, version)
    }
}

/// File name of a job archive: `<job>-<version>.tar.gz`
pub fn archive_file_name(job_name: &str, version: u64) -> String {
    format!("{}-{}{}", job_name, version, ARCHIVE_EXTENSION)
}

pub fn archive_path(destination: &Path, job_name: &str, version: u64) -> PathBuf {
    destination.join(archive_file_name(job_name, version))
}
