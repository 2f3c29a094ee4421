//! Version index of a job's archives, rebuilt from the destination directory

use crate::checkpoint::{parse_version, ArchiveRecord};
use crate::error::{JournalError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Archives of one job, keyed by version.
///
/// There is no separate index file: the directory listing is the source of
/// truth, so a failed or interrupted backup never skews the next version.
pub struct Journal {
    destination: PathBuf,
    job_name: String,
    index: BTreeMap<u64, PathBuf>,
}

impl Journal {
    /// Scan `destination` for archives of `job_name`.
    ///
    /// A destination that does not exist yet holds no archives.
    pub fn open(destination: &Path, job_name: &str) -> Result<Self> {
        let mut index = BTreeMap::new();

        let entries = match fs::read_dir(destination) {
            Ok(entries) => Some(entries),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(JournalError::ListDir {
                    path: destination.to_path_buf(),
                    source: e,
                })
            }
        };

        for entry in entries.into_iter().flatten() {
            let entry = entry.map_err(|e| JournalError::ListDir {
                path: destination.to_path_buf(),
                source: e,
            })?;

            let file_name = entry.file_name();
            let Some(version) = file_name.to_str().and_then(|n| parse_version(job_name, n)) else {
                continue;
            };

            let path = entry.path();
            if path.is_file() {
                index.insert(version, path);
            }
        }

        Ok(Self {
            destination: destination.to_path_buf(),
            job_name: job_name.to_string(),
            index,
        })
    }

    /// Get the archive for an exact version
    pub fn get(&self, version: u64) -> Option<ArchiveRecord> {
        self.index.get(&version).map(|path| self.record(version, path))
    }

    /// Get the highest-versioned archive
    pub fn latest(&self) -> Option<ArchiveRecord> {
        self.index
            .last_key_value()
            .map(|(&version, path)| self.record(version, path))
    }

    /// `max(version) + 1`, or 1 when the job has no archives
    pub fn next_version(&self) -> u64 {
        self.index
            .last_key_value()
            .map_or(1, |(&version, _)| version.saturating_add(1))
    }

    /// All archives sorted ascending by version
    pub fn records(&self) -> Vec<ArchiveRecord> {
        self.index
            .iter()
            .map(|(&version, path)| self.record(version, path))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    fn record(&self, version: u64, path: &Path) -> ArchiveRecord {
        ArchiveRecord {
            job_name: self.job_name.clone(),
            version,
            path: path.to_path_buf(),
        }
    }
}

/// All archives of `job_name` in `destination`, ascending by version
pub fn list_versions(destination: &Path, job_name: &str) -> Result<Vec<ArchiveRecord>> {
    Ok(Journal::open(destination, job_name)?.records())
}

/// Version number the next archive of `job_name` should use
pub fn next_version(destination: &Path, job_name: &str) -> Result<u64> {
    Ok(Journal::open(destination, job_name)?.next_version())
}
