//! Archive selection and extraction

use crate::checkpoint::ArchiveRecord;
use crate::error::{JournalError, Result};
use crate::journal::Journal;
use shelf_core::{extract_archive, ExtractReport};
use std::fmt;
use std::path::{Path, PathBuf};

/// Which archive of a job to restore
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionSelector {
    #[default]
    Latest,
    Exact(u64),
}

impl From<Option<u64>> for VersionSelector {
    fn from(version: Option<u64>) -> Self {
        version.map_or(Self::Latest, Self::Exact)
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Exact(version) => write!(f, "{}", version),
        }
    }
}

/// Outcome of a successful restore
#[derive(Debug, Clone)]
pub struct RestoreReport {
    pub record: ArchiveRecord,
    pub target: PathBuf,
    pub extract: ExtractReport,
}

/// Pick the archive matching `selector` from an opened journal
pub fn select(journal: &Journal, selector: VersionSelector) -> Result<ArchiveRecord> {
    let latest = journal.latest().ok_or_else(|| JournalError::NoBackups {
        destination: journal.destination().to_path_buf(),
    })?;

    match selector {
        VersionSelector::Latest => Ok(latest),
        VersionSelector::Exact(version) => {
            journal
                .get(version)
                .ok_or_else(|| JournalError::VersionNotFound {
                    job: journal.job_name().to_string(),
                    version,
                })
        }
    }
}

/// Unpacks a selected archive of a job into a target directory.
///
/// Extraction overwrites files at the same relative paths without asking.
pub struct Restorer {
    destination: PathBuf,
    job_name: String,
}

impl Restorer {
    pub fn new(destination: impl Into<PathBuf>, job_name: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            job_name: job_name.into(),
        }
    }

    /// Resolve `selector` against the archives currently on disk
    pub fn select(&self, selector: VersionSelector) -> Result<ArchiveRecord> {
        let journal = Journal::open(&self.destination, &self.job_name)?;
        select(&journal, selector)
    }

    /// Select an archive and extract its full contents into `target`
    pub fn restore(&self, selector: VersionSelector, target: &Path) -> Result<RestoreReport> {
        let record = self.select(selector)?;
        let extract = extract_archive(&record.path, target)?;

        Ok(RestoreReport {
            record,
            target: target.to_path_buf(),
            extract,
        })
    }
}
