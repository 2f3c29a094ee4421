//! Backup and restore orchestration
//!
//! A backup runs through these stages:
//!
//! ```text
//! Checking ──digest == stored──▶ Unchanged
//!    │
//!    └─differs / no state──▶ Archiving ──ok──▶ Done (state updated)
//!                               │
//!                               └─error──▶ Failed (state untouched)
//! ```
//!
//! The state file is written only after the archive has been persisted, so a
//! failed run is retried in full on the next invocation.

use crate::config::{ConfigProvider, JobDefinition};
use crate::error::{Result, ShelfError};
use crate::locks::JobLock;
use shelf_core::{compute_digest, Archiver, ContentDigest, CoreError, Job, StateStore};
use shelf_journal::{list_versions, ArchiveRecord, Journal, Restorer, VersionSelector};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, warn};

/// Stage of a single backup run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupStage {
    Checking,
    Unchanged,
    Archiving,
    Done,
    Failed,
}

/// Result of a backup request
#[derive(Debug, Clone)]
pub enum BackupOutcome {
    /// Sources match the last archived digest; nothing was written
    Unchanged { job: String, digest: ContentDigest },
    /// A new archive was written and the state file updated
    Created {
        record: ArchiveRecord,
        digest: ContentDigest,
        /// Sources missing at archive time
        skipped: Vec<PathBuf>,
        entries: usize,
    },
}

impl BackupOutcome {
    pub fn digest(&self) -> &ContentDigest {
        match self {
            Self::Unchanged { digest, .. } | Self::Created { digest, .. } => digest,
        }
    }

    pub fn record(&self) -> Option<&ArchiveRecord> {
        match self {
            Self::Created { record, .. } => Some(record),
            Self::Unchanged { .. } => None,
        }
    }

    pub fn skipped(&self) -> &[PathBuf] {
        match self {
            Self::Created { skipped, .. } => skipped,
            Self::Unchanged { .. } => &[],
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }
}

impl fmt::Display for BackupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged { .. } => write!(f, "No changes since last backup, skipped"),
            Self::Created { record, .. } => write!(
                f,
                "Backup created: {} (version {})",
                record.path.display(),
                record.version
            ),
        }
    }
}

/// Result of a restore request
#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    pub record: ArchiveRecord,
    pub target: PathBuf,
    pub unpacked: usize,
    /// Archive entries refused because they would land outside `target`
    pub rejected: Vec<PathBuf>,
}

impl fmt::Display for RestoreOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Restored version {} for job '{}' into {}",
            self.record.version,
            self.record.job_name,
            self.target.display()
        )
    }
}

/// Drives backups and restores of configured jobs
pub struct BackupCoordinator<C> {
    provider: C,
    home: Option<PathBuf>,
    locking: bool,
}

impl<C: ConfigProvider> BackupCoordinator<C> {
    /// Coordinator using the current user's home directory
    pub fn new(provider: C) -> Self {
        Self {
            provider,
            home: dirs::home_dir(),
            locking: true,
        }
    }

    /// Use `home` for `~` expansion, archive entry naming and the default
    /// restore target
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Enable or disable the per-job advisory lock
    pub fn locking(mut self, enabled: bool) -> Self {
        self.locking = enabled;
        self
    }

    pub fn home(&self) -> Result<&Path> {
        self.home.as_deref().ok_or(ShelfError::NoHome)
    }

    /// All job definitions, in config order
    pub fn definitions(&self) -> Result<Vec<JobDefinition>> {
        Ok(self.provider.load()?.jobs)
    }

    /// Look up and resolve the job named `job_name`
    pub fn resolve_job(&self, job_name: &str) -> Result<Job> {
        let config = self.provider.load()?;
        let definition = config
            .find(job_name)
            .ok_or_else(|| ShelfError::JobNotFound(job_name.to_string()))?;

        Ok(definition.resolve(self.home.as_deref())?)
    }

    /// Back up the configured job `job_name`
    pub fn backup(&self, job_name: &str) -> Result<BackupOutcome> {
        let job = self.resolve_job(job_name)?;
        self.backup_job(&job)
    }

    /// Back up `job` if its sources changed since the last archive
    pub fn backup_job(&self, job: &Job) -> Result<BackupOutcome> {
        let span = info_span!("backup", job = %job.name);
        let _enter = span.enter();

        let home = self.home()?;

        fs::create_dir_all(&job.destination)
            .map_err(|e| ShelfError::io("create destination", &job.destination, e))?;
        let _lock = self.lock(job)?;

        let mut stage = BackupStage::Checking;
        debug!(?stage, sources = job.sources.len(), "Computing content digest");

        let digest = compute_digest(&job.sources)?;
        let store = StateStore::new(&job.destination);
        let previous = match store.read(&job.name) {
            Ok(previous) => previous,
            Err(CoreError::InvalidDigest(reason)) => {
                warn!(
                    "Ignoring unreadable state file {}: {}",
                    store.state_path(&job.name).display(),
                    reason
                );
                None
            }
            Err(e) => return Err(e.into()),
        };

        if previous == Some(digest) {
            stage = BackupStage::Unchanged;
            info!(?stage, %digest, "No changes since last backup");
            return Ok(BackupOutcome::Unchanged {
                job: job.name.clone(),
                digest,
            });
        }

        stage = BackupStage::Archiving;
        debug!(?stage, previous = ?previous, current = %digest, "Sources changed");

        match self.archive(job, home, &store, digest) {
            Ok(outcome) => {
                stage = BackupStage::Done;
                info!(?stage, "{}", outcome);
                Ok(outcome)
            }
            Err(e) => {
                stage = BackupStage::Failed;
                warn!(?stage, "Backup failed: {}", e);
                Err(e)
            }
        }
    }

    fn archive(
        &self,
        job: &Job,
        home: &Path,
        store: &StateStore,
        digest: ContentDigest,
    ) -> Result<BackupOutcome> {
        let present = job.sources.iter().filter(|s| s.exists()).count();
        if present == 0 {
            return Err(ShelfError::NoSources {
                job: job.name.clone(),
                skipped: job.sources.clone(),
            });
        }

        let version = Journal::open(&job.destination, &job.name)?.next_version();
        let archive_path = job.archive_path(version);
        debug!(version, "Writing {}", archive_path.display());

        let report = Archiver::new(home).create_archive(&job.sources, &archive_path)?;
        for missing in &report.skipped {
            warn!("Source not found, skipped: {}", missing.display());
        }

        store.write(&job.name, &digest)?;

        Ok(BackupOutcome::Created {
            record: ArchiveRecord {
                job_name: job.name.clone(),
                version,
                path: report.archive_path,
            },
            digest,
            skipped: report.skipped,
            entries: report.entries,
        })
    }

    /// Restore `version` (latest when `None`) of job `job_name` into
    /// `target`, or into the home directory when no target is given
    pub fn restore(
        &self,
        job_name: &str,
        version: Option<u64>,
        target: Option<&Path>,
    ) -> Result<RestoreOutcome> {
        let job = self.resolve_job(job_name)?;
        self.restore_job(&job, VersionSelector::from(version), target)
    }

    pub fn restore_job(
        &self,
        job: &Job,
        selector: VersionSelector,
        target: Option<&Path>,
    ) -> Result<RestoreOutcome> {
        let span = info_span!("restore", job = %job.name, version = %selector);
        let _enter = span.enter();

        let target = match target {
            Some(target) => target.to_path_buf(),
            None => self.home()?.to_path_buf(),
        };

        // Nothing to lock (or restore) in a destination that was never created
        let _lock = if job.destination.is_dir() {
            self.lock(job)?
        } else {
            None
        };

        let report = Restorer::new(&job.destination, &job.name).restore(selector, &target)?;
        for rejected in &report.extract.rejected {
            warn!("Refused archive entry outside target: {}", rejected.display());
        }

        let outcome = RestoreOutcome {
            record: report.record,
            target: report.target,
            unpacked: report.extract.unpacked,
            rejected: report.extract.rejected,
        };
        info!("{}", outcome);
        Ok(outcome)
    }

    /// Archives of job `job_name`, ascending by version
    pub fn list(&self, job_name: &str) -> Result<Vec<ArchiveRecord>> {
        let job = self.resolve_job(job_name)?;
        Ok(list_versions(&job.destination, &job.name)?)
    }

    fn lock(&self, job: &Job) -> Result<Option<JobLock>> {
        if !self.locking {
            return Ok(None);
        }
        JobLock::acquire(&job.destination, &job.name).map(Some)
    }
}
