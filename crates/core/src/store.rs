//! Per-job state files holding the last archived digest
//!
//! Layout inside a job's destination directory:
//! ```text
//! <destination>/
//!   .<job>.hash        last archived content digest (hex)
//!   <job>-1.tar.gz
//!   <job>-2.tar.gz
//! ```

use crate::error::{CoreError, Result};
use crate::hash::ContentDigest;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Persists the last-known content digest of each job
pub struct StateStore {
    destination: PathBuf,
}

impl StateStore {
    /// Open the state store of a destination directory
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    /// Path of the state file for `job_name`
    pub fn state_path(&self, job_name: &str) -> PathBuf {
        state_path(&self.destination, job_name)
    }

    /// Read the last digest recorded for `job_name`.
    ///
    /// Returns `Ok(None)` when no state file exists yet (first backup).
    pub fn read(&self, job_name: &str) -> Result<Option<ContentDigest>> {
        let path = self.state_path(job_name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CoreError::io(&path, e)),
        };

        ContentDigest::from_hex(content.trim()).map(Some)
    }

    /// Record `digest` for `job_name`, replacing any previous value
    pub fn write(&self, job_name: &str, digest: &ContentDigest) -> Result<()> {
        let path = self.state_path(job_name);
        let content = format!("{}\n", digest.to_hex());
        atomic_write(&path, content.as_bytes())
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

/// Path of the hidden state file `<destination>/.<job>.hash`
pub fn state_path(destination: &Path, job_name: &str) -> PathBuf {
    destination.join(format!(".{}.hash", job_name))
}

/// Atomic write helper
///
/// Writes data to a temporary file next to `target`, fsyncs it, then renames
/// it over the target.
pub fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::Builder::new()
        .prefix(".shelf-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| CoreError::io(dir, e))?;

    tmp.write_all(data).map_err(|e| CoreError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| CoreError::io(tmp.path(), e))?;
    tmp.persist(target)
        .map_err(|e| CoreError::io(target, e.error))?;
    Ok(())
}
