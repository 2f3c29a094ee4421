//! Advisory per-job lock files
//!
//! Two shelf processes working on the same job could both see the same
//! previous digest and race for the same version number. Each backup or
//! restore therefore holds `<destination>/.<job>.lock` for its duration.

use crate::error::{Result, ShelfError};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Exclusive lock over one job's destination entries
#[derive(Debug)]
pub struct JobLock {
    path: PathBuf,
    #[allow(dead_code)]
    file: File,
}

/// Lock file content
#[derive(Debug, Serialize, Deserialize)]
struct LockContent {
    pid: u32,
    started_at: u64,
}

impl JobLock {
    /// Acquire the lock of `job_name` inside `destination` (non-blocking).
    ///
    /// Fails with [`ShelfError::Locked`] while another process holds it.
    /// A lock file left behind by a dead process is not held by anyone and
    /// is simply taken over.
    pub fn acquire(destination: &Path, job_name: &str) -> Result<Self> {
        let lock_path = lock_path(destination, job_name);

        loop {
            let mut file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&lock_path)
                .map_err(|e| ShelfError::io("open lock file", &lock_path, e))?;

            let acquired = try_flock_exclusive(&file)
                .map_err(|e| ShelfError::io("lock", &lock_path, e))?;

            if !acquired {
                let holder_pid = read_lock_content(&mut file).ok().map(|c| c.pid);
                return Err(ShelfError::Locked {
                    job: job_name.to_string(),
                    holder_pid,
                });
            }

            // The previous holder unlinks the file on release; a lock taken on
            // that orphaned inode guards nothing
            let linked = still_linked(&file, &lock_path)
                .map_err(|e| ShelfError::io("stat lock file", &lock_path, e))?;
            if !linked {
                tracing::debug!("Lock file {} was replaced, retrying", lock_path.display());
                continue;
            }

            write_lock_content(&mut file)
                .map_err(|e| ShelfError::io("write lock file", &lock_path, e))?;

            tracing::debug!("Acquired lock {}", lock_path.display());

            return Ok(Self {
                path: lock_path,
                file,
            });
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock and remove its file
    pub fn release(self) -> Result<()> {
        std::fs::remove_file(&self.path)
            .map_err(|e| ShelfError::io("remove lock file", &self.path, e))
    }
}

impl Drop for JobLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Path of the hidden lock file `<destination>/.<job>.lock`
pub fn lock_path(destination: &Path, job_name: &str) -> PathBuf {
    destination.join(format!(".{}.lock", job_name))
}

fn write_lock_content(file: &mut File) -> io::Result<()> {
    let content = LockContent {
        pid: std::process::id(),
        started_at: current_timestamp_ms(),
    };
    let serialized = serde_json::to_string(&content)?;

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(serialized.as_bytes())?;
    file.sync_all()
}

fn read_lock_content(file: &mut File) -> io::Result<LockContent> {
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Try to acquire exclusive file lock (non-blocking)
#[cfg(unix)]
fn try_flock_exclusive(file: &File) -> io::Result<bool> {
    use nix::fcntl::{flock, FlockArg};
    use std::os::unix::io::AsRawFd;

    match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
        Ok(()) => Ok(true),
        Err(nix::errno::Errno::EWOULDBLOCK) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(not(unix))]
fn try_flock_exclusive(_file: &File) -> io::Result<bool> {
    Ok(true)
}

/// Whether `path` still names the inode `file` has open
#[cfg(unix)]
fn still_linked(file: &File, path: &Path) -> io::Result<bool> {
    use nix::sys::stat::{fstat, stat};
    use std::os::unix::io::AsRawFd;

    let held = fstat(file.as_raw_fd())?;
    match stat(path) {
        Ok(current) => Ok(current.st_dev == held.st_dev && current.st_ino == held.st_ino),
        Err(nix::errno::Errno::ENOENT) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(not(unix))]
fn still_linked(_file: &File, _path: &Path) -> io::Result<bool> {
    Ok(true)
}

fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
