//! Gzip-compressed tar archives of job sources
//!
//! Archives are written to a temporary file inside the destination directory
//! and only renamed to `<job>-<version>.tar.gz` once fully written, so a
//! failed backup never leaves a file that looks like a complete archive.

use crate::error::{CoreError, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// A source that was written into the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedSource {
    pub source: PathBuf,
    /// Name of the source's top-level entry inside the archive
    pub entry_name: PathBuf,
}

/// Result of writing one archive
#[derive(Debug, Clone)]
pub struct ArchiveReport {
    pub archive_path: PathBuf,
    pub archived: Vec<ArchivedSource>,
    /// Declared sources that did not exist at archive time
    pub skipped: Vec<PathBuf>,
    /// Number of tar entries written (files, directories, links)
    pub entries: usize,
}

impl ArchiveReport {
    /// True when every declared source made it into the archive
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Result of unpacking an archive
#[derive(Debug, Clone, Default)]
pub struct ExtractReport {
    pub unpacked: usize,
    /// Entries whose paths would have escaped the target directory
    pub rejected: Vec<PathBuf>,
}

/// Writes job sources into compressed tar archives
pub struct Archiver {
    home: PathBuf,
}

impl Archiver {
    /// Create an archiver that names entries relative to `home`
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Archive `sources` into a new file at `archive_path`.
    ///
    /// Missing sources are skipped and reported. Any I/O failure while writing
    /// is fatal and removes the partial file. Fails with `ArchiveExists` rather
    /// than replacing an archive that is already present.
    pub fn create_archive<P: AsRef<Path>>(
        &self,
        sources: &[P],
        archive_path: &Path,
    ) -> Result<ArchiveReport> {
        let dir = archive_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "archive".to_string());

        let tmp = tempfile::Builder::new()
            .prefix(&format!(".{}.", file_name))
            .suffix(".partial")
            .tempfile_in(dir)
            .map_err(|e| CoreError::io(dir, e))?;

        let mut report = ArchiveReport {
            archive_path: archive_path.to_path_buf(),
            archived: Vec::new(),
            skipped: Vec::new(),
            entries: 0,
        };

        {
            let encoder = GzEncoder::new(BufWriter::new(tmp.as_file()), Compression::default());
            let mut builder = tar::Builder::new(encoder);
            builder.follow_symlinks(false);

            for source in sources {
                let source = source.as_ref();
                if !source.exists() {
                    report.skipped.push(source.to_path_buf());
                    continue;
                }

                let entry_name = entry_name(source, &self.home);
                report.entries += append_source(&mut builder, source, &entry_name)?;
                report.archived.push(ArchivedSource {
                    source: source.to_path_buf(),
                    entry_name,
                });
            }

            let encoder = builder
                .into_inner()
                .map_err(|e| CoreError::io(tmp.path(), e))?;
            let mut writer = encoder.finish().map_err(|e| CoreError::io(tmp.path(), e))?;
            writer.flush().map_err(|e| CoreError::io(tmp.path(), e))?;
        }

        tmp.as_file()
            .sync_all()
            .map_err(|e| CoreError::io(tmp.path(), e))?;

        tmp.persist_noclobber(archive_path).map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                CoreError::ArchiveExists(archive_path.to_path_buf())
            } else {
                CoreError::io(archive_path, e.error)
            }
        })?;

        Ok(report)
    }
}

/// Name of a source's top-level entry inside the archive.
///
/// Sources under `home` keep their home-relative path; anything else is stored
/// under its base name only. Two same-named sources outside home therefore
/// collide inside the archive.
///
/// The home check is lexical, so a path such as `<home>/../shared/x` only
/// counts as under home if the relative part has no `..` in it.
pub fn entry_name(source: &Path, home: &Path) -> PathBuf {
    if let Ok(relative) = source.strip_prefix(home) {
        if relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return relative.to_path_buf();
        }
    }

    match source.file_name() {
        Some(name) => PathBuf::from(name),
        None => source
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect(),
    }
}

/// Append one source (file, link or directory tree) and return the entry count
fn append_source<W: Write>(
    builder: &mut tar::Builder<W>,
    source: &Path,
    entry_name: &Path,
) -> Result<usize> {
    let mut entries = 0;

    for entry in WalkDir::new(source)
        .follow_links(false)
        .follow_root_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| CoreError::Walk {
            path: source.to_path_buf(),
            source: e,
        })?;

        let relative = entry.path().strip_prefix(source).unwrap_or(Path::new(""));
        let name = if relative.as_os_str().is_empty() {
            entry_name.to_path_buf()
        } else {
            entry_name.join(relative)
        };

        let file_type = entry.file_type();
        let appended = if file_type.is_dir() {
            if name.as_os_str().is_empty() {
                Ok(false)
            } else {
                builder.append_dir(&name, entry.path()).map(|_| true)
            }
        } else if file_type.is_file() || file_type.is_symlink() {
            builder
                .append_path_with_name(entry.path(), &name)
                .map(|_| true)
        } else {
            Ok(false)
        };

        if appended.map_err(|e| CoreError::io(entry.path(), e))? {
            entries += 1;
        }
    }

    Ok(entries)
}

/// Unpack every entry of `archive_path` into `target`, overwriting existing files
pub fn extract_archive(archive_path: &Path, target: &Path) -> Result<ExtractReport> {
    fs::create_dir_all(target).map_err(|e| CoreError::io(target, e))?;

    let file = File::open(archive_path).map_err(|e| CoreError::io(archive_path, e))?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    archive.set_overwrite(true);
    archive.set_preserve_permissions(true);
    archive.set_preserve_mtime(true);

    let mut report = ExtractReport::default();
    let entries = archive
        .entries()
        .map_err(|e| CoreError::io(archive_path, e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| CoreError::io(archive_path, e))?;
        let path = entry
            .path()
            .map_err(|e| CoreError::io(archive_path, e))?
            .into_owned();

        if entry
            .unpack_in(target)
            .map_err(|e| CoreError::io(target.join(&path), e))?
        {
            report.unpacked += 1;
        } else {
            report.rejected.push(path);
        }
    }

    Ok(report)
}

/// List entry paths of an archive without unpacking it
pub fn list_entries(archive_path: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive_path).map_err(|e| CoreError::io(archive_path, e))?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));

    let mut paths = Vec::new();
    for entry in archive
        .entries()
        .map_err(|e| CoreError::io(archive_path, e))?
    {
        let entry = entry.map_err(|e| CoreError::io(archive_path, e))?;
        let path = entry.path().map_err(|e| CoreError::io(archive_path, e))?;
        paths.push(path.into_owned());
    }
    Ok(paths)
}
