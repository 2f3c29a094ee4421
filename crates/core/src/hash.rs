//! BLAKE3 content digests over job sources

use crate::error::{CoreError, Result};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Read buffer used when streaming file contents into the hasher
pub const CHUNK_SIZE: usize = 8192;

/// A 256-bit BLAKE3 digest over the contents of a job's sources
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex encoding (64 characters)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 64-character hex string
    pub fn from_hex(hex: &str) -> Result<Self> {
        if hex.len() != 64 {
            return Err(CoreError::InvalidDigest(format!(
                "expected 64 hex characters, got {}",
                hex.len()
            )));
        }

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex, &mut bytes)
            .map_err(|e| CoreError::InvalidDigest(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Hash bytes using BLAKE3
pub fn hash_bytes(data: &[u8]) -> ContentDigest {
    ContentDigest::from_bytes(*blake3::hash(data).as_bytes())
}

/// Hash a single file using BLAKE3 (streaming)
pub fn hash_file(path: &Path) -> Result<ContentDigest> {
    let mut hasher = IncrementalHasher::new();
    hasher.update_from_file(path)?;
    Ok(hasher.finalize())
}

/// Incremental hasher for building one digest across many files
pub struct IncrementalHasher {
    inner: blake3::Hasher,
}

impl IncrementalHasher {
    pub fn new() -> Self {
        Self {
            inner: blake3::Hasher::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Stream a file into the hasher in `CHUNK_SIZE` pieces.
    ///
    /// Returns the number of bytes read.
    pub fn update_from_file(&mut self, path: &Path) -> Result<u64> {
        let file = File::open(path).map_err(|e| CoreError::io(path, e))?;
        let mut reader = BufReader::new(file);
        let mut buffer = [0u8; CHUNK_SIZE];
        let mut total = 0u64;

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(CoreError::io(path, e)),
            };
            self.inner.update(&buffer[..bytes_read]);
            total += bytes_read as u64;
        }

        Ok(total)
    }

    pub fn finalize(self) -> ContentDigest {
        ContentDigest::from_bytes(*self.inner.finalize().as_bytes())
    }
}

impl Default for IncrementalHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// What an entry reached from a source is, as the archive stores it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    /// Size reported by the filesystem at enumeration time
    File { len: u64 },
    /// Stored as a link, never followed
    Symlink { target: PathBuf },
}

/// A directory, regular file or symlink reached from one of the sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Path on disk
    pub path: PathBuf,
    /// Path relative to the source's parent, `/`-separated
    pub key: String,
    pub kind: EntryKind,
}

/// Compute the content digest of an ordered set of sources.
///
/// Sources are sorted by their string form. Each present source is framed by
/// its full path and entry count, then every directory, regular file and
/// symlink under it is fed, sorted by relative key, into a single BLAKE3
/// accumulator:
///
/// ```text
/// source   'S' path \0 count(u64 LE)
/// dir      'd' key \0
/// file     'f' key \0 len(u64 LE) bytes
/// symlink  'l' key \0 target \0
/// ```
///
/// Renames, moves between sources, new empty directories and retargeted
/// links all change the digest. Missing sources and special files
/// contribute nothing, matching what the archiver skips.
pub fn compute_digest<P: AsRef<Path>>(sources: &[P]) -> Result<ContentDigest> {
    let mut ordered: Vec<&Path> = sources.iter().map(AsRef::as_ref).collect();
    ordered.sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));

    let mut hasher = IncrementalHasher::new();
    for source in ordered {
        if !source.exists() {
            continue;
        }

        let entries = source_entries(source)?;
        hasher.update(b"S");
        hasher.update(source.to_string_lossy().as_bytes());
        hasher.update(&[0]);
        hasher.update(&(entries.len() as u64).to_le_bytes());

        for entry in entries {
            match &entry.kind {
                EntryKind::Dir => {
                    hasher.update(b"d");
                    hasher.update(entry.key.as_bytes());
                    hasher.update(&[0]);
                }
                EntryKind::File { len } => {
                    hasher.update(b"f");
                    hasher.update(entry.key.as_bytes());
                    hasher.update(&[0]);
                    hasher.update(&len.to_le_bytes());
                    hasher.update_from_file(&entry.path)?;
                }
                EntryKind::Symlink { target } => {
                    hasher.update(b"l");
                    hasher.update(entry.key.as_bytes());
                    hasher.update(&[0]);
                    hasher.update(target.to_string_lossy().as_bytes());
                    hasher.update(&[0]);
                }
            }
        }
    }

    Ok(hasher.finalize())
}

/// Enumerate the directories, regular files and symlinks under `source`,
/// sorted by relative key.
///
/// A missing source yields an empty list. A source that is itself a symlink
/// yields the link alone; special files are left out.
pub fn source_entries(source: &Path) -> Result<Vec<SourceEntry>> {
    let base = source.parent().unwrap_or(source);

    let walker = WalkDir::new(source)
        .follow_links(false)
        .follow_root_links(false);

    let mut entries = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if entry_not_found(&e) && e.depth() == 0 => return Ok(Vec::new()),
            Err(e) => {
                return Err(CoreError::Walk {
                    path: source.to_path_buf(),
                    source: e,
                })
            }
        };

        let file_type = entry.file_type();
        let kind = if file_type.is_dir() {
            EntryKind::Dir
        } else if file_type.is_file() {
            let len = entry
                .metadata()
                .map_err(|e| CoreError::Walk {
                    path: entry.path().to_path_buf(),
                    source: e,
                })?
                .len();
            EntryKind::File { len }
        } else if file_type.is_symlink() {
            let target = fs::read_link(entry.path()).map_err(|e| CoreError::io(entry.path(), e))?;
            EntryKind::Symlink { target }
        } else {
            continue;
        };

        entries.push(SourceEntry {
            key: relative_key(entry.path(), base),
            path: entry.into_path(),
            kind,
        });
    }

    entries.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(entries)
}

fn entry_not_found(err: &walkdir::Error) -> bool {
    err.io_error()
        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}

fn relative_key(path: &Path, base: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
