//! Filesystem access trait and the local-disk implementation.

use std::fs;
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Readable, seekable handle returned by [`Vfs::open`].
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

/// The subset of file metadata the gateway looks at.
#[derive(Debug, Clone, Copy)]
pub struct EntryMetadata {
    pub kind: EntryKind,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl EntryMetadata {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

impl From<fs::Metadata> for EntryMetadata {
    fn from(meta: fs::Metadata) -> Self {
        let kind = if meta.is_dir() {
            EntryKind::Directory
        } else if meta.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };
        Self {
            kind,
            len: meta.len(),
            modified: meta.modified().ok(),
        }
    }
}

/// Narrow view of a filesystem used by every handler.
///
/// All paths are absolute. Implementations are blocking; async callers go
/// through `spawn_blocking`.
pub trait Vfs: Send + Sync {
    /// Metadata of `path`, following symlinks.
    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata>;

    /// Names of the immediate children of a directory, in no particular order.
    /// Names that are not valid UTF-8 cannot be requested back and are left out.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<String>>;

    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek>>;

    /// Every regular file below `dir`, recursively, sorted by path.
    /// Symlinks are skipped, so nothing outside `dir` can end up in the result.
    fn walk_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Resolve symlinks and relative components. Fails with `NotFound`
    /// when the path does not exist.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// [`Vfs`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl Vfs for LocalFs {
    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata> {
        fs::metadata(path).map(EntryMetadata::from)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path)? {
            let name = entry?.file_name();
            match name.into_string() {
                Ok(name) => names.push(name),
                Err(raw) => {
                    tracing::debug!(dir = %path.display(), name = ?raw, "skipping non-UTF-8 name");
                }
            }
        }
        Ok(names)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek>> {
        Ok(Box::new(fs::File::open(path)?))
    }

    fn walk_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }
}
