//! In-memory [`Vfs`] used as a test double.

use std::collections::{BTreeMap, HashSet};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::fs::{EntryKind, EntryMetadata, ReadSeek, Vfs};
use super::resolver::normalize;

#[derive(Debug, Clone)]
enum Node {
    File { data: Vec<u8>, modified: SystemTime },
    Dir,
}

/// A filesystem held entirely in a map of absolute paths.
///
/// Parent directories are created implicitly. Reads of paths registered
/// with [`MemoryFs::fail_reads`] return an error, which lets tests break an
/// archive build halfway through.
#[derive(Debug, Clone)]
pub struct MemoryFs {
    nodes: BTreeMap<PathBuf, Node>,
    failing: HashSet<PathBuf>,
    modified: SystemTime,
}

impl MemoryFs {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(PathBuf::from("/"), Node::Dir);
        Self {
            nodes,
            failing: HashSet::new(),
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(784_111_777),
        }
    }

    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.insert_dirs(&normalize(path.as_ref()));
        self
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) -> Self {
        let path = normalize(path.as_ref());
        if let Some(parent) = path.parent() {
            self.insert_dirs(parent);
        }
        self.nodes.insert(
            path,
            Node::File {
                data: data.into(),
                modified: self.modified,
            },
        );
        self
    }

    /// Make every `open` of `path` fail.
    pub fn fail_reads(mut self, path: impl AsRef<Path>) -> Self {
        self.failing.insert(normalize(path.as_ref()));
        self
    }

    fn insert_dirs(&mut self, path: &Path) {
        for ancestor in path.ancestors() {
            self.nodes
                .entry(ancestor.to_path_buf())
                .or_insert(Node::Dir);
        }
    }

    fn node(&self, path: &Path) -> io::Result<&Node> {
        self.nodes
            .get(&normalize(path))
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl Vfs for MemoryFs {
    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata> {
        Ok(match self.node(path)? {
            Node::File { data, modified } => EntryMetadata {
                kind: EntryKind::File,
                len: data.len() as u64,
                modified: Some(*modified),
            },
            Node::Dir => EntryMetadata {
                kind: EntryKind::Directory,
                len: 0,
                modified: Some(self.modified),
            },
        })
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let dir = normalize(path);
        if !matches!(self.node(&dir)?, Node::Dir) {
            return Err(io::Error::new(io::ErrorKind::Other, "not a directory"));
        }
        Ok(self
            .nodes
            .keys()
            .filter(|p| p.parent() == Some(dir.as_path()))
            .filter_map(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect())
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek>> {
        let path = normalize(path);
        if self.failing.contains(&path) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("injected read failure: {}", path.display()),
            ));
        }
        match self.node(&path)? {
            Node::File { data, .. } => Ok(Box::new(Cursor::new(data.clone()))),
            Node::Dir => Err(io::Error::new(io::ErrorKind::Other, "is a directory")),
        }
    }

    fn walk_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let dir = normalize(dir);
        self.node(&dir)?;
        Ok(self
            .nodes
            .iter()
            .filter(|(p, node)| matches!(node, Node::File { .. }) && p.starts_with(&dir) && **p != dir)
            .map(|(p, _)| p.clone())
            .collect())
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        let path = normalize(path);
        self.node(&path)?;
        Ok(path)
    }
}
