//! Root directory and client path resolution.
//!
//! Containment is decided on path segments (`Path::starts_with`), never on
//! string prefixes: with a root of `/data`, the sibling `/data-other` is
//! outside the tree even though its string form starts with `/data`.

use std::io;
use std::path::{Component, Path, PathBuf};

use super::fs::Vfs;
use super::StorageError;

/// The single directory tree the gateway exposes.
#[derive(Debug, Clone)]
pub struct Root {
    path: PathBuf,
}

impl Root {
    /// Canonicalize `configured` and make sure it is a directory.
    pub fn open(fs: &dyn Vfs, configured: &Path) -> Result<Self, StorageError> {
        let path = fs.canonicalize(configured)?;
        if !fs.metadata(&path)?.is_dir() {
            return Err(StorageError::NotADirectory);
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name used for archives of the root itself.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "archive".to_string())
    }

    /// Resolve an untrusted client path to an absolute path inside the root.
    ///
    /// Leading slashes are stripped, so `/a/b` and `a/b` are the same request.
    /// `..` segments are applied lexically and must not climb above the root.
    /// Existing targets are also canonicalized through `fs`, which rejects
    /// symlinks that lead out of the tree. Missing targets resolve normally
    /// so callers can answer "not found".
    pub fn safe_path(&self, fs: &dyn Vfs, requested: &str) -> Result<PathBuf, StorageError> {
        // No filesystem accepts NUL inside a path.
        if requested.contains('\0') {
            tracing::debug!(requested, "path contains NUL");
            return Err(StorageError::UnsafePath);
        }

        let joined = self.path.join(requested.trim_start_matches('/'));
        let normalized = normalize(&joined);
        if !normalized.starts_with(&self.path) {
            tracing::debug!(requested, "path escapes root");
            return Err(StorageError::UnsafePath);
        }

        match fs.canonicalize(&normalized) {
            Ok(real) if real.starts_with(&self.path) => Ok(normalized),
            Ok(real) => {
                tracing::debug!(requested, target = %real.display(), "symlink escapes root");
                Err(StorageError::UnsafePath)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(normalized),
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Err(StorageError::UnsafePath),
            Err(e) => Err(e.into()),
        }
    }

    /// Root-relative form of `path` with `/` separators. The root itself is `.`.
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.path).unwrap_or(path);
        let parts: Vec<_> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if parts.is_empty() {
            ".".to_string()
        } else {
            parts.join("/")
        }
    }
}

/// Lexically normalize a path: drop `.`, apply `..` against the preceding
/// segment. `..` at the filesystem root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LocalFs, MemoryFs};

    fn memory_root() -> (MemoryFs, Root) {
        let fs = MemoryFs::new()
            .with_file("/data/docs/readme.md", "hi")
            .with_file("/data-other/secret.txt", "nope")
            .with_dir("/data/empty");
        let root = Root::open(&fs, Path::new("/data")).unwrap();
        (fs, root)
    }

    #[test]
    fn escaping_paths_are_unsafe() {
        let (fs, root) = memory_root();
        for requested in [
            "..",
            "../",
            "../etc/passwd",
            "docs/../../etc",
            "docs/../../../../..",
            "/../data-other/secret.txt",
            "./../data-other",
        ] {
            assert!(
                matches!(root.safe_path(&fs, requested), Err(StorageError::UnsafePath)),
                "{requested} should be rejected"
            );
        }
    }

    #[test]
    fn nul_bytes_are_unsafe() {
        let (fs, root) = memory_root();
        for requested in ["\0", "docs/readme.md\0", "x\0y"] {
            assert!(matches!(
                root.safe_path(&fs, requested),
                Err(StorageError::UnsafePath)
            ));
        }

        let served = tempfile::tempdir().unwrap();
        let root = Root::open(&LocalFs, served.path()).unwrap();
        assert!(matches!(
            root.safe_path(&LocalFs, "a.txt\0"),
            Err(StorageError::UnsafePath)
        ));
    }

    #[test]
    fn sibling_sharing_string_prefix_is_outside() {
        let (fs, root) = memory_root();
        let err = root.safe_path(&fs, "../data-other/secret.txt").unwrap_err();
        assert!(matches!(err, StorageError::UnsafePath));
    }

    #[test]
    fn valid_paths_are_segment_descendants() {
        let (fs, root) = memory_root();
        for (requested, expected) in [
            ("", "/data"),
            ("/", "/data"),
            ("docs", "/data/docs"),
            ("/docs/readme.md", "/data/docs/readme.md"),
            ("//docs/./readme.md", "/data/docs/readme.md"),
            ("docs/../empty", "/data/empty"),
            ("missing/file", "/data/missing/file"),
        ] {
            let resolved = root.safe_path(&fs, requested).unwrap();
            assert_eq!(resolved, PathBuf::from(expected));
            assert!(resolved.starts_with(root.path()));
        }
    }

    #[test]
    fn relative_uses_forward_slashes() {
        let (_fs, root) = memory_root();
        assert_eq!(root.relative(Path::new("/data")), ".");
        assert_eq!(root.relative(Path::new("/data/docs/readme.md")), "docs/readme.md");
        assert_eq!(root.name(), "data");
    }

    #[test]
    fn open_rejects_file_roots() {
        let fs = MemoryFs::new().with_file("/data.txt", "x");
        assert!(matches!(
            Root::open(&fs, Path::new("/data.txt")),
            Err(StorageError::NotADirectory)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_out_of_root_is_unsafe() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret"), b"s").unwrap();
        let served = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), served.path().join("escape")).unwrap();

        let root = Root::open(&LocalFs, served.path()).unwrap();
        assert!(matches!(
            root.safe_path(&LocalFs, "escape/secret"),
            Err(StorageError::UnsafePath)
        ));
    }
}
