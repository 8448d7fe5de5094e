//! Per-request staging directory.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const STAGING_PREFIX: &str = "ziptmp_";

/// A freshly created temporary directory that is removed when dropped.
///
/// Holding the guard keeps the directory alive; every exit path (error,
/// finished stream, client disconnect) ends with the drop.
#[derive(Debug)]
pub struct StagingDir {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl StagingDir {
    pub fn create(parent: &Path) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(parent)?;
        // Walked paths are canonical; the staging path must be too for the
        // self-exclusion check in the builder.
        let path = dir
            .path()
            .canonicalize()
            .unwrap_or_else(|_| dir.path().to_path_buf());
        tracing::debug!(path = %path.display(), "staging directory created");
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => tracing::debug!(path = %self.path.display(), "staging directory removed"),
                Err(e) => tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to remove staging directory"
                ),
            }
        }
    }
}
