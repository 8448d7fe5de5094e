//! Filesystem access subsystem.
//!
//! # Data Flow
//! ```text
//! client path string (?path=...)
//!     → resolver.rs (strip, join, normalize, segment-wise containment)
//!     → absolute path inside the root
//!     → fs.rs / memory.rs (metadata, read_dir, open, walk_files)
//! ```
//!
//! # Design Decisions
//! - Handlers never touch `std::fs` directly; everything goes through `Vfs`
//! - `LocalFs` serves the real disk, `MemoryFs` is the test double
//! - The root is canonicalized once at startup and never changes

pub mod fs;
pub mod memory;
pub mod resolver;

use thiserror::Error;

pub use fs::{EntryKind, EntryMetadata, LocalFs, ReadSeek, Vfs};
pub use memory::MemoryFs;
pub use resolver::Root;

/// Errors raised while resolving or touching paths under the root.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested path leaves the root.
    #[error("unsafe path")]
    UnsafePath,

    #[error("not a directory")]
    NotADirectory,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
