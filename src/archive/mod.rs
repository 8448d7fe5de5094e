//! Archive-on-demand subsystem.
//!
//! # Lifecycle
//! ```text
//! create staging dir (ziptmp_*) → populate archive.zip → stream → delete
//! ```
//!
//! The staging guard is owned by the response body pump, so the directory
//! disappears after the last byte is sent, when the client disconnects, or
//! immediately if the build fails.

pub mod builder;
pub mod staging;

pub use builder::{build_archive, ArchiveError, ArchiveOptions, StagedArchive, ARCHIVE_FILE_NAME};
pub use staging::StagingDir;
