//! Zip construction for directory downloads.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::staging::StagingDir;
use crate::config::ArchiveConfig;
use crate::storage::Vfs;

pub const ARCHIVE_FILE_NAME: &str = "archive.zip";

/// Entries at or above this size need zip64 headers.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// Errors that abort an archive build. The staging directory is already
/// gone by the time the caller sees one of these.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to create staging directory: {0}")]
    Staging(#[source] io::Error),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Where and how archives are built.
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    pub staging_parent: PathBuf,
    pub compression_level: Option<i64>,
}

impl From<&ArchiveConfig> for ArchiveOptions {
    fn from(config: &ArchiveConfig) -> Self {
        Self {
            staging_parent: config.staging_parent(),
            compression_level: config.compression_level,
        }
    }
}

/// A finished zip sitting in its staging directory.
#[derive(Debug)]
pub struct StagedArchive {
    staging: StagingDir,
    path: PathBuf,
    len: u64,
    entries: usize,
}

impl StagedArchive {
    pub fn open(&self) -> io::Result<File> {
        File::open(&self.path)
    }

    pub fn byte_len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn staging_path(&self) -> &Path {
        self.staging.path()
    }
}

/// Zip every regular file under `source` into a new staging directory.
///
/// Entry names are relative to `source` and use `/` separators.
pub fn build_archive(
    fs: &dyn Vfs,
    source: &Path,
    options: &ArchiveOptions,
) -> Result<StagedArchive, ArchiveError> {
    let staging = StagingDir::create(&options.staging_parent).map_err(ArchiveError::Staging)?;
    let path = staging.path().join(ARCHIVE_FILE_NAME);

    let mut zip = ZipWriter::new(BufWriter::new(File::create(&path)?));

    let mut entries = 0;
    for file in fs.walk_files(source)? {
        // The staging area may live inside the served tree.
        if file.starts_with(staging.path()) {
            continue;
        }

        let read_err = |source: io::Error| ArchiveError::Read {
            path: file.clone(),
            source,
        };
        let meta = fs.metadata(&file).map_err(read_err)?;
        let mut reader = fs.open(&file).map_err(read_err)?;

        zip.start_file(
            entry_name(source, &file),
            entry_options(options.compression_level, meta.len),
        )?;
        io::copy(&mut reader, &mut zip).map_err(read_err)?;
        entries += 1;
    }

    let mut writer = zip.finish()?;
    writer.flush()?;
    let len = writer.get_ref().metadata()?.len();
    drop(writer);

    tracing::debug!(
        source = %source.display(),
        entries,
        bytes = len,
        "archive built"
    );

    Ok(StagedArchive {
        staging,
        path,
        len,
        entries,
    })
}

/// Level 0 means "no compression", which deflate does not accept; such
/// entries are stored instead.
fn entry_options(level: Option<i64>, len: u64) -> SimpleFileOptions {
    let options = match level {
        Some(0) => SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
        level => SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(level),
    };
    options.large_file(len >= ZIP64_THRESHOLD)
}

fn entry_name(base: &Path, file: &Path) -> String {
    file.strip_prefix(base)
        .unwrap_or(file)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
