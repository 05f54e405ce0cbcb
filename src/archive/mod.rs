mod builder;
mod zip;

use crate::runtime::Runtime;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub use builder::ZipArchiveWriter;
pub use zip::ZipExtractor;

/// Sink for resolved target paths, producing one package archive.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveWriter {
    /// Local path of the archive being written
    fn path(&self) -> PathBuf;

    /// Add one target's resolved paths. Each call is a separate session:
    /// the first directory in `files` roots the entry names for that call.
    fn add_entries(&mut self, files: &[PathBuf]) -> Result<()>;

    /// Write the central directory. The archive is unreadable until this succeeds.
    fn finish(&mut self) -> Result<()>;
}

/// Trait for format-specific archive extractors
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor: Send + Sync {
    /// Extract the archive into the specified directory
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()>;
}
