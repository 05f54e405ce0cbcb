use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::ArchiveWriter;
use crate::error::SyncError;
use crate::runtime::path::{normalize_path, to_entry_name};
use crate::runtime::{FileStat, Runtime};

/// Writes resolved target paths into a zip archive.
pub struct ZipArchiveWriter<'a, R: Runtime, W: Write + Seek> {
    runtime: &'a R,
    path: PathBuf,
    /// Normalized `path`, never archived into itself
    own_path: PathBuf,
    zip: Option<ZipWriter<W>>,
    written: HashSet<String>,
}

impl<'a, R: Runtime> ZipArchiveWriter<'a, R, File> {
    /// Create (or truncate) the archive file at `path`.
    pub fn create(runtime: &'a R, path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| SyncError::io(path, e))?;
        Ok(Self::new(runtime, path.to_path_buf(), file))
    }
}

impl<'a, R: Runtime, W: Write + Seek> ZipArchiveWriter<'a, R, W> {
    pub fn new(runtime: &'a R, path: PathBuf, sink: W) -> Self {
        Self {
            runtime,
            own_path: normalize_path(&path),
            path,
            zip: Some(ZipWriter::new(sink)),
            written: HashSet::new(),
        }
    }

    fn zip(&mut self) -> Result<&mut ZipWriter<W>> {
        self.zip
            .as_mut()
            .ok_or_else(|| anyhow!("Archive {:?} is already finished", self.path))
    }

    fn add_directory(&mut self, name: &Path) -> Result<()> {
        let entry = to_entry_name(name);
        if entry.is_empty() {
            return Ok(());
        }
        let entry = format!("{}/", entry);
        if !self.written.insert(entry.clone()) {
            return Ok(());
        }

        debug!("Adding directory entry {}", entry);
        let options: FileOptions<()> =
            FileOptions::default().compression_method(CompressionMethod::Stored);
        self.zip()?
            .add_directory(entry.as_str(), options)
            .with_context(|| format!("Failed to add directory entry {}", entry))?;
        Ok(())
    }

    fn add_file(&mut self, source: &Path, name: &Path, stat: &FileStat) -> Result<()> {
        let entry = to_entry_name(name);
        if !self.written.insert(entry.clone()) {
            warn!("Skipping duplicate entry {} from {:?}", entry, source);
            return Ok(());
        }

        debug!("Adding {:?} as {}", source, entry);
        let mut input = self.runtime.open(source)?;
        let options: FileOptions<()> = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(stat.mode)
            .large_file(stat.len >= u32::MAX as u64);

        let zip = self.zip()?;
        zip.start_file(entry.as_str(), options)
            .with_context(|| format!("Failed to start entry {}", entry))?;
        std::io::copy(&mut input, zip)
            .with_context(|| format!("Failed to write {:?} into archive", source))?;
        Ok(())
    }
}

impl<R: Runtime, W: Write + Seek> ArchiveWriter for ZipArchiveWriter<'_, R, W> {
    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    #[tracing::instrument(skip(self, files), fields(archive = ?self.path, count = files.len()))]
    fn add_entries(&mut self, files: &[PathBuf]) -> Result<()> {
        let mut session = TargetSession::default();

        for path in files {
            if normalize_path(path) == self.own_path {
                debug!("Skipping {:?}, it is the archive being written", path);
                continue;
            }

            let stat = self.runtime.file_stat(path)?;
            if stat.is_dir {
                let name = session.directory_entry(path);
                self.add_directory(&name)?;
            } else {
                let name = session.file_entry(path);
                self.add_file(path, &name, &stat)?;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let zip = self
            .zip
            .take()
            .ok_or_else(|| anyhow!("Archive {:?} is already finished", self.path))?;
        let mut sink = zip
            .finish()
            .with_context(|| format!("Failed to finalize archive {:?}", self.path))?;
        sink.flush()
            .with_context(|| format!("Failed to flush archive {:?}", self.path))?;
        debug!("Finished archive {:?} with {} entries", self.path, self.written.len());
        Ok(())
    }
}

/// Naming state for one target's paths.
///
/// The first directory becomes the root; everything beneath it is stored as
/// `<root name>/<relative path>`.
#[derive(Default)]
struct TargetSession {
    root: Option<(PathBuf, PathBuf)>,
}

impl TargetSession {
    fn directory_entry(&mut self, dir: &Path) -> PathBuf {
        if self.root.is_none() {
            let prefix = base_name(dir);
            self.root = Some((dir.to_path_buf(), prefix.clone()));
            return prefix;
        }
        self.file_entry(dir)
    }

    fn file_entry(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some((root, prefix)) => match path.strip_prefix(root) {
                Ok(rel) => prefix.join(rel),
                Err(_) => base_name(path),
            },
            None => base_name(path),
        }
    }
}

fn base_name(path: &Path) -> PathBuf {
    path.file_name().map(PathBuf::from).unwrap_or_default()
}
