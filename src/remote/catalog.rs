use anyhow::{Context, Result};
use log::{debug, info};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{RemoteFs, remote_join};
use crate::error::SyncError;
use crate::package::VersionConstraint;
use crate::runtime::Runtime;
use crate::runtime::path::normalize_path;

/// Moves package archives to and from the remote catalog.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Copy a local archive into the catalog under its own base name.
    /// Returns the number of bytes written.
    fn upload(&self, local_archive: &Path) -> Result<u64>;

    /// Fetch the first catalog entry named `name` whose version satisfies
    /// `constraint`. `Ok(None)` means nothing matched.
    fn download(&self, name: &str, constraint: &str) -> Result<Option<PathBuf>>;

    /// Every well-formed entry in the catalog, in listing order.
    fn list(&self) -> Result<Vec<CatalogEntry>>;
}

/// A catalog file name split into `<name>_v<version>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub file_name: String,
    pub name: String,
    pub version: String,
}

impl CatalogEntry {
    /// `None` for names that do not follow the convention.
    pub fn parse(file_name: &str) -> Option<Self> {
        let (name, rest) = file_name.rsplit_once("_v")?;
        if name.is_empty() {
            return None;
        }
        let version = rest.rsplit_once('.').map(|(v, _)| v).unwrap_or(rest);

        Some(Self {
            file_name: file_name.to_string(),
            name: name.to_string(),
            version: version.to_string(),
        })
    }
}

/// Catalog client over a remote file tree.
///
/// Uploads go to `<remote_dir>/<archive name>`. Downloads land in `local_dir`,
/// which is created on demand.
pub struct Catalog<'a, R: Runtime, F: RemoteFs> {
    runtime: &'a R,
    remote: F,
    remote_dir: String,
    local_dir: PathBuf,
}

impl<'a, R: Runtime, F: RemoteFs> Catalog<'a, R, F> {
    pub fn new(
        runtime: &'a R,
        remote: F,
        remote_dir: impl Into<String>,
        local_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runtime,
            remote,
            remote_dir: remote_dir.into(),
            local_dir: local_dir.into(),
        }
    }

    /// True when `remote_path` and `local` are the same file on disk. Copying
    /// would truncate the source before reading it.
    fn is_same_file(&self, remote_path: &str, local: &Path) -> bool {
        self.remote
            .local_path(remote_path)
            .is_some_and(|p| normalize_path(&p) == normalize_path(local))
    }

    fn fetch(&self, entry: &CatalogEntry) -> Result<PathBuf> {
        let remote_path = remote_join(&self.remote_dir, &entry.file_name);
        let local_path = self.local_dir.join(&entry.file_name);
        if self.is_same_file(&remote_path, &local_path) {
            info!("{} is already at {:?}, nothing to copy", remote_path, local_path);
            return Ok(local_path);
        }
        info!("Downloading {} to {:?}...", remote_path, local_path);

        self.runtime.create_dir_all(&self.local_dir)?;
        let mut reader = self.remote.open(&remote_path)?;
        {
            let mut local = self
                .runtime
                .create_file(&local_path)
                .with_context(|| format!("Failed to create local file {:?}", local_path))?;
            let bytes = std::io::copy(&mut reader, &mut local).map_err(|e| {
                SyncError::Transfer(format!("cannot copy '{}' to local: {}", remote_path, e))
            })?;
            local
                .flush()
                .with_context(|| format!("Failed to flush {:?}", local_path))?;
            debug!("Copied {} bytes from {}", bytes, remote_path);
        }
        self.runtime.sync_file(&local_path)?;

        Ok(local_path)
    }
}

impl<R: Runtime, F: RemoteFs> Transport for Catalog<'_, R, F> {
    #[tracing::instrument(skip(self))]
    fn upload(&self, local_archive: &Path) -> Result<u64> {
        let file_name = local_archive
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Archive path {:?} has no file name", local_archive))?
            .to_string_lossy()
            .into_owned();
        let remote_path = remote_join(&self.remote_dir, &file_name);

        let mut source = self
            .runtime
            .open(local_archive)
            .with_context(|| format!("Failed to open archive {:?}", local_archive))?;

        let bytes = if self.is_same_file(&remote_path, local_archive) {
            info!("{:?} is already in the catalog as {}", local_archive, remote_path);
            std::io::copy(&mut source, &mut std::io::sink())
                .with_context(|| format!("Failed to read archive {:?}", local_archive))?
        } else {
            info!("Uploading {:?} to {}...", local_archive, remote_path);
            let mut dest = self.remote.create(&remote_path)?;
            let bytes = std::io::copy(&mut source, &mut dest).map_err(|e| {
                SyncError::Transfer(format!("cannot write remote file '{}': {}", remote_path, e))
            })?;
            dest.flush().map_err(|e| {
                SyncError::Transfer(format!("cannot flush remote file '{}': {}", remote_path, e))
            })?;
            bytes
        };

        if bytes == 0 {
            return Err(SyncError::ZeroBytesWritten { path: remote_path }.into());
        }

        info!("Uploaded {} bytes to {}", bytes, remote_path);
        Ok(bytes)
    }

    #[tracing::instrument(skip(self))]
    fn download(&self, name: &str, constraint: &str) -> Result<Option<PathBuf>> {
        let constraint = VersionConstraint::parse(constraint)?;

        for entry in self.list()? {
            if entry.name != name {
                continue;
            }
            let matched = constraint.matches(&entry.version).with_context(|| {
                format!("Failed to compare catalog entry {}", entry.file_name)
            })?;
            if !matched {
                debug!("{} does not satisfy {}", entry.file_name, constraint);
                continue;
            }
            return self.fetch(&entry).map(Some);
        }

        debug!("No catalog entry for {} matching {}", name, constraint);
        Ok(None)
    }

    #[tracing::instrument(skip(self))]
    fn list(&self) -> Result<Vec<CatalogEntry>> {
        let names = self.remote.list(&self.remote_dir)?;
        Ok(names
            .iter()
            .filter_map(|n| CatalogEntry::parse(n))
            .collect())
    }
}
