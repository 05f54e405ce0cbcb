//! Remote side of the package catalog.
//!
//! The authenticated session to the package host is set up outside this
//! crate. What reaches us is a file tree (`RemoteFs`): list a directory, read
//! a file, create a file. `MountedRemote` serves that tree from a local mount
//! point such as an SSHFS or NFS mount of the host.

mod catalog;

use anyhow::Result;
use log::debug;
use std::io::{Read, Write};
use std::path::PathBuf;

use crate::error::SyncError;
use crate::runtime::Runtime;
use crate::runtime::path::{is_path_under, normalize_path};

pub use catalog::{Catalog, CatalogEntry, Transport};

#[cfg(test)]
pub use catalog::MockTransport;

/// Byte-stream access to named remote paths. Paths use `/` separators and are
/// relative to the remote root.
#[cfg_attr(test, mockall::automock)]
pub trait RemoteFs: Send + Sync {
    /// File names inside a remote directory (directories are left out).
    fn list(&self, dir: &str) -> Result<Vec<String>>;
    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>>;
    fn create(&self, path: &str) -> Result<Box<dyn Write + Send>>;

    /// Where `path` lives on the local filesystem, if the tree is reachable locally.
    fn local_path(&self, path: &str) -> Option<PathBuf>;
}

/// Join remote path segments with `/`.
pub fn remote_join(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// A remote file tree exposed under a local mount point.
pub struct MountedRemote<'a, R: Runtime> {
    runtime: &'a R,
    root: PathBuf,
}

impl<'a, R: Runtime> MountedRemote<'a, R> {
    pub fn new(runtime: &'a R, root: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            root: normalize_path(&root.into()),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, SyncError> {
        let full = normalize_path(&self.root.join(path.trim_start_matches('/')));
        if !is_path_under(&full, &self.root) {
            return Err(SyncError::Transfer(format!(
                "remote path '{}' is outside {:?}",
                path, self.root
            )));
        }
        Ok(full)
    }
}

impl<R: Runtime> RemoteFs for MountedRemote<'_, R> {
    #[tracing::instrument(skip(self))]
    fn list(&self, dir: &str) -> Result<Vec<String>> {
        let full = self.resolve(dir)?;
        let entries = self.runtime.read_dir(&full).map_err(|e| {
            SyncError::Transfer(format!("cannot list remote directory '{}': {:#}", dir, e))
        })?;

        let names: Vec<String> = entries
            .iter()
            .filter(|p| !self.runtime.is_dir(p))
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        debug!("Remote directory '{}' holds {} file(s)", dir, names.len());
        Ok(names)
    }

    #[tracing::instrument(skip(self))]
    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        let full = self.resolve(path)?;
        let reader = self.runtime.open(&full).map_err(|e| {
            SyncError::Transfer(format!("cannot read remote file '{}': {:#}", path, e))
        })?;
        Ok(reader)
    }

    #[tracing::instrument(skip(self))]
    fn create(&self, path: &str) -> Result<Box<dyn Write + Send>> {
        let full = self.resolve(path)?;
        let writer = self.runtime.create_file(&full).map_err(|e| {
            SyncError::Transfer(format!("cannot create remote file '{}': {:#}", path, e))
        })?;
        Ok(writer)
    }

    fn local_path(&self, path: &str) -> Option<PathBuf> {
        self.resolve(path).ok()
    }
}
