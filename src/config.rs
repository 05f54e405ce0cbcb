//! Runtime configuration: where the remote catalog lives and where downloads land.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SyncError;
use crate::runtime::Runtime;

pub const CONFIG_ENV: &str = "PACKSYNC_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// Local mount point of the remote host's file tree.
    pub remote_root: PathBuf,
    /// Catalog directory, relative to `remote_root`.
    pub packets_path: String,
    /// Download directory relative to the working directory. Defaults to `packets_path`.
    #[serde(default)]
    pub local_packets_path: Option<PathBuf>,
}

impl Config {
    /// Load from an explicit path, or search the default locations.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => Self::locate(runtime)?,
        };
        debug!("Loading configuration from {:?}", path);

        let content = runtime
            .read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_json(&content, &path)
    }

    pub fn from_json(content: &str, origin: &Path) -> Result<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| SyncError::config(origin, e.to_string()))?;

        if config.remote_root.as_os_str().is_empty() {
            return Err(SyncError::config(origin, "remote_root is empty").into());
        }
        if config.packets_path.trim().is_empty() {
            return Err(SyncError::config(origin, "packets_path is empty").into());
        }
        Ok(config)
    }

    /// `$PACKSYNC_CONFIG`, then `./config/config.json`, then the user config dir.
    fn locate<R: Runtime>(runtime: &R) -> Result<PathBuf> {
        if let Ok(path) = runtime.env_var(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }

        let local = runtime.current_dir()?.join(DEFAULT_CONFIG_PATH);
        if runtime.exists(&local) {
            return Ok(local);
        }

        if let Some(user) = runtime.config_dir().map(|d| d.join("packsync/config.json"))
            && runtime.exists(&user)
        {
            return Ok(user);
        }

        // Report the conventional location when nothing exists
        Ok(local)
    }

    /// Absolute download directory for the given working directory.
    pub fn local_packets_dir(&self, cwd: &Path) -> PathBuf {
        match &self.local_packets_path {
            Some(path) => cwd.join(path),
            None => cwd.join(&self.packets_path),
        }
    }
}
