use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::Target;
use super::version::{VersionConstraint, parse_version};
use crate::error::SyncError;
use crate::runtime::Runtime;

pub const ARCHIVE_EXTENSION: &str = "zip";

/// A named, versioned set of targets shipped as one archive.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Package {
    pub name: String,
    #[serde(rename = "ver")]
    pub version: String,
    #[serde(default)]
    pub targets: Vec<Target>,
}

impl Package {
    /// `<name>_v<version>.zip`
    pub fn archive_name(&self) -> String {
        archive_name(&self.name, &self.version)
    }

    /// Load and validate a package spec file (input to `create`).
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        Self::from_json(&content, path)
    }

    pub fn from_json(content: &str, origin: &Path) -> Result<Self> {
        let package: Package = serde_json::from_str(content)
            .map_err(|e| SyncError::config(origin, e.to_string()))?;
        package.validate_identity(origin)?;

        if parse_version(&package.version).is_err() {
            return Err(SyncError::config(
                origin,
                format!("version '{}' of '{}' is not a number", package.version, package.name),
            )
            .into());
        }
        if package.targets.is_empty() {
            return Err(
                SyncError::config(origin, format!("package '{}' has no targets", package.name))
                    .into(),
            );
        }
        if let Some(idx) = package
            .targets
            .iter()
            .position(|t| t.path.as_os_str().is_empty())
        {
            return Err(SyncError::config(origin, format!("target #{} has an empty path", idx)).into());
        }

        Ok(package)
    }

    fn validate_identity(&self, origin: &Path) -> Result<(), SyncError> {
        if self.name.trim().is_empty() {
            return Err(SyncError::config(origin, "package name is empty"));
        }
        if self.name.contains(['/', '\\']) {
            return Err(SyncError::config(
                origin,
                format!("package name '{}' contains a path separator", self.name),
            ));
        }
        // the name becomes the extraction directory under the download dir
        if matches!(self.name.trim(), "." | "..") {
            return Err(SyncError::config(
                origin,
                format!("package name '{}' is not a directory name", self.name),
            ));
        }
        Ok(())
    }

    /// Parse this entry's `ver` field as a catalog constraint.
    pub fn constraint(&self) -> Result<VersionConstraint, SyncError> {
        VersionConstraint::parse(&self.version)
    }
}

/// Ordered batch of package requests (input to `update`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PackageCollection {
    pub packages: Vec<Package>,
}

impl PackageCollection {
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        Self::from_json(&content, path)
    }

    /// Each entry's `ver` must be a valid constraint. Targets are ignored.
    pub fn from_json(content: &str, origin: &Path) -> Result<Self> {
        let collection: PackageCollection = serde_json::from_str(content)
            .map_err(|e| SyncError::config(origin, e.to_string()))?;

        for package in &collection.packages {
            package.validate_identity(origin)?;
            package.constraint().map_err(|e| {
                SyncError::config(origin, format!("package '{}': {}", package.name, e))
            })?;
        }

        Ok(collection)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

pub fn archive_name(name: &str, version: &str) -> String {
    format!("{}_v{}.{}", name, version, ARCHIVE_EXTENSION)
}
