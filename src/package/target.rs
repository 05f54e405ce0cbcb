use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::ExcludeSet;
use crate::error::SyncError;
use crate::runtime::path::absolutize;

/// Exclude rule as written in a package document: one pattern or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExcludeRule {
    One(String),
    Many(Vec<String>),
}

impl Default for ExcludeRule {
    fn default() -> Self {
        ExcludeRule::One(String::new())
    }
}

impl ExcludeRule {
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            ExcludeRule::One(p) => vec![p.as_str()],
            ExcludeRule::Many(ps) => ps.iter().map(String::as_str).collect(),
        }
    }

    pub fn to_set(&self) -> ExcludeSet {
        ExcludeSet::from_patterns(self.patterns())
    }
}

/// A declared filesystem path plus the exclude rule applied to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub path: PathBuf,
    #[serde(default)]
    pub exclude: ExcludeRule,
}

impl Target {
    pub fn new(path: impl Into<PathBuf>, exclude: &str) -> Self {
        Self {
            path: path.into(),
            exclude: ExcludeRule::One(exclude.to_string()),
        }
    }
}

/// How a target is expanded, fixed once from the target path's extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveMode {
    /// Recursive walk, exclusions applied, directories listed.
    Directory,
    /// Flat listing of files sharing this extension. Exclusions are not consulted.
    SingleExtension(OsString),
}

/// Expands a [`Target`] into the ordered absolute paths to archive.
pub struct TargetResolver {
    path: PathBuf,
    excludes: ExcludeSet,
    mode: ResolveMode,
}

impl TargetResolver {
    /// Relative target paths are taken against `cwd`.
    pub fn new(target: &Target, cwd: &Path) -> Self {
        let path = absolutize(cwd, &target.path);
        // `.config` has no extension, so dotfiles resolve in directory mode
        let mode = match path.extension() {
            Some(ext) => ResolveMode::SingleExtension(ext.to_os_string()),
            None => ResolveMode::Directory,
        };

        Self {
            path,
            excludes: target.exclude.to_set(),
            mode,
        }
    }

    pub fn mode(&self) -> &ResolveMode {
        &self.mode
    }

    #[tracing::instrument(skip(self), fields(path = ?self.path))]
    pub fn resolve(&self) -> Result<Vec<PathBuf>> {
        let files = match &self.mode {
            ResolveMode::Directory => self.resolve_tree()?,
            ResolveMode::SingleExtension(ext) => self.resolve_extension(ext)?,
        };
        debug!("Resolved {} path(s) for {:?}", files.len(), self.path);
        Ok(files)
    }

    /// An existing directory is walked itself, anything else through its parent.
    fn walk_root(&self) -> PathBuf {
        if self.path.is_dir() {
            self.path.clone()
        } else {
            self.containing_dir()
        }
    }

    fn containing_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.path.clone())
    }

    fn resolve_tree(&self) -> Result<Vec<PathBuf>> {
        let root = self.walk_root();
        let walker = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.excludes.is_excluded(entry.path()));

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| walk_error(&root, e))?;
            files.push(entry.into_path());
        }
        Ok(files)
    }

    fn resolve_extension(&self, ext: &OsString) -> Result<Vec<PathBuf>> {
        let dir = self.containing_dir();
        let mut files = vec![dir.clone()];

        let listing = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in listing {
            let entry = entry.map_err(|e| walk_error(&dir, e))?;
            if entry.file_type().is_dir() {
                continue;
            }
            if entry.path().extension() == Some(ext.as_os_str()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

fn walk_error(root: &Path, err: walkdir::Error) -> anyhow::Error {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    SyncError::io(path, err.into()).into()
}
