use crate::error::SyncError;
use crate::runtime::Runtime;
use crate::runtime::path::{is_strictly_under, normalize_path};
use anyhow::{Context, Result};
use log::{debug, info};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use super::ArchiveExtractor;

/// Extractor for .zip archives
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    #[tracing::instrument(skip(self, runtime))]
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        debug!("Extracting zip archive {:?} to {:?}...", archive_path, extract_to);
        let mut reader = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;

        // zip requires Read + Seek, Runtime::open only gives Read
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read archive {:?}", archive_path))?;
        let mut archive = ZipArchive::new(std::io::Cursor::new(buffer))
            .with_context(|| format!("Failed to parse ZIP archive {:?}", archive_path))?;

        let root = normalize_path(extract_to);

        // Reject the whole archive before anything touches the disk
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        for name in &names {
            destination(&root, name)?;
        }

        runtime.create_dir_all(&root)?;

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .with_context(|| format!("Failed to read ZIP entry {}", i))?;
            let full_path = destination(&root, entry.name())?;

            if entry.is_dir() {
                runtime.create_dir_all(&full_path)?;
                continue;
            }

            if let Some(parent) = full_path.parent() {
                runtime.create_dir_all(parent)?;
            }
            {
                let mut dest_file = runtime.create_file(&full_path)?;
                std::io::copy(&mut entry, &mut dest_file)
                    .with_context(|| format!("Failed to extract file {:?}", full_path))?;
                dest_file
                    .flush()
                    .with_context(|| format!("Failed to flush {:?}", full_path))?;
            }

            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode()
                && let Err(e) = runtime.set_permissions(&full_path, mode & 0o7777)
            {
                debug!("Failed to set permissions on {:?}: {}", full_path, e);
            }
        }

        info!("Extracted {} entries into {:?}", names.len(), root);
        Ok(())
    }
}

/// Joined destination for an entry, which must lie strictly inside `root`.
fn destination(root: &Path, entry_name: &str) -> Result<PathBuf, SyncError> {
    let joined = normalize_path(&root.join(entry_name));
    if !is_strictly_under(&joined, root) {
        return Err(SyncError::PathTraversal {
            entry: entry_name.to_string(),
        });
    }
    Ok(joined)
}
