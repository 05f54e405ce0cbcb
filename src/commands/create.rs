use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use super::Workspace;
use crate::application::SyncManager;
use crate::archive::{ZipArchiveWriter, ZipExtractor};
use crate::package::Package;
use crate::runtime::Runtime;
use crate::runtime::path::absolutize;

/// Build `<name>_v<ver>.zip` in the working directory and publish it.
#[tracing::instrument(skip(runtime, config_path))]
pub fn create<R: Runtime + 'static>(
    runtime: R,
    config_path: Option<PathBuf>,
    spec_path: &Path,
) -> Result<()> {
    let workspace = Workspace::load(&runtime, config_path.as_deref())?;
    let package = Package::load(&runtime, &absolutize(&workspace.cwd, spec_path))?;
    debug!("Loaded package {} {}", package.name, package.version);

    let manager = SyncManager::new(
        &runtime,
        workspace.catalog(&runtime),
        ZipExtractor,
        workspace.cwd.clone(),
    );
    let mut writer =
        ZipArchiveWriter::create(&runtime, &workspace.cwd.join(package.archive_name()))?;
    let archive = manager.create_packet(&package, &mut writer)?;

    println!("Published {}", archive.display());
    Ok(())
}
