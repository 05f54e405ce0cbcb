use anyhow::Result;
use std::path::{Path, PathBuf};

use super::Workspace;
use crate::application::SyncManager;
use crate::archive::ZipExtractor;
use crate::package::PackageCollection;
use crate::runtime::Runtime;
use crate::runtime::path::absolutize;

/// Download and extract every package requested in `packages_path`.
#[tracing::instrument(skip(runtime, config_path))]
pub fn update<R: Runtime + 'static>(
    runtime: R,
    config_path: Option<PathBuf>,
    packages_path: &Path,
) -> Result<()> {
    let workspace = Workspace::load(&runtime, config_path.as_deref())?;
    let collection =
        PackageCollection::load(&runtime, &absolutize(&workspace.cwd, packages_path))?;

    let manager = SyncManager::new(
        &runtime,
        workspace.catalog(&runtime),
        ZipExtractor,
        workspace.cwd.clone(),
    );
    let summary = manager.update_packets(&collection)?;

    for name in &summary.missing {
        eprintln!("No matching archive for {}", name);
    }
    println!(
        "Updated {}/{} packages.",
        summary.succeeded(),
        summary.requested
    );
    Ok(())
}
