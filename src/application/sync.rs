use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::archive::{ArchiveExtractor, ArchiveWriter};
use crate::package::{Package, PackageCollection, TargetResolver};
use crate::remote::Transport;
use crate::runtime::Runtime;

/// Outcome of an update batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub requested: usize,
    /// Package names that were downloaded and extracted, in request order
    pub updated: Vec<String>,
    /// Package names with no satisfying catalog entry
    pub missing: Vec<String>,
}

impl UpdateSummary {
    pub fn succeeded(&self) -> usize {
        self.updated.len()
    }
}

/// Drives package creation and batch updates against one catalog.
pub struct SyncManager<'a, R: Runtime, T: Transport, E: ArchiveExtractor> {
    runtime: &'a R,
    transport: T,
    extractor: E,
    cwd: PathBuf,
}

impl<'a, R: Runtime + 'static, T: Transport, E: ArchiveExtractor> SyncManager<'a, R, T, E> {
    /// `cwd` anchors relative target paths.
    pub fn new(runtime: &'a R, transport: T, extractor: E, cwd: PathBuf) -> Self {
        Self {
            runtime,
            transport,
            extractor,
            cwd,
        }
    }

    /// Archive every target of `package` into `writer`, then upload the result.
    /// Returns the local archive path.
    #[tracing::instrument(skip(self, package, writer), fields(package = %package.name, version = %package.version))]
    pub fn create_packet<W: ArchiveWriter>(
        &self,
        package: &Package,
        writer: &mut W,
    ) -> Result<PathBuf> {
        let archive = writer.path();
        info!("Creating {:?} from {} target(s)", archive, package.targets.len());

        for target in &package.targets {
            let files = TargetResolver::new(target, &self.cwd)
                .resolve()
                .with_context(|| format!("Failed to resolve target {:?}", target.path))?;
            debug!("Target {:?} resolved to {} path(s)", target.path, files.len());

            writer
                .add_entries(&files)
                .with_context(|| format!("Failed to archive target {:?}", target.path))?;
        }
        writer
            .finish()
            .with_context(|| format!("Failed to close archive {:?}", archive))?;

        self.transport
            .upload(&archive)
            .with_context(|| format!("Failed to upload {:?}", archive))?;

        info!("Package {} {} published", package.name, package.version);
        Ok(archive)
    }

    /// Download and extract every package in the collection.
    ///
    /// A package without a satisfying catalog entry is recorded as missing and
    /// skipped. Any other failure aborts the rest of the batch.
    #[tracing::instrument(skip(self, collection), fields(count = collection.len()))]
    pub fn update_packets(&self, collection: &PackageCollection) -> Result<UpdateSummary> {
        let mut summary = UpdateSummary {
            requested: collection.len(),
            ..Default::default()
        };

        for package in &collection.packages {
            let found = self
                .transport
                .download(&package.name, &package.version)
                .with_context(|| format!("Failed to download package {}", package.name))?;

            let Some(archive) = found else {
                info!(
                    "No catalog entry for {} matching '{}', skipping",
                    package.name, package.version
                );
                summary.missing.push(package.name.clone());
                continue;
            };

            let dest = extraction_dir(&archive, &package.name, &self.cwd);
            self.extractor
                .extract(self.runtime, &archive, &dest)
                .with_context(|| format!("Failed to extract {:?} into {:?}", archive, dest))?;

            debug!("Package {} extracted into {:?}", package.name, dest);
            summary.updated.push(package.name.clone());
        }

        info!(
            "Updated {}/{} packages",
            summary.succeeded(),
            summary.requested
        );
        Ok(summary)
    }
}

/// Sibling directory of the downloaded archive, named after the package.
fn extraction_dir(archive: &Path, name: &str, fallback: &Path) -> PathBuf {
    archive.parent().unwrap_or(fallback).join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{MockArchiveExtractor, MockArchiveWriter, ZipArchiveWriter, ZipExtractor};
    use crate::error::SyncError;
    use crate::package::Target;
    use crate::remote::MockTransport;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::Sequence;
    use mockall::predicate::eq;
    use std::fs;
    use tempfile::tempdir;

    fn package(name: &str, version: &str, targets: Vec<Target>) -> Package {
        Package {
            name: name.to_string(),
            version: version.to_string(),
            targets,
        }
    }

    fn collection(requests: &[(&str, &str)]) -> PackageCollection {
        PackageCollection {
            packages: requests
                .iter()
                .map(|(n, v)| package(n, v, Vec::new()))
                .collect(),
        }
    }

    #[test]
    fn test_create_packet_sequence() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let docs = dir.path().join("docs");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&docs).unwrap();
        fs::write(src.join("main.go"), "package main").unwrap();
        fs::write(docs.join("guide.md"), "# guide").unwrap();

        let archive = dir.path().join("app_v1.0.zip");
        let mut seq = Sequence::new();
        let mut writer = MockArchiveWriter::new();
        let archive_path = archive.clone();
        writer.expect_path().returning(move || archive_path.clone());

        let first = src.clone();
        writer
            .expect_add_entries()
            .withf(move |files| files.first() == Some(&first))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        let second = docs.clone();
        writer
            .expect_add_entries()
            .withf(move |files| files.first() == Some(&second))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        writer
            .expect_finish()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));

        let mut transport = MockTransport::new();
        transport
            .expect_upload()
            .with(eq(archive.clone()))
            .times(1)
            .returning(|_| Ok(42));

        let runtime = MockRuntime::new();
        let manager = SyncManager::new(
            &runtime,
            transport,
            MockArchiveExtractor::new(),
            dir.path().to_path_buf(),
        );
        let pkg = package(
            "app",
            "1.0",
            vec![Target::new("src", ""), Target::new("docs", "")],
        );

        assert_eq!(manager.create_packet(&pkg, &mut writer).unwrap(), archive);
    }

    #[test]
    fn test_create_packet_does_not_upload_after_resolve_failure() {
        let dir = tempdir().unwrap();
        let mut writer = MockArchiveWriter::new();
        writer
            .expect_path()
            .returning(|| PathBuf::from("/tmp/app_v1.0.zip"));
        writer.expect_add_entries().never();
        writer.expect_finish().never();

        let mut transport = MockTransport::new();
        transport.expect_upload().never();

        let runtime = MockRuntime::new();
        let manager = SyncManager::new(
            &runtime,
            transport,
            MockArchiveExtractor::new(),
            dir.path().to_path_buf(),
        );
        let pkg = package("app", "1.0", vec![Target::new("missing/deeper", "")]);

        let err = manager.create_packet(&pkg, &mut writer).unwrap_err();
        assert!(err.to_string().contains("Failed to resolve target"));
    }

    #[test]
    fn test_create_packet_upload_failure_propagates() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();

        let mut writer = MockArchiveWriter::new();
        writer
            .expect_path()
            .returning(|| PathBuf::from("/tmp/app_v1.0.zip"));
        writer.expect_add_entries().returning(|_| Ok(()));
        writer.expect_finish().returning(|| Ok(()));

        let mut transport = MockTransport::new();
        transport.expect_upload().returning(|_| {
            Err(SyncError::ZeroBytesWritten {
                path: "packages/app_v1.0.zip".into(),
            }
            .into())
        });

        let runtime = MockRuntime::new();
        let manager = SyncManager::new(
            &runtime,
            transport,
            MockArchiveExtractor::new(),
            dir.path().to_path_buf(),
        );
        let pkg = package("app", "1.0", vec![Target::new("src", "")]);

        let err = manager.create_packet(&pkg, &mut writer).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::ZeroBytesWritten { .. })
        ));
    }

    #[test_log::test]
    fn test_update_packets_records_misses() {
        let mut transport = MockTransport::new();
        transport
            .expect_download()
            .with(eq("app"), eq(">=1.0"))
            .returning(|_, _| Ok(Some(PathBuf::from("/work/packages/app_v1.2.zip"))));
        transport
            .expect_download()
            .with(eq("ghost"), eq(""))
            .returning(|_, _| Ok(None));
        transport
            .expect_download()
            .with(eq("lib"), eq("<=2.0"))
            .returning(|_, _| Ok(Some(PathBuf::from("/work/packages/lib_v2.0.zip"))));

        let mut extractor = MockArchiveExtractor::new();
        extractor
            .expect_extract::<MockRuntime>()
            .withf(|_, archive, dest| {
                archive.to_path_buf() == PathBuf::from("/work/packages/app_v1.2.zip")
                    && dest.to_path_buf() == PathBuf::from("/work/packages/app")
            })
            .times(1)
            .returning(|_: &MockRuntime, _, _| Ok(()));
        extractor
            .expect_extract::<MockRuntime>()
            .withf(|_, archive, dest| {
                archive.to_path_buf() == PathBuf::from("/work/packages/lib_v2.0.zip")
                    && dest.to_path_buf() == PathBuf::from("/work/packages/lib")
            })
            .times(1)
            .returning(|_: &MockRuntime, _, _| Ok(()));

        let runtime = MockRuntime::new();
        let manager = SyncManager::new(&runtime, transport, extractor, PathBuf::from("/work"));

        let summary = manager
            .update_packets(&collection(&[("app", ">=1.0"), ("ghost", ""), ("lib", "<=2.0")]))
            .unwrap();
        assert_eq!(
            summary,
            UpdateSummary {
                requested: 3,
                updated: vec!["app".to_string(), "lib".to_string()],
                missing: vec!["ghost".to_string()],
            }
        );
        assert_eq!(summary.succeeded(), 2);
    }

    #[test]
    fn test_update_packets_transfer_error_aborts_batch() {
        let mut transport = MockTransport::new();
        transport
            .expect_download()
            .with(eq("first"), eq(""))
            .times(1)
            .returning(|_, _| Err(SyncError::Transfer("connection reset".into()).into()));
        transport
            .expect_download()
            .with(eq("second"), eq(""))
            .never();

        let mut extractor = MockArchiveExtractor::new();
        extractor.expect_extract::<MockRuntime>().never();

        let runtime = MockRuntime::new();
        let manager = SyncManager::new(&runtime, transport, extractor, PathBuf::from("/work"));

        let err = manager
            .update_packets(&collection(&[("first", ""), ("second", "")]))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to download package first"));
        assert!(err.downcast_ref::<SyncError>().is_some_and(SyncError::is_transfer));
    }

    #[test]
    fn test_update_packets_extract_error_aborts_batch() {
        let mut transport = MockTransport::new();
        transport
            .expect_download()
            .times(1)
            .returning(|_, _| Ok(Some(PathBuf::from("/work/packages/evil_v1.0.zip"))));

        let mut extractor = MockArchiveExtractor::new();
        extractor
            .expect_extract()
            .returning(|_: &MockRuntime, _, _| {
                Err(SyncError::PathTraversal {
                    entry: "../escape.txt".into(),
                }
                .into())
            });

        let runtime = MockRuntime::new();
        let manager = SyncManager::new(&runtime, transport, extractor, PathBuf::from("/work"));

        let err = manager
            .update_packets(&collection(&[("evil", ""), ("never", "")]))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::PathTraversal { .. })
        ));
    }

    #[test]
    fn test_empty_batch() {
        let runtime = MockRuntime::new();
        let manager = SyncManager::new(
            &runtime,
            MockTransport::new(),
            MockArchiveExtractor::new(),
            PathBuf::from("/work"),
        );

        let summary = manager.update_packets(&collection(&[])).unwrap();
        assert_eq!(summary.requested, 0);
        assert_eq!(summary.succeeded(), 0);
    }

    #[test]
    fn test_extraction_dir() {
        assert_eq!(
            extraction_dir(Path::new("/work/packages/app_v1.2.zip"), "app", Path::new("/work")),
            PathBuf::from("/work/packages/app")
        );
    }

    #[test_log::test]
    fn test_create_then_extract_with_real_components() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("proj/src");
        fs::create_dir_all(src.join("assets")).unwrap();
        fs::write(src.join("main.go"), "package main").unwrap();
        fs::write(src.join("notes.tmp"), "scratch").unwrap();
        fs::write(src.join("assets/logo.png"), "png").unwrap();

        let archive = dir.path().join("app_v1.0.zip");
        let mut transport = MockTransport::new();
        transport.expect_upload().returning(|_| Ok(1));

        let runtime = RealRuntime;
        let manager =
            SyncManager::new(&runtime, transport, ZipExtractor, dir.path().to_path_buf());
        let pkg = package("app", "1.0", vec![Target::new("proj/src", "*.tmp")]);

        let mut writer = ZipArchiveWriter::create(&runtime, &archive).unwrap();
        manager.create_packet(&pkg, &mut writer).unwrap();

        let out = dir.path().join("out");
        ZipExtractor.extract(&runtime, &archive, &out).unwrap();
        assert_eq!(fs::read_to_string(out.join("src/main.go")).unwrap(), "package main");
        assert_eq!(fs::read_to_string(out.join("src/assets/logo.png")).unwrap(), "png");
        assert!(!out.join("src/notes.tmp").exists());
    }
}
