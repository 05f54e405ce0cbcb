use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use super::Workspace;
use crate::remote::{CatalogEntry, Transport};
use crate::runtime::Runtime;

/// Print every catalog entry as `name version file`.
#[tracing::instrument(skip(runtime, config_path))]
pub fn list<R: Runtime>(runtime: R, config_path: Option<PathBuf>) -> Result<()> {
    let entries = list_entries(&runtime, config_path.as_deref())?;
    if entries.is_empty() {
        println!("No packages in catalog.");
        return Ok(());
    }

    for entry in entries {
        println!("{}", format_entry(&entry));
    }
    Ok(())
}

pub fn list_entries<R: Runtime>(
    runtime: &R,
    config_path: Option<&Path>,
) -> Result<Vec<CatalogEntry>> {
    let workspace = Workspace::load(runtime, config_path)?;
    let entries = workspace.catalog(runtime).list()?;
    debug!("Catalog holds {} package archive(s)", entries.len());
    Ok(entries)
}

fn format_entry(entry: &CatalogEntry) -> String {
    format!("{} {} {}", entry.name, entry.version, entry.file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    #[test]
    fn test_format_entry() {
        let entry = CatalogEntry::parse("app_v1.2.zip").unwrap();
        assert_eq!(format_entry(&entry), "app 1.2 app_v1.2.zip");
    }

    #[test]
    fn test_list_entries_reads_catalog_directory() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_current_dir()
            .returning(|| Ok(PathBuf::from("/work")));
        runtime
            .expect_read_to_string()
            .with(eq(PathBuf::from("/work/packsync.json")))
            .returning(|_| {
                Ok(r#"{"remote_root": "/mnt/host", "packets_path": "packages"}"#.to_string())
            });
        runtime
            .expect_read_dir()
            .with(eq(PathBuf::from("/mnt/host/packages")))
            .returning(|_| {
                Ok(vec![
                    PathBuf::from("/mnt/host/packages/app_v1.0.zip"),
                    PathBuf::from("/mnt/host/packages/archive"),
                    PathBuf::from("/mnt/host/packages/README"),
                ])
            });
        runtime
            .expect_is_dir()
            .returning(|p| p.ends_with("archive"));

        let entries = list_entries(&runtime, Some(Path::new("packsync.json"))).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "app");
        assert_eq!(entries[0].version, "1.0");
    }

    #[test]
    fn test_list_entries_missing_config() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_current_dir()
            .returning(|| Ok(PathBuf::from("/work")));
        runtime
            .expect_read_to_string()
            .returning(|_| Err(anyhow::anyhow!("No such file or directory")));

        let err = list_entries(&runtime, Some(Path::new("/etc/none.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
