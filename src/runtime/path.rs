//! Path utility functions for normalization, containment and archive naming.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by processing `.` and `..` components lexically.
/// This does not access the filesystem and does not follow symlinks.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `/..` stays at `/`, a relative path keeps its leading `..`
                if !result.pop() && !result.has_root() {
                    result.push(component);
                }
            }
            _ => result.push(component),
        }
    }
    result
}

/// Check if a path is under a given directory by comparing normalized path components.
/// Returns true if `dir` is a component-wise prefix of `path` (equal paths included).
///
/// # Security
/// Both sides are normalized first, so `/srv/out/../../etc/passwd` is NOT under `/srv/out`.
pub fn is_path_under(path: &Path, dir: &Path) -> bool {
    let normalized_path = normalize_path(path);
    let normalized_dir = normalize_path(dir);

    let path_components: Vec<_> = normalized_path.components().collect();
    let dir_components: Vec<_> = normalized_dir.components().collect();

    if path_components.len() < dir_components.len() {
        return false;
    }

    dir_components
        .iter()
        .zip(path_components.iter())
        .all(|(d, p)| d == p)
}

/// Like [`is_path_under`], but `path` must be a proper descendant of `dir`.
pub fn is_strictly_under(path: &Path, dir: &Path) -> bool {
    is_path_under(path, dir) && normalize_path(path) != normalize_path(dir)
}

/// Make `path` absolute against `base` and normalize it lexically.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

/// Join path components with `/`, the separator zip entry names use on every platform.
pub fn to_entry_name(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
