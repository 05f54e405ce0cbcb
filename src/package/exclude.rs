use std::collections::HashSet;
use std::path::Path;

/// Set of exclusion keys for a single target.
///
/// A key is either a bare file name (`Makefile`, `notes.tmp`) or an
/// extension with its leading dot (`.log`), the latter coming from a
/// `*.log` pattern. Matching is exact, there is no further globbing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeSet {
    keys: HashSet<String>,
}

impl ExcludeSet {
    /// Build a set from a single pattern.
    pub fn parse(pattern: &str) -> Self {
        let mut set = Self::default();
        set.insert(pattern);
        set
    }

    /// Build a set from several patterns.
    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for pattern in patterns {
            set.insert(pattern.as_ref());
        }
        set
    }

    /// Add a pattern. `*<ext>` stores the extension, anything else is a file name.
    /// An empty pattern adds nothing.
    pub fn insert(&mut self, pattern: &str) {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return;
        }
        let key = wildcard_extension(pattern).unwrap_or_else(|| pattern.to_string());
        self.keys.insert(key);
    }

    /// True when the candidate's base name or its extension is a stored key.
    pub fn is_excluded(&self, candidate: &Path) -> bool {
        if self.keys.is_empty() {
            return false;
        }

        let by_name = candidate
            .file_name()
            .map(|name| self.keys.contains(name.to_string_lossy().as_ref()))
            .unwrap_or(false);

        by_name
            || candidate
                .extension()
                .map(|ext| self.keys.contains(&format!(".{}", ext.to_string_lossy())))
                .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

/// `*.log` -> `.log`. Multi-dot patterns such as `*.tar.gz` are not wildcard
/// extensions and fall back to exact file names.
fn wildcard_extension(pattern: &str) -> Option<String> {
    let ext = Path::new(pattern).extension()?.to_string_lossy().into_owned();
    let dotted = format!(".{}", ext);
    (pattern.strip_prefix('*')? == dotted).then_some(dotted)
}
