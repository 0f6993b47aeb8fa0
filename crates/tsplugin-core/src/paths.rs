use std::path::{Component, Path, PathBuf};

/// Extensions handled by the TypeScript plugin, in resolution priority order.
pub const TS_EXTENSIONS: [&str; 2] = [".ts", ".tsx"];

/// Name of the dependency directory skipped by declaration discovery.
pub const DEPENDENCY_DIR: &str = "node_modules";

/// Whether `file_name` ends in one of [`TS_EXTENSIONS`].
#[must_use]
pub fn is_ts_file(file_name: &str) -> bool {
    extension_of(file_name).is_some_and(|ext| TS_EXTENSIONS.contains(&ext.as_str()))
}

/// The extension of the last path segment including the dot, if any.
///
/// A leading dot alone (`.env`) is not an extension.
#[must_use]
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
}

/// Lexically normalize a path: drop `.` segments and fold `..` into the
/// preceding segment. Does not touch the filesystem.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve `path` against `cwd` when relative, then normalize.
#[must_use]
pub fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&cwd.join(path))
    }
}

/// Whether any component of `path` is the dependency directory.
#[must_use]
pub fn in_dependency_dir(path: &Path) -> bool {
    path.components()
        .any(|c| c.as_os_str() == DEPENDENCY_DIR)
}
