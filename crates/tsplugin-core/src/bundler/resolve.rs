//! Extensionless import resolution for TypeScript sources.
//!
//! `import './b'` inside a `.ts`/`.tsx` file is resolved by probing
//! `./b.ts`, `./b.tsx`, then `./b/index.ts`, `./b/index.tsx` relative to the
//! importer. Anything else is left to the bundler's default resolution.

use crate::paths::{absolutize, extension_of, is_ts_file, TS_EXTENSIONS};
use std::path::{Path, PathBuf};

/// Resolve `importee` as imported from `importer`.
///
/// Returns `None` (use default resolution) when the specifier already has
/// an extension, when there is no importer, when the importer is not a
/// TypeScript file, or when no candidate exists on disk. Nothing is cached.
pub async fn resolve_typescript_import(
    importee: &str,
    importer: Option<&str>,
    cwd: &Path,
) -> Option<PathBuf> {
    let importer = importer?;
    if extension_of(importee).is_some() || !is_ts_file(importer) {
        return None;
    }

    let importer_dir = absolutize(Path::new(importer), cwd)
        .parent()
        .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);

    if let Some(found) = probe(importee, &importer_dir).await {
        return Some(found);
    }

    let index = Path::new(importee).join("index");
    probe(&index.to_string_lossy(), &importer_dir).await
}

/// Try each extension in priority order; first existing file wins.
async fn probe(base: &str, importer_dir: &Path) -> Option<PathBuf> {
    for ext in TS_EXTENSIONS {
        let candidate = absolutize(Path::new(&format!("{base}{ext}")), importer_dir);
        if is_file(&candidate).await {
            tracing::trace!(candidate = %candidate.display(), "resolved typescript import");
            return Some(candidate);
        }
    }
    None
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, rel: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, "export {};\n").unwrap();
        path
    }

    #[tokio::test]
    async fn test_ts_preferred_over_tsx() {
        let dir = tempdir().unwrap();
        let importer = touch(dir.path(), "a.ts");
        let ts = touch(dir.path(), "b.ts");
        touch(dir.path(), "b.tsx");

        let resolved =
            resolve_typescript_import("./b", Some(&importer.to_string_lossy()), dir.path()).await;
        assert_eq!(resolved, Some(ts));
    }

    #[tokio::test]
    async fn test_falls_back_to_tsx() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a.ts");
        let tsx = touch(dir.path(), "b.tsx");

        // Relative importer resolves against cwd.
        let resolved = resolve_typescript_import("./b", Some("a.ts"), dir.path()).await;
        assert_eq!(resolved, Some(tsx));
    }

    #[tokio::test]
    async fn test_index_fallback() {
        let dir = tempdir().unwrap();
        let importer = touch(dir.path(), "src/main.ts");
        let index = touch(dir.path(), "src/components/index.tsx");

        let resolved = resolve_typescript_import(
            "./components",
            Some(&importer.to_string_lossy()),
            dir.path(),
        )
        .await;
        assert_eq!(resolved, Some(index));
    }

    #[tokio::test]
    async fn test_parent_directory_specifier() {
        let dir = tempdir().unwrap();
        let importer = touch(dir.path(), "src/views/Home.tsx");
        let store = touch(dir.path(), "src/store.ts");

        let resolved =
            resolve_typescript_import("../store", Some(&importer.to_string_lossy()), dir.path())
                .await;
        assert_eq!(resolved, Some(store));
    }

    #[tokio::test]
    async fn test_specifier_with_extension_is_skipped() {
        let dir = tempdir().unwrap();
        let importer = touch(dir.path(), "a.ts");
        touch(dir.path(), "data.json.ts");

        let resolved =
            resolve_typescript_import("./data.json", Some(&importer.to_string_lossy()), dir.path())
                .await;
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_non_typescript_importer_is_skipped() {
        let dir = tempdir().unwrap();
        let importer = touch(dir.path(), "main.js");
        touch(dir.path(), "b.ts");

        let resolved =
            resolve_typescript_import("./b", Some(&importer.to_string_lossy()), dir.path()).await;
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_missing_importer_is_skipped() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "b.ts");
        assert!(resolve_typescript_import("./b", None, dir.path()).await.is_none());
    }

    #[tokio::test]
    async fn test_nothing_on_disk() {
        let dir = tempdir().unwrap();
        let importer = touch(dir.path(), "a.ts");
        let resolved =
            resolve_typescript_import("vue", Some(&importer.to_string_lossy()), dir.path()).await;
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_directory_named_like_module_is_not_a_match() {
        let dir = tempdir().unwrap();
        let importer = touch(dir.path(), "a.ts");
        std::fs::create_dir(dir.path().join("b.ts")).unwrap();
        let tsx = touch(dir.path(), "b.tsx");

        let resolved =
            resolve_typescript_import("./b", Some(&importer.to_string_lossy()), dir.path()).await;
        assert_eq!(resolved, Some(tsx));
    }
}
