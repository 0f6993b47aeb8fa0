//! Program input discovery and construction.

use crate::bundler::{HookResult, PluginError};
use crate::compiler::{CompilerEngine, Program};
use crate::config::CompilerOptions;
use crate::paths::{absolutize, DEPENDENCY_DIR};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Declaration files always seeded into the program.
pub const DECLARATION_GLOB: &str = "**/*.d.ts";

/// Find every declaration file under `root`, skipping dependency
/// directories. Runs on the blocking pool; results are sorted by path.
pub async fn discover_declaration_files(root: &Path) -> HookResult<Vec<String>> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || declaration_files(&root))
        .await
        .map_err(|e| PluginError::new("typescript", "transform", format!("glob task failed: {e}")))
}

fn declaration_files(root: &Path) -> Vec<String> {
    let pattern = match glob::Pattern::new(DECLARATION_GLOB) {
        Ok(pattern) => pattern,
        Err(e) => {
            tracing::warn!(error = %e, "invalid declaration glob");
            return Vec::new();
        }
    };

    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != DEPENDENCY_DIR)
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .is_ok_and(|rel| pattern.matches_path(rel))
        })
        .map(|entry| entry.path().to_string_lossy().into_owned())
        .collect()
}

/// Build the whole-program context for a build: declaration files first,
/// then the declared entry inputs (resolved against `root`).
pub async fn build_program(
    engine: Arc<dyn CompilerEngine>,
    root: PathBuf,
    inputs: Vec<String>,
    options: Arc<CompilerOptions>,
) -> HookResult<Arc<dyn Program>> {
    let mut root_names = discover_declaration_files(&root).await?;
    let declarations = root_names.len();
    root_names.extend(
        inputs
            .iter()
            .map(|input| absolutize(Path::new(input), &root).to_string_lossy().into_owned()),
    );

    tracing::debug!(
        engine = engine.name(),
        declarations,
        inputs = inputs.len(),
        "creating program"
    );

    tokio::task::spawn_blocking(move || engine.create_program(&root_names, &options))
        .await
        .map_err(|e| {
            PluginError::new("typescript", "transform", format!("program construction failed: {e}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::SwcEngine;
    use tempfile::tempdir;

    fn touch(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "export {};\n").unwrap();
    }

    #[tokio::test]
    async fn test_discovery_skips_dependency_dirs() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "globals.d.ts");
        touch(dir.path(), "src/types/env.d.ts");
        touch(dir.path(), "src/main.ts");
        touch(dir.path(), "node_modules/pkg/index.d.ts");
        touch(dir.path(), "packages/app/node_modules/dep/index.d.ts");

        let found = discover_declaration_files(dir.path()).await.unwrap();
        let rel: Vec<_> = found
            .iter()
            .map(|f| {
                Path::new(f)
                    .strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(rel, vec!["globals.d.ts", "src/types/env.d.ts"]);
    }

    #[tokio::test]
    async fn test_program_roots_are_declarations_then_inputs() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "env.d.ts");
        touch(dir.path(), "src/main.ts");

        let program = build_program(
            Arc::new(SwcEngine::new()),
            dir.path().to_path_buf(),
            vec!["src/main.ts".to_string()],
            Arc::new(CompilerOptions::baseline()),
        )
        .await
        .unwrap();

        let roots = program.root_names();
        assert_eq!(roots.len(), 2);
        assert!(roots[0].ends_with("env.d.ts"));
        assert!(Path::new(&roots[1]).is_absolute());
        assert!(roots[1].ends_with("main.ts"));
    }
}
