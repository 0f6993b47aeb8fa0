//! End-to-end behaviour of the `typescript` plugin inside a plugin container.

use futures::future::join_all;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;
use tsplugin_core::{
    CompilerEngine, CompilerError, CompilerOptions, InputOptions, Plugin, PluginContainer,
    PluginContext, Program, SwcEngine, TranspileOutput, TypeScriptPlugin,
    TypeScriptPluginOptions, CONFIG_FILE_NAME,
};

/// Wraps the swc engine and counts program constructions.
#[derive(Default)]
struct CountingEngine {
    inner: SwcEngine,
    programs: AtomicUsize,
}

impl CompilerEngine for CountingEngine {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn create_program(&self, root_names: &[String], options: &CompilerOptions) -> Arc<dyn Program> {
        self.programs.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(20));
        self.inner.create_program(root_names, options)
    }

    fn transpile_module(
        &self,
        source: &str,
        file_name: &str,
        options: &CompilerOptions,
    ) -> Result<TranspileOutput, CompilerError> {
        self.inner.transpile_module(source, file_name, options)
    }
}

fn write(dir: &Path, rel: &str, text: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, text).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_transforms_build_one_program() {
    let dir = tempdir().unwrap();
    let names: Vec<String> = (0..5).map(|i| format!("src/m{i}.ts")).collect();
    for name in &names {
        write(dir.path(), name, "export const value: number = 1;\n");
    }

    let engine = Arc::new(CountingEngine::default());
    let plugin = TypeScriptPlugin::with_engine(
        dir.path(),
        TypeScriptPluginOptions::default(),
        Arc::clone(&engine) as Arc<dyn CompilerEngine>,
    );
    plugin
        .options(&InputOptions::new(names.clone()))
        .unwrap();

    let ctx = PluginContext::new(dir.path().to_path_buf());
    let results = join_all(
        names
            .iter()
            .map(|name| plugin.transform("export const value: number = 1;\n", name, &ctx)),
    )
    .await;

    for result in results {
        assert!(result.unwrap().is_some());
    }
    assert_eq!(engine.programs.load(Ordering::SeqCst), 1);
    assert!(ctx.logs().is_empty());
}

#[tokio::test]
async fn config_is_resolved_once_per_build() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        CONFIG_FILE_NAME,
        r#"{ "compilerOptions": { "strict": true } }"#,
    );
    let plugin = TypeScriptPlugin::new(dir.path(), TypeScriptPluginOptions::default());

    let first = plugin.compiler_options().await;
    assert_eq!(first.strict, Some(true));

    write(
        dir.path(),
        CONFIG_FILE_NAME,
        r#"{ "compilerOptions": { "strict": false } }"#,
    );
    let second = plugin.compiler_options().await;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.strict, Some(true));
}

#[tokio::test]
async fn type_error_is_logged_and_code_still_emitted() {
    let dir = tempdir().unwrap();
    let source = "const x: number = 'a';\n";
    write(dir.path(), "a.ts", source);

    let plugin = TypeScriptPlugin::new(dir.path(), TypeScriptPluginOptions::default());
    plugin.options(&InputOptions::new("a.ts")).unwrap();

    let ctx = PluginContext::new(dir.path().to_path_buf());
    let result = plugin.transform(source, "a.ts", &ctx).await.unwrap().unwrap();

    let errors = ctx.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "Type 'string' is not assignable to type 'number'."
    );
    let loc = errors[0].loc.as_ref().unwrap();
    assert_eq!(loc.line, 1);
    assert_eq!(loc.column, 6);
    assert!(loc.file.ends_with("a.ts"));

    let options = plugin.compiler_options().await;
    let expected = SwcEngine::new()
        .transpile_module(source, "a.ts", &options)
        .unwrap();
    assert_eq!(result.code, expected.code);
    assert!(result.map.is_some());
}

#[tokio::test]
async fn container_fails_build_after_type_error() {
    let dir = tempdir().unwrap();
    let source = "export const ok: string = 1;\n";
    write(dir.path(), "src/main.ts", source);

    let plugin = TypeScriptPlugin::new(dir.path(), TypeScriptPluginOptions::default());
    let mut container = PluginContainer::new(dir.path().to_path_buf());
    container.add(Box::new(plugin));
    container.options(&InputOptions::new("src/main.ts")).unwrap();
    container.build_start().await.unwrap();

    let err = container.transform(source, "src/main.ts").await.unwrap_err();
    assert_eq!(err.hook, "transform");
    assert!(container.build_end().await.is_err());
}

#[tokio::test]
async fn resolve_id_falls_back_to_tsx() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.ts", "import './b';\n");
    write(dir.path(), "b.tsx", "export {};\n");

    let mut container = PluginContainer::new(dir.path().to_path_buf());
    container.add(Box::new(TypeScriptPlugin::new(
        dir.path(),
        TypeScriptPluginOptions::default(),
    )));

    let importer = dir.path().join("a.ts");
    let resolved = container
        .resolve_id("./b", Some(&importer.to_string_lossy()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.id, dir.path().join("b.tsx").to_string_lossy());
    assert!(!resolved.external);

    let none = container.resolve_id("./b", Some("main.js")).await.unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn missing_config_uses_baseline() {
    let dir = tempdir().unwrap();
    let plugin = TypeScriptPlugin::new(dir.path(), TypeScriptPluginOptions::default());
    assert_eq!(*plugin.compiler_options().await, CompilerOptions::baseline());
}
