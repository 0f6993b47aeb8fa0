//! The `typescript` bundler plugin.
//!
//! One [`TypeScriptPlugin`] serves one build:
//!
//! - `options` records the declared entry inputs
//! - `resolve_id` maps extensionless imports from `.ts`/`.tsx` files onto disk
//! - `transform` checks the file against a whole-program context (built once,
//!   on first use) and transpiles it in isolation
//!
//! Config and program are each computed at most once per plugin instance;
//! concurrent first callers await the same in-flight computation.

pub mod program;

pub use program::{build_program, discover_declaration_files, DECLARATION_GLOB};

use crate::bundler::{
    HookResult, InputOption, InputOptions, Plugin, PluginContext, PluginError, ResolveIdResult,
    TransformResult,
};
use crate::bundler::resolve_typescript_import;
use crate::compiler::{CompilerEngine, Program, SwcEngine};
use crate::config::{resolve_compiler_options, CompilerOptions};
use crate::diagnostics::{report_diagnostics, BuildContext};
use crate::paths::{absolutize, is_ts_file};
use futures::future::{BoxFuture, FutureExt};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tokio::sync::OnceCell;

const PLUGIN_NAME: &str = "typescript";

/// User-facing plugin options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeScriptPluginOptions {
    /// Inline `compilerOptions`; when present `tsconfig.json` is not read.
    pub compiler_options: Option<Value>,
    /// Check transformed files that are not part of the build's program
    /// with a throwaway single-file program.
    pub check_unlisted_files: bool,
}

/// TypeScript transform plugin.
pub struct TypeScriptPlugin {
    root: PathBuf,
    options: TypeScriptPluginOptions,
    engine: Arc<dyn CompilerEngine>,
    input: OnceLock<Vec<String>>,
    compiler_options: OnceCell<Arc<CompilerOptions>>,
    program: OnceCell<Arc<dyn Program>>,
}

impl TypeScriptPlugin {
    /// Create a plugin rooted at `root` (the build's working directory),
    /// backed by the swc engine.
    pub fn new(root: impl Into<PathBuf>, options: TypeScriptPluginOptions) -> Self {
        Self::with_engine(root, options, Arc::new(SwcEngine::new()))
    }

    /// Create a plugin backed by a custom engine.
    pub fn with_engine(
        root: impl Into<PathBuf>,
        options: TypeScriptPluginOptions,
        engine: Arc<dyn CompilerEngine>,
    ) -> Self {
        Self {
            root: root.into(),
            options,
            engine,
            input: OnceLock::new(),
            compiler_options: OnceCell::new(),
            program: OnceCell::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Entry inputs recorded by the `options` hook (empty if none).
    pub fn declared_inputs(&self) -> &[String] {
        self.input.get().map_or(&[], Vec::as_slice)
    }

    /// Finalized compiler options for this build.
    ///
    /// A config error is logged with its code frame and the baseline
    /// options are used instead; that outcome is memoized like a success.
    pub async fn compiler_options(&self) -> Arc<CompilerOptions> {
        self.compiler_options
            .get_or_init(|| async {
                let inline = self.options.compiler_options.as_ref();
                match resolve_compiler_options(inline, &self.root).await {
                    Ok(options) => Arc::new(options),
                    Err(e) => {
                        tracing::error!("{}", e.render());
                        Arc::new(CompilerOptions::baseline())
                    }
                }
            })
            .await
            .clone()
    }

    /// The build's program, created on first use and never rebuilt.
    pub async fn program(&self) -> HookResult<Arc<dyn Program>> {
        self.program
            .get_or_try_init(|| async {
                let options = self.compiler_options().await;
                build_program(
                    Arc::clone(&self.engine),
                    self.root.clone(),
                    self.declared_inputs().to_vec(),
                    options,
                )
                .await
            })
            .await
            .cloned()
    }

    /// Report pre-emit diagnostics for `file_name` to `ctx`.
    async fn check_file(&self, file_name: &str, ctx: &dyn BuildContext) -> HookResult<()> {
        let program = self.program().await?;
        if let Some(file) = program.source_file(file_name) {
            report_diagnostics(&program.pre_emit_diagnostics(&file), ctx);
            return Ok(());
        }

        if !self.options.check_unlisted_files {
            tracing::debug!(file = file_name, "not part of the program, skipping checks");
            return Ok(());
        }

        let options = self.compiler_options().await;
        let single = build_single_file_program(Arc::clone(&self.engine), file_name, options).await?;
        if let Some(file) = single.source_file(file_name) {
            report_diagnostics(&single.pre_emit_diagnostics(&file), ctx);
        }
        Ok(())
    }

    async fn transform_file(
        &self,
        code: &str,
        id: &str,
        ctx: &PluginContext,
    ) -> HookResult<Option<TransformResult>> {
        if !is_ts_file(id) {
            return Ok(None);
        }

        let options = self.compiler_options().await;
        let file_name = absolutize(Path::new(id), &self.root)
            .to_string_lossy()
            .into_owned();
        self.check_file(&file_name, ctx).await?;

        let engine = Arc::clone(&self.engine);
        let source = code.to_string();
        let id_owned = id.to_string();
        let output = tokio::task::spawn_blocking(move || {
            engine.transpile_module(&source, &id_owned, &options)
        })
        .await
        .map_err(|e| transform_error(format!("transpile task failed: {e}")))?
        .map_err(|e| transform_error(e.to_string()))?;

        report_diagnostics(&output.diagnostics, ctx);

        let map = output
            .source_map
            .as_deref()
            .map(serde_json::from_str::<Value>)
            .transpose()
            .map_err(|e| transform_error(format!("invalid source map: {e}")))?;

        Ok(Some(TransformResult::code(output.code).with_map(map)))
    }
}

async fn build_single_file_program(
    engine: Arc<dyn CompilerEngine>,
    file_name: &str,
    options: Arc<CompilerOptions>,
) -> HookResult<Arc<dyn Program>> {
    let root_names = vec![file_name.to_string()];
    tokio::task::spawn_blocking(move || engine.create_program(&root_names, &options))
        .await
        .map_err(|e| transform_error(format!("program construction failed: {e}")))
}

fn transform_error(message: String) -> PluginError {
    PluginError::new(PLUGIN_NAME, "transform", message)
}

impl Plugin for TypeScriptPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn options(&self, options: &InputOptions) -> HookResult<()> {
        let Some(input) = options.input.as_ref() else {
            return Ok(());
        };
        if self.input.set(InputOption::entries(input)).is_err() {
            tracing::debug!("entry inputs already recorded for this build");
        }
        Ok(())
    }

    fn resolve_id<'a>(
        &'a self,
        specifier: &'a str,
        importer: Option<&'a str>,
        _ctx: &'a PluginContext,
    ) -> BoxFuture<'a, HookResult<Option<ResolveIdResult>>> {
        async move {
            let resolved = resolve_typescript_import(specifier, importer, &self.root).await;
            Ok(resolved.map(|path| ResolveIdResult::resolved(path.to_string_lossy())))
        }
        .boxed()
    }

    fn transform<'a>(
        &'a self,
        code: &'a str,
        id: &'a str,
        ctx: &'a PluginContext,
    ) -> BoxFuture<'a, HookResult<Option<TransformResult>>> {
        self.transform_file(code, id, ctx).boxed()
    }
}
