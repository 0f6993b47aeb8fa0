//! Plugin system for the bundler.
//!
//! Provides a Rollup-compatible plugin interface with hooks at various build stages.
//! Async hooks return boxed futures so plugins stay usable as `Box<dyn Plugin>`.
//!
//! ## Example
//!
//! ```ignore
//! use tsplugin_core::bundler::{HookResult, Plugin, PluginContext, TransformResult};
//! use futures::future::{BoxFuture, FutureExt};
//!
//! struct TextPlugin;
//!
//! impl Plugin for TextPlugin {
//!     fn name(&self) -> &str { "text" }
//!
//!     fn transform<'a>(
//!         &'a self,
//!         code: &'a str,
//!         id: &'a str,
//!         _ctx: &'a PluginContext,
//!     ) -> BoxFuture<'a, HookResult<Option<TransformResult>>> {
//!         async move {
//!             if id.ends_with(".txt") {
//!                 return Ok(Some(TransformResult::code(format!("export default {code:?};"))));
//!             }
//!             Ok(None)
//!         }
//!         .boxed()
//!     }
//! }
//! ```

use super::InputOptions;
use crate::diagnostics::{BuildContext, Location};
use futures::future::{self, BoxFuture, FutureExt};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Result type for plugin hooks.
pub type HookResult<T> = Result<T, PluginError>;

/// Error from a plugin.
#[derive(Debug)]
pub struct PluginError {
    /// Plugin name that caused the error.
    pub plugin: String,
    /// Hook that failed.
    pub hook: &'static str,
    /// Error message.
    pub message: String,
}

impl PluginError {
    pub fn new(plugin: impl Into<String>, hook: &'static str, message: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            hook,
            message: message.into(),
        }
    }
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.plugin, self.hook, self.message)
    }
}

impl std::error::Error for PluginError {}

/// Severity of a log recorded on the build context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Warn,
    Error,
}

/// A warning or error reported by a plugin during the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLog {
    pub level: LogLevel,
    pub message: String,
    pub loc: Option<Location>,
}

impl fmt::Display for BuildLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.loc {
            Some(loc) => write!(f, "{loc}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Context passed to plugin hooks.
///
/// Records every warning and error reported through [`BuildContext`].
/// Recording an error does not interrupt the running hook; the container
/// fails the build once the hook returns.
#[derive(Debug, Default)]
pub struct PluginContext {
    /// Working directory.
    pub cwd: PathBuf,
    logs: Mutex<Vec<BuildLog>>,
}

impl PluginContext {
    /// Create a new plugin context.
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            logs: Mutex::default(),
        }
    }

    fn record(&self, level: LogLevel, message: &str, loc: Option<Location>) {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(BuildLog {
                level,
                message: message.to_string(),
                loc,
            });
    }

    /// Snapshot of every recorded log, in report order.
    pub fn logs(&self) -> Vec<BuildLog> {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn errors(&self) -> Vec<BuildLog> {
        self.logs_at(LogLevel::Error)
    }

    pub fn warnings(&self) -> Vec<BuildLog> {
        self.logs_at(LogLevel::Warn)
    }

    pub fn error_count(&self) -> usize {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|log| log.level == LogLevel::Error)
            .count()
    }

    fn logs_at(&self, level: LogLevel) -> Vec<BuildLog> {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|log| log.level == level)
            .cloned()
            .collect()
    }
}

impl BuildContext for PluginContext {
    fn warn(&self, message: &str, loc: Option<Location>) {
        tracing::debug!(loc = ?loc, "recorded warning: {message}");
        self.record(LogLevel::Warn, message, loc);
    }

    fn error(&self, message: &str, loc: Option<Location>) {
        tracing::debug!(loc = ?loc, "recorded error: {message}");
        self.record(LogLevel::Error, message, loc);
    }
}

/// Result of resolve hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveIdResult {
    /// Resolved module ID (usually a file path).
    pub id: String,
    /// Whether this module is external (don't bundle).
    pub external: bool,
}

impl ResolveIdResult {
    /// Create a resolved module result.
    pub fn resolved(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            external: false,
        }
    }

    /// Create an external module result.
    pub fn external(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            external: true,
        }
    }
}

/// Result of transform hook.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    /// Transformed code.
    pub code: String,
    /// Optional source map (v3 JSON).
    pub map: Option<serde_json::Value>,
}

impl TransformResult {
    /// Create a transform result with code only.
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            map: None,
        }
    }

    pub fn with_map(mut self, map: Option<serde_json::Value>) -> Self {
        self.map = map;
        self
    }
}

/// The main plugin trait.
///
/// All hooks have default implementations that do nothing, so you only need
/// to implement the hooks you care about.
pub trait Plugin: Send + Sync {
    /// Plugin name for debugging and error messages.
    fn name(&self) -> &str;

    /// Inspect the bundler's input options before the build starts.
    fn options(&self, _options: &InputOptions) -> HookResult<()> {
        Ok(())
    }

    /// Called at the start of the build.
    fn build_start<'a>(&'a self, _ctx: &'a PluginContext) -> BoxFuture<'a, HookResult<()>> {
        future::ready(Ok(())).boxed()
    }

    /// Resolve a module specifier to an ID.
    ///
    /// Return `Some(result)` to handle this resolution, or `None` to let
    /// the next plugin or default resolver handle it.
    fn resolve_id<'a>(
        &'a self,
        _specifier: &'a str,
        _importer: Option<&'a str>,
        _ctx: &'a PluginContext,
    ) -> BoxFuture<'a, HookResult<Option<ResolveIdResult>>> {
        future::ready(Ok(None)).boxed()
    }

    /// Transform module source code.
    ///
    /// Return `Some(result)` to transform the code, or `None` to pass it through.
    /// Multiple plugins can transform the same module in sequence.
    fn transform<'a>(
        &'a self,
        _code: &'a str,
        _id: &'a str,
        _ctx: &'a PluginContext,
    ) -> BoxFuture<'a, HookResult<Option<TransformResult>>> {
        future::ready(Ok(None)).boxed()
    }

    /// Called at the end of the build.
    fn build_end<'a>(&'a self, _ctx: &'a PluginContext) -> BoxFuture<'a, HookResult<()>> {
        future::ready(Ok(())).boxed()
    }
}

/// A container for managing multiple plugins.
///
/// Hooks run in insertion order.
pub struct PluginContainer {
    plugins: Vec<Box<dyn Plugin>>,
    ctx: PluginContext,
}

impl PluginContainer {
    /// Create a new plugin container.
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            plugins: Vec::new(),
            ctx: PluginContext::new(cwd),
        }
    }

    /// Add a plugin.
    pub fn add(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Get the context (read-only).
    pub fn context(&self) -> &PluginContext {
        &self.ctx
    }

    /// Check if any plugins are registered.
    pub fn has_plugins(&self) -> bool {
        !self.plugins.is_empty()
    }

    /// Call `options` on all plugins.
    pub fn options(&self, options: &InputOptions) -> HookResult<()> {
        for plugin in &self.plugins {
            plugin.options(options)?;
        }
        Ok(())
    }

    /// Call `build_start` on all plugins.
    pub async fn build_start(&self) -> HookResult<()> {
        for plugin in &self.plugins {
            let before = self.ctx.error_count();
            if let Err(e) = plugin.build_start(&self.ctx).await {
                return Err(self.record_failure(e, before));
            }
            self.fail_on_new_errors(plugin.as_ref(), "build_start", before)?;
        }
        Ok(())
    }

    /// Try to resolve a module ID through plugins.
    /// Returns None if no plugin handled the resolution.
    pub async fn resolve_id(
        &self,
        specifier: &str,
        importer: Option<&str>,
    ) -> HookResult<Option<ResolveIdResult>> {
        for plugin in &self.plugins {
            if let Some(result) = plugin.resolve_id(specifier, importer, &self.ctx).await? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// Transform code through all plugins.
    ///
    /// Each plugin's output is passed to the next plugin; the last emitted
    /// source map wins. Fails once a hook has reported an error on the
    /// context, even though the hook itself returned code. A hook that
    /// fails without reporting has its error recorded on the context.
    pub async fn transform(&self, code: &str, id: &str) -> HookResult<TransformResult> {
        let mut current = TransformResult::code(code);
        for plugin in &self.plugins {
            let before = self.ctx.error_count();
            let result = match plugin.transform(&current.code, id, &self.ctx).await {
                Ok(result) => result,
                Err(e) => return Err(self.record_failure(e, before)),
            };
            self.fail_on_new_errors(plugin.as_ref(), "transform", before)?;
            if let Some(result) = result {
                current.code = result.code;
                if result.map.is_some() {
                    current.map = result.map;
                }
            }
        }
        Ok(current)
    }

    /// Call `build_end` on all plugins.
    ///
    /// Fails if any error was recorded during the build.
    pub async fn build_end(&self) -> HookResult<()> {
        for plugin in &self.plugins {
            plugin.build_end(&self.ctx).await?;
        }
        match self.ctx.errors().first() {
            Some(first) => Err(PluginError::new(
                "build",
                "build_end",
                format!("{} error(s) reported, first: {first}", self.ctx.error_count()),
            )),
            None => Ok(()),
        }
    }

    /// Keep a failed hook's error on the context so `build_end` sees it.
    fn record_failure(&self, error: PluginError, before: usize) -> PluginError {
        if self.ctx.error_count() == before {
            self.ctx.error(&error.to_string(), None);
        }
        error
    }

    fn fail_on_new_errors(
        &self,
        plugin: &dyn Plugin,
        hook: &'static str,
        before: usize,
    ) -> HookResult<()> {
        let errors = self.ctx.errors();
        match errors.get(before) {
            Some(first) => Err(PluginError::new(plugin.name(), hook, first.to_string())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::InputOption;
    use std::sync::{Arc, OnceLock};

    struct ReplacePlugin {
        from: &'static str,
        to: &'static str,
    }

    impl Plugin for ReplacePlugin {
        fn name(&self) -> &str {
            "replace"
        }

        fn transform<'a>(
            &'a self,
            code: &'a str,
            _id: &'a str,
            _ctx: &'a PluginContext,
        ) -> BoxFuture<'a, HookResult<Option<TransformResult>>> {
            async move {
                if !code.contains(self.from) {
                    return Ok(None);
                }
                Ok(Some(TransformResult::code(code.replace(self.from, self.to))))
            }
            .boxed()
        }
    }

    /// Reports an error on the context but still returns code.
    struct ReportingPlugin;

    impl Plugin for ReportingPlugin {
        fn name(&self) -> &str {
            "reporting"
        }

        fn transform<'a>(
            &'a self,
            code: &'a str,
            id: &'a str,
            ctx: &'a PluginContext,
        ) -> BoxFuture<'a, HookResult<Option<TransformResult>>> {
            async move {
                ctx.error(
                    "bad thing",
                    Some(Location {
                        file: id.to_string(),
                        line: 1,
                        column: 0,
                    }),
                );
                Ok(Some(TransformResult::code(code)))
            }
            .boxed()
        }
    }

    struct FailingPlugin;

    impl Plugin for FailingPlugin {
        fn name(&self) -> &str {
            "failing"
        }

        fn transform<'a>(
            &'a self,
            _code: &'a str,
            _id: &'a str,
            _ctx: &'a PluginContext,
        ) -> BoxFuture<'a, HookResult<Option<TransformResult>>> {
            future::ready(Err(PluginError::new("failing", "transform", "boom"))).boxed()
        }
    }

    struct AliasPlugin;

    impl Plugin for AliasPlugin {
        fn name(&self) -> &str {
            "alias"
        }

        fn resolve_id<'a>(
            &'a self,
            specifier: &'a str,
            _importer: Option<&'a str>,
            _ctx: &'a PluginContext,
        ) -> BoxFuture<'a, HookResult<Option<ResolveIdResult>>> {
            let result = (specifier == "@app").then(|| ResolveIdResult::resolved("/src/app.ts"));
            future::ready(Ok(result)).boxed()
        }
    }

    struct ExternalPlugin;

    impl Plugin for ExternalPlugin {
        fn name(&self) -> &str {
            "external"
        }

        fn resolve_id<'a>(
            &'a self,
            specifier: &'a str,
            _importer: Option<&'a str>,
            _ctx: &'a PluginContext,
        ) -> BoxFuture<'a, HookResult<Option<ResolveIdResult>>> {
            future::ready(Ok(Some(ResolveIdResult::external(specifier)))).boxed()
        }
    }

    #[derive(Default)]
    struct InputRecorder {
        seen: Arc<OnceLock<Vec<String>>>,
    }

    impl Plugin for InputRecorder {
        fn name(&self) -> &str {
            "input-recorder"
        }

        fn options(&self, options: &InputOptions) -> HookResult<()> {
            let entries = options.input.as_ref().map(InputOption::entries);
            let _ = self.seen.set(entries.unwrap_or_default());
            Ok(())
        }
    }

    fn container() -> PluginContainer {
        PluginContainer::new(PathBuf::from("/project"))
    }

    #[tokio::test]
    async fn test_transform_chain() {
        let mut container = container();
        container.add(Box::new(ReplacePlugin { from: "FOO", to: "BAR" }));
        container.add(Box::new(ReplacePlugin { from: "BAR", to: "BAZ" }));

        // Plugins chain: FOO -> BAR -> BAZ
        let result = container.transform("const x = FOO;", "test.ts").await.unwrap();
        assert_eq!(result.code, "const x = BAZ;");
        assert!(result.map.is_none());
    }

    #[tokio::test]
    async fn test_reported_error_fails_transform() {
        let mut container = container();
        container.add(Box::new(ReportingPlugin));
        container.add(Box::new(ReplacePlugin { from: "a", to: "b" }));

        let err = container.transform("a", "/src/a.ts").await.unwrap_err();
        assert_eq!(err.plugin, "reporting");
        assert_eq!(err.hook, "transform");
        assert_eq!(err.message, "/src/a.ts:1:0: bad thing");
        assert_eq!(container.context().error_count(), 1);

        let err = container.build_end().await.unwrap_err();
        assert!(err.message.contains("bad thing"));
    }

    #[tokio::test]
    async fn test_failed_hook_fails_build() {
        let mut container = container();
        container.add(Box::new(FailingPlugin));

        let err = container.transform("a", "/src/a.ts").await.unwrap_err();
        assert_eq!(err.message, "boom");
        assert_eq!(container.context().error_count(), 1);

        let err = container.build_end().await.unwrap_err();
        assert!(err.message.contains("boom"));
    }

    #[tokio::test]
    async fn test_reported_and_failed_hook_records_once() {
        struct ReportThenFail;

        impl Plugin for ReportThenFail {
            fn name(&self) -> &str {
                "report-then-fail"
            }

            fn transform<'a>(
                &'a self,
                _code: &'a str,
                _id: &'a str,
                ctx: &'a PluginContext,
            ) -> BoxFuture<'a, HookResult<Option<TransformResult>>> {
                ctx.error("reported", None);
                future::ready(Err(PluginError::new("report-then-fail", "transform", "reported")))
                    .boxed()
            }
        }

        let mut container = container();
        container.add(Box::new(ReportThenFail));
        container.transform("a", "a.ts").await.unwrap_err();
        assert_eq!(container.context().error_count(), 1);
    }

    #[tokio::test]
    async fn test_warnings_do_not_fail() {
        let container = container();
        container.context().warn("heads up", None);
        container.build_end().await.unwrap();

        let warnings = container.context().warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, LogLevel::Warn);
        assert!(container.context().errors().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_first_match_wins() {
        let mut container = container();
        container.add(Box::new(AliasPlugin));
        container.add(Box::new(ExternalPlugin));

        let aliased = container.resolve_id("@app", None).await.unwrap();
        assert_eq!(aliased, Some(ResolveIdResult::resolved("/src/app.ts")));

        let external = container.resolve_id("react", None).await.unwrap();
        assert_eq!(external, Some(ResolveIdResult::external("react")));
    }

    #[tokio::test]
    async fn test_no_plugins_passes_through() {
        let container = container();
        assert!(!container.has_plugins());
        assert!(container.resolve_id("./a", None).await.unwrap().is_none());
        let result = container.transform("x", "a.ts").await.unwrap();
        assert_eq!(result, TransformResult::code("x"));
    }

    #[test]
    fn test_options_hook_sees_entries() {
        let recorder = InputRecorder::default();
        let seen = Arc::clone(&recorder.seen);

        let mut container = container();
        container.add(Box::new(recorder));
        container
            .options(&InputOptions::new(vec!["a.ts".to_string(), "b.ts".to_string()]))
            .unwrap();

        assert_eq!(seen.get().unwrap(), &vec!["a.ts", "b.ts"]);
    }
}
