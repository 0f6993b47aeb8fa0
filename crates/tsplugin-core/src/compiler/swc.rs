//! SWC compiler engine implementation.
//!
//! ## Features
//!
//! - TypeScript type stripping
//! - React JSX transpilation (classic and automatic runtimes)
//! - ES module output with optional JSON source maps
//! - Whole-program checking via [`SwcProgram`]

#![allow(clippy::default_trait_access)]

use super::parse::{parse_module, ParsedModule};
use super::{codes, CompilerEngine, CompilerError, Program, SwcProgram, TranspileOutput};
use crate::config::{CompilerOptions, JsxEmit, ScriptTarget};
use crate::diagnostics::{Diagnostic, SourceFile};
use std::sync::Arc;
use swc_common::{comments::Comments, sync::Lrc, Globals, Mark, GLOBALS};
use swc_ecma_ast::{EsVersion, Program as AstProgram};
use swc_ecma_codegen::{text_writer::JsWriter, Emitter};
use swc_ecma_transforms_base::{fixer::fixer, hygiene::hygiene, resolver};
use swc_ecma_transforms_react::{react, Options as ReactOptions, Runtime};
use swc_ecma_transforms_typescript::strip;
use swc_ecma_visit::FoldWith;

/// SWC-based compiler engine.
///
/// ## Thread Safety
///
/// `SwcEngine` is `Send + Sync` and can be shared across threads.
/// Each call is independent; no state is kept between calls.
#[derive(Debug, Clone, Default)]
pub struct SwcEngine {
    _private: (),
}

impl SwcEngine {
    /// Create a new SWC engine with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// React transform settings for the configured `jsx` mode, or `None`
    /// when JSX is kept as written.
    fn react_options(options: &CompilerOptions) -> Option<ReactOptions> {
        let import_source = || {
            options
                .jsx_import_source
                .clone()
                .unwrap_or_else(|| "react".to_string())
        };
        match options.jsx? {
            JsxEmit::React => Some(ReactOptions {
                runtime: Some(Runtime::Classic),
                ..Default::default()
            }),
            JsxEmit::ReactJsx => Some(ReactOptions {
                runtime: Some(Runtime::Automatic),
                import_source: Some(import_source()),
                ..Default::default()
            }),
            JsxEmit::ReactJsxDev => Some(ReactOptions {
                runtime: Some(Runtime::Automatic),
                import_source: Some(import_source()),
                development: Some(true),
                ..Default::default()
            }),
            JsxEmit::Preserve | JsxEmit::ReactNative => None,
        }
    }

    /// Warnings for options this engine accepts but cannot honor.
    fn option_warnings(file: &Arc<SourceFile>, options: &CompilerOptions) -> Vec<Diagnostic> {
        let mut warnings = Vec::new();
        if let Some(kind) = options.module.filter(|kind| !kind.is_es_module()) {
            warnings.push(
                Diagnostic::warning(
                    codes::MODULE_KIND_IGNORED,
                    format!("Module kind '{kind}' is not supported here; emitting ES modules."),
                )
                .with_file(Arc::clone(file)),
            );
        }
        if let Some(target @ (ScriptTarget::Es3 | ScriptTarget::Es5)) = options.target {
            warnings.push(
                Diagnostic::warning(
                    codes::TARGET_NOT_LOWERED,
                    format!("Target '{target}' is not supported; emitting ES2015 or later syntax."),
                )
                .with_file(Arc::clone(file)),
            );
        }
        warnings
    }
}

impl CompilerEngine for SwcEngine {
    fn name(&self) -> &'static str {
        "swc"
    }

    fn create_program(
        &self,
        root_names: &[String],
        options: &CompilerOptions,
    ) -> Arc<dyn Program> {
        Arc::new(SwcProgram::build(root_names, options))
    }

    fn transpile_module(
        &self,
        source: &str,
        file_name: &str,
        options: &CompilerOptions,
    ) -> Result<TranspileOutput, CompilerError> {
        let file = Arc::new(SourceFile::new(file_name, source));
        let ParsedModule {
            cm,
            comments,
            module,
            errors,
            ..
        } = parse_module(&file);

        let Some(module) = module.filter(|_| errors.is_empty()) else {
            return Err(
                CompilerError::parse_error(format!("Failed to parse {file_name}"))
                    .with_diagnostics(errors),
            );
        };

        let react_options = file_name
            .ends_with(".tsx")
            .then(|| Self::react_options(options))
            .flatten();

        let output = GLOBALS.set(&Globals::default(), || {
            let unresolved_mark = Mark::new();
            let top_level_mark = Mark::new();

            let mut program = AstProgram::Module(module);
            program = program.fold_with(&mut resolver(unresolved_mark, top_level_mark, true));
            program = program.fold_with(&mut strip(unresolved_mark, top_level_mark));

            let mut module = match program {
                AstProgram::Module(m) => m,
                AstProgram::Script(s) => swc_ecma_ast::Module {
                    span: s.span,
                    body: s
                        .body
                        .into_iter()
                        .map(swc_ecma_ast::ModuleItem::Stmt)
                        .collect(),
                    shebang: s.shebang,
                },
            };

            if let Some(react_options) = react_options {
                module = module.fold_with(&mut react(
                    cm.clone(),
                    Some(&comments),
                    react_options,
                    top_level_mark,
                    unresolved_mark,
                ));
            }

            module = module.fold_with(&mut hygiene());
            module.fold_with(&mut fixer(Some(&comments)))
        });

        let mut buf = Vec::new();
        let mut src_map_buf = Vec::new();
        {
            let writer = JsWriter::new(cm.clone(), "\n", &mut buf, Some(&mut src_map_buf));
            let emitted_comments: Option<&dyn Comments> = if options.remove_comments == Some(true)
            {
                None
            } else {
                Some(&comments)
            };

            let mut emitter = Emitter {
                cfg: swc_ecma_codegen::Config::default().with_target(EsVersion::EsNext),
                cm: cm.clone(),
                comments: emitted_comments,
                wr: writer,
            };

            emitter
                .emit_module(&output)
                .map_err(|e| CompilerError::emit_error(format!("Failed to emit: {e}")))?;
        }

        let code = String::from_utf8(buf)
            .map_err(|e| CompilerError::emit_error(format!("Invalid UTF-8 output: {e}")))?;

        let mut output = TranspileOutput::new(code)
            .with_diagnostics(Self::option_warnings(&file, options));

        if options.wants_source_map() {
            let srcmap = cm.build_source_map(&src_map_buf);
            let mut map_buf = Vec::new();
            srcmap.to_writer(&mut map_buf).map_err(|e| {
                CompilerError::emit_error(format!("Failed to write source map: {e}"))
            })?;
            let map = String::from_utf8(map_buf).map_err(|e| {
                CompilerError::emit_error(format!("Invalid UTF-8 source map: {e}"))
            })?;
            output = output.with_source_map(map);
        }

        tracing::trace!(file = file_name, bytes = output.code.len(), "transpiled module");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModuleKind;

    fn options() -> CompilerOptions {
        CompilerOptions::baseline()
    }

    fn with_jsx(jsx: JsxEmit) -> CompilerOptions {
        CompilerOptions {
            jsx: Some(jsx),
            ..options()
        }
    }

    #[test]
    fn test_swc_engine_name() {
        assert_eq!(SwcEngine::new().name(), "swc");
    }

    #[test]
    fn test_transpile_strips_types() {
        let source = r#"
            interface User {
                name: string;
                age: number;
            }
            const user: User = { name: "Alice", age: 30 };
            console.log(user.name);
        "#;

        let output = SwcEngine::new()
            .transpile_module(source, "src/app.ts", &options())
            .unwrap();

        assert!(!output.code.contains("interface"));
        assert!(!output.code.contains(": User"));
        assert!(output.code.contains("const user"));
        assert!(output.code.contains("console.log"));
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_imports_stay_es_modules() {
        let source = "import { b } from './b';\nexport const a = b + 1;\n";
        let output = SwcEngine::new()
            .transpile_module(source, "src/a.ts", &options())
            .unwrap();
        assert!(output.code.contains("import { b } from './b'") || output.code.contains("import { b } from \"./b\""));
        assert!(output.code.contains("export const a"));
    }

    #[test]
    fn test_jsx_automatic_runtime() {
        let source = r#"
            export function App() {
                return <div className="app">Hello World</div>;
            }
        "#;

        let output = SwcEngine::new()
            .transpile_module(source, "src/App.tsx", &with_jsx(JsxEmit::ReactJsx))
            .unwrap();

        assert!(output.code.contains("react/jsx-runtime"));
        assert!(!output.code.contains("<div"));
    }

    #[test]
    fn test_jsx_classic_runtime() {
        let source = r"
            export function App() {
                return <div>Hello</div>;
            }
        ";

        let output = SwcEngine::new()
            .transpile_module(source, "src/App.tsx", &with_jsx(JsxEmit::React))
            .unwrap();

        assert!(output.code.contains("React.createElement"));
        assert!(!output.code.contains("<div"));
    }

    #[test]
    fn test_jsx_preserved_by_default() {
        let source = "export const el = <span />;\n";
        let output = SwcEngine::new()
            .transpile_module(source, "src/App.tsx", &options())
            .unwrap();
        assert!(output.code.contains("<span"));
    }

    #[test]
    fn test_source_map_follows_options() {
        let source = "const x: number = 42;";

        let output = SwcEngine::new()
            .transpile_module(source, "src/app.ts", &options())
            .unwrap();
        let map = output.source_map.unwrap();
        assert!(map.contains("\"version\":3"));
        assert!(map.contains("src/app.ts"));

        let no_maps = CompilerOptions {
            source_map: Some(false),
            ..options()
        };
        let output = SwcEngine::new()
            .transpile_module(source, "src/app.ts", &no_maps)
            .unwrap();
        assert!(output.source_map.is_none());
    }

    #[test]
    fn test_remove_comments() {
        let source = "// keep me?\nexport const x = 1;\n";
        let kept = SwcEngine::new()
            .transpile_module(source, "a.ts", &options())
            .unwrap();
        assert!(kept.code.contains("keep me?"));

        let removed = SwcEngine::new()
            .transpile_module(
                source,
                "a.ts",
                &CompilerOptions {
                    remove_comments: Some(true),
                    ..options()
                },
            )
            .unwrap();
        assert!(!removed.code.contains("keep me?"));
    }

    #[test]
    fn test_commonjs_module_warns() {
        let options = CompilerOptions {
            module: Some(ModuleKind::CommonJs),
            ..options()
        };
        let output = SwcEngine::new()
            .transpile_module("export const x = 1;", "a.ts", &options)
            .unwrap();
        assert!(output.code.contains("export const x"));
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].code, codes::MODULE_KIND_IGNORED);
        assert!(!output.diagnostics[0].is_error());
    }

    #[test]
    fn test_parse_error() {
        let result = SwcEngine::new().transpile_module("const x = {", "src/app.ts", &options());

        let err = result.unwrap_err();
        assert!(err.code.contains("PARSE"));
        assert!(!err.diagnostics.is_empty());
        assert!(err.diagnostics[0].start.is_some());
    }
}
