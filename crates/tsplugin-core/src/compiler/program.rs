//! Whole-program construction for the swc engine.
//!
//! Starting from the root files, every relative import and every
//! `/// <reference>` directive is followed transitively. Packages under the
//! nearest `node_modules/@types` directories are loaded as well, so their
//! `declare module` blocks (Node built-ins and the like) satisfy imports.
//! Each loaded file keeps its syntactic diagnostics (from the parser) and
//! semantic diagnostics (unresolvable imports and literal assignability
//! checks).

use super::check::check_module;
use super::parse::parse_module;
use super::{codes, Program};
use crate::config::CompilerOptions;
use crate::diagnostics::{Diagnostic, SourceFile};
use crate::paths::{normalize, DEPENDENCY_DIR};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use swc_ecma_ast::{
    CallExpr, Callee, ExportAll, Expr, ImportDecl, Lit, NamedExport, Str, TsImportEqualsDecl,
    TsModuleDecl, TsModuleName, TsModuleRef,
};
use swc_ecma_visit::{Visit, VisitWith};

/// Extensions probed for a relative import, in priority order.
const MODULE_EXTENSIONS: [&str; 3] = [".ts", ".tsx", ".d.ts"];

/// Runtime extensions that map onto TypeScript sources.
const RUNTIME_EXTENSIONS: [&str; 4] = [".js", ".jsx", ".mjs", ".cjs"];

struct ProgramFile {
    source: Arc<SourceFile>,
    syntactic: Vec<Diagnostic>,
    semantic: Vec<Diagnostic>,
}

/// An import that did not resolve to a file while loading.
struct PendingImport {
    importer: String,
    specifier: String,
    start: usize,
    length: usize,
}

/// Program built by [`SwcEngine`](super::SwcEngine).
pub struct SwcProgram {
    root_names: Vec<String>,
    files: IndexMap<String, ProgramFile>,
    global_diagnostics: Vec<Diagnostic>,
}

impl SwcProgram {
    /// Load `root_names` and everything they import. Never fails; problems
    /// become diagnostics.
    pub fn build(root_names: &[String], options: &CompilerOptions) -> Self {
        let root_names: Vec<String> = root_names.iter().map(|name| file_key(name)).collect();
        let strict_null_checks = options.strict_null_checks();
        let skip_lib_check = options.skip_lib_check.unwrap_or(false);

        let mut files: IndexMap<String, ProgramFile> = IndexMap::new();
        let mut global_diagnostics = Vec::new();
        let mut ambient_modules = Vec::new();
        let mut pending = Vec::new();

        let check_side_effect_imports = options.no_unchecked_side_effect_imports.unwrap_or(false);
        let type_dirs = type_roots(&root_names);

        let mut queue: VecDeque<(String, bool)> =
            root_names.iter().map(|name| (name.clone(), true)).collect();
        queue.extend(
            type_package_entries(&type_dirs, options.types.as_deref())
                .into_iter()
                .map(|entry| (entry, false)),
        );

        while let Some((name, is_root)) = queue.pop_front() {
            if files.contains_key(&name) {
                continue;
            }
            let text = match std::fs::read_to_string(&name) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!(file = %name, error = %e, "cannot read program file");
                    if is_root {
                        global_diagnostics.push(Diagnostic::error(
                            codes::FILE_NOT_FOUND,
                            format!("File '{name}' not found."),
                        ));
                    }
                    continue;
                }
            };
            let text = text
                .strip_prefix('\u{feff}')
                .map_or_else(|| text.clone(), str::to_string);

            let source = Arc::new(SourceFile::new(name.clone(), text));
            let parsed = parse_module(&source);

            let mut semantic = if source.is_declaration_file() && skip_lib_check {
                Vec::new()
            } else {
                check_module(&source, &parsed, strict_null_checks)
            };

            let importer_dir = Path::new(&name).parent().unwrap_or_else(|| Path::new("/"));
            for reference in reference_directives(source.text()) {
                let target = match reference {
                    Reference::Path(path) => {
                        let target = file_key(&importer_dir.join(path).to_string_lossy());
                        is_file(&target).then_some(target)
                    }
                    Reference::Types(package) => type_dirs
                        .iter()
                        .find_map(|type_root| type_package_entry(&type_root.join(package))),
                };
                if let Some(target) = target {
                    queue.push_back((target, false));
                }
            }

            if let Some(module) = &parsed.module {
                let mut collector = ImportCollector::default();
                module.visit_with(&mut collector);
                ambient_modules.extend(collector.ambient_modules);

                for import in collector.imports {
                    let resolved = if is_relative(&import.specifier) {
                        resolve_relative(&import.specifier, importer_dir)
                    } else {
                        None
                    };
                    match resolved {
                        Some(Resolved::Source(path)) => queue.push_back((path, false)),
                        Some(Resolved::Asset) => {}
                        // `import './x'` is only checked when asked for
                        None if import.side_effect_only && !check_side_effect_imports => {}
                        None => {
                            let (start, length) = parsed.range(import.span);
                            pending.push(PendingImport {
                                importer: name.clone(),
                                specifier: import.specifier,
                                start,
                                length,
                            });
                        }
                    }
                }
            }

            semantic.sort_by_key(|d| d.start);
            files.insert(
                name,
                ProgramFile {
                    source,
                    syntactic: parsed.errors,
                    semantic,
                },
            );
        }

        let lenient_bare_imports = options.base_url.is_some() || options.paths.is_some();
        // (specifier, importer directory) -> package found
        let mut package_lookups: FxHashMap<(String, String), bool> = FxHashMap::default();
        for import in pending {
            if is_declared_ambient(&import.specifier, &ambient_modules) {
                continue;
            }
            if !is_relative(&import.specifier) {
                if lenient_bare_imports {
                    continue;
                }
                let importer_dir = Path::new(&import.importer)
                    .parent()
                    .map(|dir| dir.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let found = *package_lookups
                    .entry((import.specifier.clone(), importer_dir))
                    .or_insert_with(|| package_exists(&import.specifier, &import.importer));
                if found {
                    continue;
                }
            }
            if let Some(file) = files.get_mut(&import.importer) {
                file.semantic.push(
                    Diagnostic::error(
                        codes::CANNOT_FIND_MODULE,
                        format!(
                            "Cannot find module '{}' or its corresponding type declarations.",
                            import.specifier
                        ),
                    )
                    .with_span(Arc::clone(&file.source), import.start, import.length),
                );
                file.semantic.sort_by_key(|d| d.start);
            }
        }

        tracing::debug!(
            roots = root_names.len(),
            files = files.len(),
            "program created"
        );

        Self {
            root_names,
            files,
            global_diagnostics,
        }
    }
}

impl Program for SwcProgram {
    fn root_names(&self) -> &[String] {
        &self.root_names
    }

    fn source_files(&self) -> Vec<Arc<SourceFile>> {
        self.files
            .values()
            .map(|file| Arc::clone(&file.source))
            .collect()
    }

    fn source_file(&self, file_name: &str) -> Option<Arc<SourceFile>> {
        self.files
            .get(&file_key(file_name))
            .map(|file| Arc::clone(&file.source))
    }

    fn pre_emit_diagnostics(&self, file: &SourceFile) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let entry = self.files.get(&file_key(file.file_name()));
        if let Some(entry) = entry {
            diagnostics.extend(entry.syntactic.iter().cloned());
        }
        diagnostics.extend(self.global_diagnostics.iter().cloned());
        if let Some(entry) = entry {
            diagnostics.extend(entry.semantic.iter().cloned());
        }
        diagnostics
    }
}

fn file_key(name: &str) -> String {
    normalize(Path::new(name)).to_string_lossy().into_owned()
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." || specifier == ".."
}

enum Resolved {
    /// A TypeScript file to load into the program.
    Source(String),
    /// An existing non-TypeScript file (e.g. JSON); resolved but not loaded.
    Asset,
}

fn resolve_relative(specifier: &str, importer_dir: &Path) -> Option<Resolved> {
    let base = file_key(&importer_dir.join(specifier).to_string_lossy());

    if MODULE_EXTENSIONS.iter().any(|ext| base.ends_with(ext)) && is_file(&base) {
        return Some(Resolved::Source(base));
    }
    if base.ends_with(".json") && is_file(&base) {
        return Some(Resolved::Asset);
    }

    let stem = RUNTIME_EXTENSIONS
        .iter()
        .find_map(|ext| base.strip_suffix(ext))
        .unwrap_or(&base);
    let index = format!("{}/index", base.trim_end_matches('/'));

    [stem, index.as_str()]
        .iter()
        .flat_map(|candidate| MODULE_EXTENSIONS.iter().map(move |ext| format!("{candidate}{ext}")))
        .find(|candidate| is_file(candidate))
        .map(Resolved::Source)
}

fn is_file(path: &str) -> bool {
    std::fs::metadata(path).is_ok_and(|meta| meta.is_file())
}

/// Match against `declare module "name"` and `declare module "*.ext"`.
fn is_declared_ambient(specifier: &str, ambient_modules: &[String]) -> bool {
    ambient_modules.iter().any(|declared| match declared.split_once('*') {
        Some((prefix, suffix)) => {
            specifier.len() >= prefix.len() + suffix.len()
                && specifier.starts_with(prefix)
                && specifier.ends_with(suffix)
        }
        None => declared == specifier,
    })
}

/// Whether a bare specifier names a package installed in a
/// `node_modules` directory above the importer (directly or via `@types`).
fn package_exists(specifier: &str, importer: &str) -> bool {
    let specifier = specifier.strip_prefix("node:").map_or(specifier, |_| "node");
    let mut segments = specifier.split('/');
    let package = match (segments.next(), segments.next()) {
        (Some(scope), Some(name)) if scope.starts_with('@') => format!("{scope}/{name}"),
        (Some(name), _) => name.to_string(),
        (None, _) => return false,
    };
    let types_package = package.trim_start_matches('@').replace('/', "__");

    Path::new(importer).ancestors().skip(1).any(|dir| {
        let modules = dir.join(DEPENDENCY_DIR);
        modules.join(&package).exists() || modules.join("@types").join(&types_package).exists()
    })
}

/// Directory holding `@types` packages for each root, nearest first.
fn type_roots(root_names: &[String]) -> Vec<PathBuf> {
    let mut seen = FxHashSet::default();
    let mut roots = Vec::new();
    for name in root_names {
        for dir in Path::new(name).ancestors().skip(1) {
            if !seen.insert(dir.to_path_buf()) {
                break;
            }
            let candidate = dir.join(DEPENDENCY_DIR).join("@types");
            if candidate.is_dir() {
                roots.push(candidate);
            }
        }
    }
    roots
}

/// Entry declaration files of the `@types` packages to load.
///
/// With `types` set only the listed packages are loaded; otherwise every
/// package in every type root is, the nearest copy of a name winning.
fn type_package_entries(type_roots: &[PathBuf], types: Option<&[String]>) -> Vec<String> {
    let mut loaded = FxHashSet::default();
    let mut entries = Vec::new();
    for type_root in type_roots {
        let names = match types {
            Some(types) => types.to_vec(),
            None => package_names(type_root),
        };
        for name in names {
            if loaded.contains(&name) {
                continue;
            }
            if let Some(entry) = type_package_entry(&type_root.join(&name)) {
                loaded.insert(name);
                entries.push(entry);
            }
        }
    }
    entries
}

fn package_names(type_root: &Path) -> Vec<String> {
    let Ok(read_dir) = std::fs::read_dir(type_root) else {
        return Vec::new();
    };
    let mut names: Vec<String> = read_dir
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// `types`/`typings` from the package manifest, else `index.d.ts`.
fn type_package_entry(package_dir: &Path) -> Option<String> {
    let declared = std::fs::read_to_string(package_dir.join("package.json"))
        .ok()
        .and_then(|text| serde_json::from_str::<Value>(&text).ok())
        .and_then(|manifest| {
            manifest
                .get("types")
                .or_else(|| manifest.get("typings"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });
    let entry = file_key(
        &package_dir
            .join(declared.as_deref().unwrap_or("index.d.ts"))
            .to_string_lossy(),
    );
    is_file(&entry).then_some(entry)
}

enum Reference<'a> {
    Path(&'a str),
    Types(&'a str),
}

/// `/// <reference path="..." />` and `/// <reference types="..." />`.
fn reference_directives(text: &str) -> Vec<Reference<'_>> {
    text.lines()
        .filter_map(|line| line.trim_start().strip_prefix("///"))
        .map(str::trim_start)
        .filter(|directive| directive.starts_with("<reference"))
        .filter_map(|directive| {
            attribute(directive, "path")
                .map(Reference::Path)
                .or_else(|| attribute(directive, "types").map(Reference::Types))
        })
        .collect()
}

fn attribute<'a>(directive: &'a str, name: &str) -> Option<&'a str> {
    ['"', '\''].into_iter().find_map(|quote| {
        let key = format!(" {name}={quote}");
        let start = directive.find(&key)? + key.len();
        directive[start..].split(quote).next()
    })
}

struct ImportRef {
    specifier: String,
    span: swc_common::Span,
    /// `import './x'` with no bindings.
    side_effect_only: bool,
}

#[derive(Default)]
struct ImportCollector {
    imports: Vec<ImportRef>,
    ambient_modules: Vec<String>,
}

impl ImportCollector {
    fn push(&mut self, src: &Str) {
        self.push_import(src, false);
    }

    fn push_import(&mut self, src: &Str, side_effect_only: bool) {
        self.imports.push(ImportRef {
            specifier: src.value.to_string(),
            span: src.span,
            side_effect_only,
        });
    }
}

impl Visit for ImportCollector {
    fn visit_import_decl(&mut self, import: &ImportDecl) {
        self.push_import(&import.src, import.specifiers.is_empty() && !import.type_only);
    }

    fn visit_named_export(&mut self, export: &NamedExport) {
        if let Some(src) = &export.src {
            self.push(src);
        }
    }

    fn visit_export_all(&mut self, export: &ExportAll) {
        self.push(&export.src);
    }

    fn visit_ts_import_equals_decl(&mut self, decl: &TsImportEqualsDecl) {
        if let TsModuleRef::TsExternalModuleRef(external) = &decl.module_ref {
            self.push(&external.expr);
        }
    }

    fn visit_call_expr(&mut self, call: &CallExpr) {
        if let (Callee::Import(_), Some(arg)) = (&call.callee, call.args.first()) {
            if let Expr::Lit(Lit::Str(src)) = &*arg.expr {
                self.push(src);
            }
        }
        call.visit_children_with(self);
    }

    fn visit_ts_module_decl(&mut self, decl: &TsModuleDecl) {
        if let TsModuleName::Str(name) = &decl.id {
            self.ambient_modules.push(name.value.to_string());
        }
        decl.visit_children_with(self);
    }
}
