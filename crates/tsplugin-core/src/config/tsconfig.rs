//! `tsconfig.json` parsing and expansion.
//!
//! Expansion follows `extends` chains (relative/absolute paths and packages
//! under `node_modules`), detects cycles, and converts each file's
//! `compilerOptions`. Errors from a config file point into that file.

use super::jsonc::strip_jsonc;
use super::options::CompilerOptions;
use crate::diagnostics::{Diagnostic, SourceFile};
use crate::paths::{normalize, DEPENDENCY_DIR};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result of expanding a parsed config.
#[derive(Debug, Clone, Default)]
pub struct ParsedCommandLine {
    pub options: CompilerOptions,
    pub errors: Vec<Diagnostic>,
    /// Every config file that contributed, root first.
    pub config_files: Vec<PathBuf>,
}

/// Convert a raw `compilerOptions` object.
///
/// When `file` is given, each error points at the option's key in it.
#[must_use]
pub fn convert_compiler_options_from_json(
    value: &Value,
    file: Option<&Arc<SourceFile>>,
) -> (CompilerOptions, Vec<Diagnostic>) {
    let (options, errors) = CompilerOptions::from_json(value);
    let diagnostics = errors
        .into_iter()
        .map(|(name, err)| {
            let diagnostic = Diagnostic::error(err.code, err.message);
            if name == "compilerOptions" {
                attach_key(diagnostic, file, &["compilerOptions"])
            } else {
                attach_key(diagnostic, file, &["compilerOptions", &name])
            }
        })
        .collect();
    (options, diagnostics)
}

/// Parse config text as JSON with comments and trailing commas.
pub fn parse_config_file_text_to_json(
    file_name: &str,
    text: &str,
) -> Result<(Value, Arc<SourceFile>), Diagnostic> {
    let file = Arc::new(SourceFile::new(file_name, text));
    match serde_json::from_str::<Value>(&strip_jsonc(text)) {
        Ok(value) => Ok((value, file)),
        Err(e) => {
            let full = e.to_string();
            let message = full
                .rsplit_once(" at line ")
                .map_or(full.as_str(), |(msg, _)| msg);
            let start = file.position_of_line_and_character(
                e.line().saturating_sub(1),
                e.column().saturating_sub(1),
            );
            Err(Diagnostic::error(1005, capitalize(message)).with_span(file, start, 1))
        }
    }
}

/// Expand a parsed config into a full option set.
///
/// `base_path` is the directory package-style `extends` lookups start from
/// when the config file's own directory is unknown.
#[must_use]
pub fn parse_json_config_file_content(
    config: &Value,
    file: Arc<SourceFile>,
    base_path: &Path,
) -> ParsedCommandLine {
    let mut parsed = ParsedCommandLine::default();
    let root = normalize(Path::new(file.file_name()));
    let mut stack = vec![root.clone()];
    parsed.config_files.push(root);
    parsed.options = expand(config, &file, base_path, &mut stack, &mut parsed);
    parsed
}

fn expand(
    config: &Value,
    file: &Arc<SourceFile>,
    base_path: &Path,
    stack: &mut Vec<PathBuf>,
    parsed: &mut ParsedCommandLine,
) -> CompilerOptions {
    let Some(object) = config.as_object() else {
        parsed.errors.push(
            Diagnostic::error(
                5092,
                "The root value of a 'tsconfig.json' file must be an object.",
            )
            .with_file(file.clone()),
        );
        return CompilerOptions::default();
    };

    let config_dir = Path::new(file.file_name())
        .parent()
        .map_or_else(|| base_path.to_path_buf(), Path::to_path_buf);

    let mut inherited = CompilerOptions::default();
    for spec in extends_specs(object.get("extends"), file, parsed) {
        let Some(path) = resolve_extends(&config_dir, &spec) else {
            parsed.errors.push(attach_key(
                Diagnostic::error(6053, format!("File '{spec}' not found.")),
                Some(file),
                &["extends"],
            ));
            continue;
        };

        if stack.contains(&path) {
            let chain = stack
                .iter()
                .chain(std::iter::once(&path))
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            parsed.errors.push(attach_key(
                Diagnostic::error(
                    18000,
                    format!("Circularity detected while resolving configuration: {chain}"),
                ),
                Some(file),
                &["extends"],
            ));
            continue;
        }

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                parsed.errors.push(Diagnostic::error(
                    5083,
                    format!("Cannot read file '{}': {e}.", path.display()),
                ));
                continue;
            }
        };

        match parse_config_file_text_to_json(&path.display().to_string(), &text) {
            Ok((base_config, base_file)) => {
                tracing::debug!(path = %path.display(), "extending config");
                stack.push(path.clone());
                parsed.config_files.push(path);
                let base = expand(&base_config, &base_file, base_path, stack, parsed);
                stack.pop();
                inherited = base.merged_over(&inherited);
            }
            Err(diagnostic) => parsed.errors.push(diagnostic),
        }
    }

    let own = match object.get("compilerOptions") {
        Some(raw) => {
            let (options, errors) = convert_compiler_options_from_json(raw, Some(file));
            parsed.errors.extend(errors);
            options
        }
        None => CompilerOptions::default(),
    };

    own.merged_over(&inherited)
}

fn extends_specs(
    value: Option<&Value>,
    file: &Arc<SourceFile>,
    parsed: &mut ParsedCommandLine,
) -> Vec<String> {
    let invalid = || {
        attach_key(
            Diagnostic::error(
                5024,
                "Compiler option 'extends' requires a value of type string or Array.",
            ),
            Some(file),
            &["extends"],
        )
    };

    match value {
        None => Vec::new(),
        Some(Value::String(spec)) => vec![spec.clone()],
        Some(Value::Array(items)) => {
            let specs: Vec<String> = items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect();
            if specs.len() != items.len() {
                parsed.errors.push(invalid());
            }
            specs
        }
        Some(_) => {
            parsed.errors.push(invalid());
            Vec::new()
        }
    }
}

/// Locate the file an `extends` entry refers to.
fn resolve_extends(config_dir: &Path, spec: &str) -> Option<PathBuf> {
    let is_path = spec.starts_with("./")
        || spec.starts_with("../")
        || Path::new(spec).is_absolute();

    if is_path {
        let candidate = normalize(&config_dir.join(spec));
        if candidate.is_file() {
            return Some(candidate);
        }
        if !spec.ends_with(".json") {
            let with_json = PathBuf::from(format!("{}.json", candidate.display()));
            if with_json.is_file() {
                return Some(with_json);
            }
        }
        return None;
    }

    for dir in config_dir.ancestors() {
        let package = dir.join(DEPENDENCY_DIR).join(spec);
        let candidates = [
            package.clone(),
            package.join("tsconfig.json"),
            PathBuf::from(format!("{}.json", package.display())),
        ];
        if let Some(found) = candidates.into_iter().find(|c| c.is_file()) {
            return Some(normalize(&found));
        }
    }
    None
}

/// Point `diagnostic` at the key reached by `path` (object keys from the
/// root), or at the whole file when the key is not present.
fn attach_key(
    diagnostic: Diagnostic,
    file: Option<&Arc<SourceFile>>,
    path: &[&str],
) -> Diagnostic {
    let Some(file) = file else {
        return diagnostic;
    };
    match key_offset(&strip_jsonc(file.text()), path) {
        Some((start, length)) => diagnostic.with_span(file.clone(), start, length),
        None => diagnostic.with_file(file.clone()),
    }
}

/// Offset and length of the quoted key at `path`.
///
/// `text` must already be stripped of comments. Only keys of the object
/// reached by the previous segments match; string values and keys of other
/// objects never do.
fn key_offset(text: &str, path: &[&str]) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut matched = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if matched > 0 && depth <= matched {
                    return None;
                }
            }
            b'"' => {
                let start = i;
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    i += if bytes[i] == b'\\' { 2 } else { 1 };
                }
                let end = i.min(bytes.len());
                let is_key = bytes[end.saturating_add(1).min(bytes.len())..]
                    .iter()
                    .find(|b| !b.is_ascii_whitespace())
                    == Some(&b':');
                let in_scope = depth == matched + 1;
                if is_key && in_scope && text.get(start + 1..end) == Some(path[matched]) {
                    matched += 1;
                    if matched == path.len() {
                        return Some((start, end + 1 - start));
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
