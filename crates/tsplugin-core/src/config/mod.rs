//! Compiler configuration: typed options plus `tsconfig.json` discovery.
//!
//! [`resolve_compiler_options`] is the single entry point used by the
//! plugin. It picks the inline options when given, otherwise reads
//! `tsconfig.json` from the working directory, and layers the result over
//! [`CompilerOptions::baseline`].

pub mod jsonc;
pub mod options;
pub mod tsconfig;

pub use options::{
    CompilerOptions, JsxEmit, ModuleKind, ModuleResolutionKind, OptionEnum, OptionError,
    ScriptTarget,
};
pub use tsconfig::{
    convert_compiler_options_from_json, parse_config_file_text_to_json,
    parse_json_config_file_content, ParsedCommandLine,
};

use crate::diagnostics::{print_diagnostics, Diagnostic, DiagnosticError};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::Path;

/// Fixed name of the config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "tsconfig.json";

/// Resolve the effective compiler options for a build.
///
/// `inline` wins when present. Otherwise `tsconfig.json` is read from
/// `cwd`; a missing file yields the baseline alone. Any conversion, read or
/// parse problem is returned as the first [`DiagnosticError`].
pub async fn resolve_compiler_options(
    inline: Option<&Value>,
    cwd: &Path,
) -> Result<CompilerOptions, DiagnosticError> {
    let explicit = if let Some(inline) = inline {
        tracing::debug!("using inline compiler options");
        let (options, errors) = convert_compiler_options_from_json(inline, None);
        print_diagnostics(&errors, None)?;
        options
    } else {
        let path = cwd.join(CONFIG_FILE_NAME);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                tracing::debug!(path = %path.display(), "reading compiler options from config file");
                let file_name = path.display().to_string();
                let (config, file) = parse_config_file_text_to_json(&file_name, &text)
                    .map_err(|diagnostic| DiagnosticError::from_diagnostic(&diagnostic))?;
                // `extends` expansion reads and probes files synchronously
                let base_path = cwd.to_path_buf();
                let parsed = tokio::task::spawn_blocking(move || {
                    parse_json_config_file_content(&config, file, &base_path)
                })
                .await
                .map_err(|e| {
                    DiagnosticError::from_diagnostic(&Diagnostic::error(
                        5083,
                        format!("Cannot expand '{file_name}': {e}."),
                    ))
                })?;
                print_diagnostics(&parsed.errors, None)?;
                parsed.options
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using baseline options");
                CompilerOptions::default()
            }
            Err(e) => {
                let diagnostic = Diagnostic::error(
                    5083,
                    format!("Cannot read file '{}': {e}.", path.display()),
                );
                return Err(DiagnosticError::from_diagnostic(&diagnostic));
            }
        }
    };

    Ok(explicit.merged_over(&CompilerOptions::baseline()))
}
