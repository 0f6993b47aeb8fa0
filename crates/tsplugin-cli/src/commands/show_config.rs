//! `tsplugin show-config`: print the finalized compiler options.

use super::{inline_compiler_options, SCHEMA_VERSION};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::Path;
use tsplugin_core::{resolve_compiler_options, CompilerOptions, DiagnosticError};

#[derive(Debug, Serialize)]
struct ConfigReport {
    schema_version: u32,
    ok: bool,
    options: Option<CompilerOptions>,
    error: Option<DiagnosticError>,
}

pub async fn run(cwd: &Path, compiler_options: Option<&str>, json: bool) -> Result<bool> {
    let inline = inline_compiler_options(compiler_options)?;
    let resolved = resolve_compiler_options(inline.as_ref(), cwd).await;
    let ok = resolved.is_ok();

    if json {
        let (options, error) = match resolved {
            Ok(options) => (Some(options), None),
            Err(error) => (None, Some(error)),
        };
        let report = ConfigReport {
            schema_version: SCHEMA_VERSION,
            ok,
            options,
            error,
        };
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        return Ok(ok);
    }

    match resolved {
        Ok(options) => {
            println!("{}", serde_json::to_string_pretty(&options).into_diagnostic()?);
        }
        Err(error) => eprintln!("{}", error.render()),
    }
    Ok(ok)
}
