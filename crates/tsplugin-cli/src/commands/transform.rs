//! `tsplugin transform`: check and transpile a single file.

use super::{plugin_options, print_logs, LogRecord, SCHEMA_VERSION};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tsplugin_core::paths::absolutize;
use tsplugin_core::{Error, InputOptions, Plugin, PluginContext, TypeScriptPlugin};

#[derive(Debug, Serialize)]
struct TransformReport {
    schema_version: u32,
    ok: bool,
    id: String,
    /// `None` when the plugin declined the file.
    code: Option<String>,
    map: Option<Value>,
    logs: Vec<LogRecord>,
}

pub async fn run(
    cwd: &Path,
    file: &str,
    map: bool,
    compiler_options: Option<&str>,
    json: bool,
) -> Result<bool> {
    let plugin = TypeScriptPlugin::new(cwd, plugin_options(compiler_options, false)?);
    // The file is its own entry so it takes part in the program.
    plugin
        .options(&InputOptions::new(file))
        .map_err(Error::from)
        .into_diagnostic()?;

    let path = absolutize(Path::new(file), cwd);
    let id = path.to_string_lossy().into_owned();
    let code = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| Error::read(&path, e))
        .into_diagnostic()?;

    let ctx = PluginContext::new(cwd.to_path_buf());
    let result = plugin
        .transform(&code, &id, &ctx)
        .await
        .map_err(Error::from)
        .into_diagnostic()?;
    let logs = ctx.logs();
    let ok = ctx.error_count() == 0;

    if json {
        let (code, source_map) = match result {
            Some(result) => (Some(result.code), result.map.filter(|_| map)),
            None => (None, None),
        };
        let report = TransformReport {
            schema_version: SCHEMA_VERSION,
            ok,
            id,
            code,
            map: source_map,
            logs: logs.iter().map(LogRecord::from).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        return Ok(ok);
    }

    print_logs(&logs);
    match result {
        Some(result) => {
            print!("{}", result.code);
            if map {
                match &result.map {
                    Some(source_map) => println!("\n{source_map}"),
                    None => eprintln!("no source map emitted (enable sourceMap in compiler options)"),
                }
            }
        }
        None => {
            eprintln!("{id} is not a TypeScript file, nothing to do");
            print!("{code}");
        }
    }

    Ok(ok)
}
