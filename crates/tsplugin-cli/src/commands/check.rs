//! `tsplugin check`: run the plugin over a set of entry inputs.
//!
//! Mirrors a bundler build: `options` declares the inputs, `buildStart`
//! runs, each input goes through `transform`, and `buildEnd` decides
//! whether the build succeeded.

use super::{plugin_options, print_logs, LogRecord, SCHEMA_VERSION};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::Path;
use tsplugin_core::paths::absolutize;
use tsplugin_core::{BuildContext, Error, InputOptions, PluginContainer, TypeScriptPlugin};

#[derive(Debug, Serialize)]
struct CheckReport {
    schema_version: u32,
    ok: bool,
    files: Vec<String>,
    errors: usize,
    warnings: usize,
    logs: Vec<LogRecord>,
}

pub async fn run(
    cwd: &Path,
    inputs: Vec<String>,
    compiler_options: Option<&str>,
    check_unlisted: bool,
    json: bool,
) -> Result<bool> {
    let options = plugin_options(compiler_options, check_unlisted)?;
    let mut container = PluginContainer::new(cwd.to_path_buf());
    container.add(Box::new(TypeScriptPlugin::new(cwd, options)));

    container
        .options(&InputOptions::new(inputs.clone()))
        .map_err(Error::from)
        .into_diagnostic()?;
    container
        .build_start()
        .await
        .map_err(Error::from)
        .into_diagnostic()?;

    for input in &inputs {
        let path = absolutize(Path::new(input), cwd);
        let code = match tokio::fs::read_to_string(&path).await {
            Ok(code) => code,
            Err(e) => {
                container
                    .context()
                    .error(&Error::read(&path, e).to_string(), None);
                continue;
            }
        };
        // Failures are recorded on the context and fail `build_end`; keep
        // going so every input is checked.
        if let Err(e) = container.transform(&code, &path.to_string_lossy()).await {
            tracing::debug!(error = %e, "transform failed");
        }
    }

    let build = container.build_end().await;
    let ctx = container.context();
    let logs = ctx.logs();

    if json {
        let report = CheckReport {
            schema_version: SCHEMA_VERSION,
            ok: build.is_ok(),
            files: inputs,
            errors: ctx.error_count(),
            warnings: ctx.warnings().len(),
            logs: logs.iter().map(LogRecord::from).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
    } else {
        print_logs(&logs);
        println!(
            "checked {} file(s): {} error(s), {} warning(s)",
            inputs.len(),
            ctx.error_count(),
            ctx.warnings().len()
        );
    }

    Ok(build.is_ok())
}
