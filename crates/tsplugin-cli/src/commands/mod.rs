pub mod check;
pub mod resolve;
pub mod show_config;
pub mod transform;
pub mod version;

use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Serialize;
use serde_json::Value;
use tsplugin_core::{BuildLog, Location, LogLevel, TypeScriptPluginOptions};

/// JSON schema version shared by every `--json` report.
pub const SCHEMA_VERSION: u32 = 1;

/// Parse `--compiler-options` into a JSON object.
pub fn inline_compiler_options(raw: Option<&str>) -> Result<Option<Value>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(raw)
        .into_diagnostic()
        .wrap_err("--compiler-options is not valid JSON")?;
    if !value.is_object() {
        return Err(miette::miette!("--compiler-options must be a JSON object"));
    }
    Ok(Some(value))
}

/// Plugin options for a CLI run.
pub fn plugin_options(
    compiler_options: Option<&str>,
    check_unlisted_files: bool,
) -> Result<TypeScriptPluginOptions> {
    Ok(TypeScriptPluginOptions {
        compiler_options: inline_compiler_options(compiler_options)?,
        check_unlisted_files,
    })
}

/// A build log as it appears in JSON reports.
#[derive(Debug, Serialize)]
pub struct LogRecord {
    pub level: &'static str,
    pub message: String,
    pub loc: Option<Location>,
}

impl From<&BuildLog> for LogRecord {
    fn from(log: &BuildLog) -> Self {
        Self {
            level: level_name(log.level),
            message: log.message.clone(),
            loc: log.loc.clone(),
        }
    }
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Warn => "warning",
        LogLevel::Error => "error",
    }
}

/// Print recorded logs for humans, one per line, on stderr.
pub fn print_logs(logs: &[BuildLog]) {
    for log in logs {
        eprintln!("{}: {log}", level_name(log.level));
    }
}
