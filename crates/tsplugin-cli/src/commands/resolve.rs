//! `tsplugin resolve`: show how the plugin resolves one import.

use super::SCHEMA_VERSION;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::Path;
use tsplugin_core::paths::absolutize;
use tsplugin_core::{Error, PluginContainer, TypeScriptPlugin, TypeScriptPluginOptions};

#[derive(Debug, Serialize)]
struct ResolveReport<'a> {
    schema_version: u32,
    specifier: &'a str,
    importer: String,
    /// `None` means the bundler's default resolution applies.
    resolved: Option<String>,
}

pub async fn run(cwd: &Path, specifier: &str, from: &str, json: bool) -> Result<bool> {
    let mut container = PluginContainer::new(cwd.to_path_buf());
    container.add(Box::new(TypeScriptPlugin::new(
        cwd,
        TypeScriptPluginOptions::default(),
    )));

    let importer = absolutize(Path::new(from), cwd)
        .to_string_lossy()
        .into_owned();
    let resolved = container
        .resolve_id(specifier, Some(&importer))
        .await
        .map_err(Error::from)
        .into_diagnostic()?
        .map(|result| result.id);

    if json {
        let report = ResolveReport {
            schema_version: SCHEMA_VERSION,
            specifier,
            importer,
            resolved,
        };
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
    } else {
        match resolved {
            Some(path) => println!("{path}"),
            None => println!("{specifier}: default resolution"),
        }
    }

    Ok(true)
}
