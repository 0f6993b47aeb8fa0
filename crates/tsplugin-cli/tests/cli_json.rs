//! Integration tests for `tsplugin --json` output.
//!
//! These tests verify:
//! - JSON output is always valid JSON with a schema version
//! - `ok` tracks whether errors were reported
//! - the exit status follows `ok`

use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-p", "tsplugin-cli", "--bin", "tsplugin", "--"]);
    cmd
}

fn run_json(cwd: &Path, args: &[&str]) -> (Output, serde_json::Value) {
    let output = cargo_bin()
        .args(args)
        .args(["--json", "--cwd"])
        .arg(cwd)
        .output()
        .expect("Failed to run tsplugin");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json = serde_json::from_str(&stdout).expect("Output should be valid JSON");
    (output, json)
}

#[test]
fn test_check_clean_file_is_ok() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("main.ts"), "export const n: number = 1;\n").unwrap();

    let (output, json) = run_json(dir.path(), &["check", "main.ts"]);

    assert!(output.status.success());
    assert_eq!(json["schema_version"], 1);
    assert_eq!(json["ok"], true);
    assert_eq!(json["errors"], 0);
    assert!(json["logs"].as_array().unwrap().is_empty());
}

#[test]
fn test_check_type_error_fails_with_location() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("main.ts"), "const x: number = 'a';\n").unwrap();

    let (output, json) = run_json(dir.path(), &["check", "main.ts"]);

    assert!(!output.status.success());
    assert_eq!(json["ok"], false);
    assert_eq!(json["errors"], 1);
    let log = &json["logs"][0];
    assert_eq!(log["level"], "error");
    assert_eq!(
        log["message"],
        "Type 'string' is not assignable to type 'number'."
    );
    assert_eq!(log["loc"]["line"], 1);
    assert_eq!(log["loc"]["column"], 6);
}

#[test]
fn test_transform_strips_types() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("main.ts"),
        "export function id<T>(value: T): T {\n  return value;\n}\n",
    )
    .unwrap();

    let (output, json) = run_json(dir.path(), &["transform", "main.ts"]);

    assert!(output.status.success());
    let code = json["code"].as_str().unwrap();
    assert!(code.contains("export function id(value)"));
    assert!(json["map"].is_null());
}

#[test]
fn test_resolve_reports_tsx_file() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("main.ts"), "import './view';\n").unwrap();
    std::fs::write(dir.path().join("view.tsx"), "export {};\n").unwrap();

    let (_, json) = run_json(dir.path(), &["resolve", "./view", "--from", "main.ts"]);

    let resolved = json["resolved"].as_str().unwrap();
    assert!(resolved.ends_with("view.tsx"));
}

#[test]
fn test_show_config_renders_bad_option() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("tsconfig.json"),
        "{\n  \"compilerOptions\": {\n    \"target\": \"es1999\"\n  }\n}\n",
    )
    .unwrap();

    let (output, json) = run_json(dir.path(), &["show-config"]);

    assert!(!output.status.success());
    assert_eq!(json["ok"], false);
    assert!(json["options"].is_null());
    let error = &json["error"];
    assert!(error["message"].as_str().unwrap().contains("target"));
    assert!(error["frame"].is_string());
}

#[test]
fn test_show_config_inline_options() {
    let dir = tempdir().unwrap();

    let (output, json) = run_json(
        dir.path(),
        &["show-config", "--compiler-options", r#"{"strict": true}"#],
    );

    assert!(output.status.success());
    assert_eq!(json["options"]["strict"], true);
}
