//! Integration tests for the docchat binary
//!
//! None of these reach a model server: they cover configuration, index
//! loading and the failures that happen before the first backend call.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const SNAPSHOT: &str = r#"{
  "dimensions": 2,
  "entries": [
    {"content": "Refunds are accepted within 30 days.", "metadata": {"source": "policy.pdf#3"}, "vector": [1.0, 0.0]},
    {"content": "Items must be unused.", "metadata": {"id": "policy.pdf:7:0"}, "vector": [0.0, 1.0]}
  ]
}"#;

fn workspace(with_index: bool) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    if with_index {
        std::fs::write(dir.path().join("index.json"), SNAPSHOT).unwrap();
    }
    std::fs::write(
        dir.path().join("settings.toml"),
        "index_path = \"index.json\"\ngenerator_model = \"test-model\"\n",
    )
    .unwrap();
    dir
}

fn docchat(dir: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_docchat"));
    command.current_dir(dir).args(["--config", "settings.toml"]).args(args);
    for (key, _) in std::env::vars() {
        if key.starts_with("DOCCHAT_") {
            command.env_remove(key);
        }
    }
    command.output().expect("Failed to execute command")
}

#[test]
fn test_inspect_json_reports_sources_and_index() {
    let dir = workspace(true);
    let output = docchat(dir.path(), &["inspect", "--json"]);
    assert!(output.status.success());

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");
    assert_eq!(parsed["status"], "success");

    let data = &parsed["data"];
    assert_eq!(data["config_file"], "settings.toml");
    assert_eq!(data["index"]["loaded"], true);
    assert_eq!(data["index"]["passages"], 2);
    assert_eq!(data["index"]["dimensions"], 2);

    let settings = data["settings"].as_array().unwrap();
    let model = settings.iter().find(|e| e["key"] == "generator_model").unwrap();
    assert_eq!(model["value"], "test-model");
    assert_eq!(model["source"], "File");
    let top_k = settings.iter().find(|e| e["key"] == "top_k").unwrap();
    assert_eq!(top_k["source"], "Default");
}

#[test]
fn test_inspect_survives_missing_index() {
    let dir = workspace(false);
    let output = docchat(dir.path(), &["inspect", "--json"]);
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["data"]["index"]["loaded"], false);
    assert!(parsed["data"]["index"]["error"].as_str().unwrap().contains("index.json"));
}

#[test]
fn test_cli_flag_overrides_config_file() {
    let dir = workspace(true);
    let output = docchat(dir.path(), &["inspect", "--json", "--no-index", "--model", "cli-model"]);
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let settings = parsed["data"]["settings"].as_array().unwrap();
    let model = settings.iter().find(|e| e["key"] == "generator_model").unwrap();
    assert_eq!(model["value"], "cli-model");
    assert_eq!(model["source"], "Cli");
    assert!(parsed["data"].get("index").is_none());
}

#[test]
fn test_query_without_index_fails() {
    let dir = workspace(false);
    let output = docchat(dir.path(), &["query", "What is the refund policy?"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("index"), "stderr was: {}", stderr);
}

#[test]
fn test_blank_question_fails_before_any_backend_call() {
    let dir = workspace(true);
    let output = docchat(dir.path(), &["query", "   ", "--json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid input"));
}

#[test]
fn test_streamed_blank_question_emits_one_error_frame() {
    let dir = workspace(true);
    let output = docchat(dir.path(), &["query", "   ", "--stream", "--json"]);
    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1);

    let frame: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(frame["type"], "error");
}
