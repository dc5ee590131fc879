//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use docchat_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig, PromptStyle};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

const ENV_KEYS: &[&str] = &[
    "DOCCHAT_OLLAMA_URL",
    "DOCCHAT_EMBEDDER_MODEL",
    "DOCCHAT_EMBEDDER_DIM",
    "DOCCHAT_GENERATOR_MODEL",
    "DOCCHAT_TEMPERATURE",
    "DOCCHAT_NUM_CTX",
    "DOCCHAT_REQUEST_TIMEOUT_SECS",
    "DOCCHAT_INDEX_PATH",
    "DOCCHAT_TOP_K",
    "DOCCHAT_PROMPT_STYLE",
];

fn clear_env() {
    for key in ENV_KEYS {
        env::remove_var(key);
    }
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", content).unwrap();
    file
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let file = config_file(
        r#"
generator_model = "file-model"
top_k = 3
"#,
    );

    env::set_var("DOCCHAT_GENERATOR_MODEL", "env-model");

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.generator_model.value, "env-model");
    assert_eq!(config.generator_model.source, ConfigSource::Environment);
    // Not set in env, file value stays
    assert_eq!(config.top_k.value, 3);
    assert_eq!(config.top_k.source, ConfigSource::File);

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env();
    env::set_var("DOCCHAT_TOP_K", "7");
    env::set_var("DOCCHAT_INDEX_PATH", "/data/env-index.json");

    let mut config = LayeredConfig::with_defaults().load_from_env();
    config.update_from_cli(CliConfigOverrides {
        top_k: Some(2),
        ..Default::default()
    });

    assert_eq!(config.top_k.value, 2);
    assert_eq!(config.top_k.source, ConfigSource::Cli);
    assert_eq!(config.index_path.value, PathBuf::from("/data/env-index.json"));
    assert_eq!(config.index_path.source, ConfigSource::Environment);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_env_values_are_ignored() {
    clear_env();
    env::set_var("DOCCHAT_TOP_K", "many");
    env::set_var("DOCCHAT_TEMPERATURE", "hot");
    env::set_var("DOCCHAT_PROMPT_STYLE", "verbose");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.top_k.value, 5);
    assert_eq!(config.top_k.source, ConfigSource::Default);
    assert_eq!(config.temperature.source, ConfigSource::Default);
    assert_eq!(config.prompt_style.value, PromptStyle::Grounded);

    clear_env();
}

#[test]
#[serial]
fn test_full_stack_resolves() {
    clear_env();
    let file = config_file(
        r#"
ollama_url = "http://models.internal:11434"
embedder_model = "mxbai-embed-large"
embedder_dim = 1024
num_ctx = 4096
"#,
    );
    env::set_var("DOCCHAT_PROMPT_STYLE", "concise");

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();
    config.update_from_cli(CliConfigOverrides {
        generator_model: Some("llama3".to_string()),
        ..Default::default()
    });

    let settings = config.resolve().unwrap();
    assert_eq!(settings.ollama_url, "http://models.internal:11434");
    assert_eq!(settings.embedder_model, "mxbai-embed-large");
    assert_eq!(settings.embedder_dim, 1024);
    assert_eq!(settings.num_ctx, 4096);
    assert_eq!(settings.prompt_style, PromptStyle::Concise);
    assert_eq!(settings.generator_model, "llama3");

    clear_env();
}

#[test]
fn test_missing_file_is_an_error() {
    let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/docchat.toml");
    assert!(result.is_err());
}
