use crate::error::{DocchatError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Prompt template selected for the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    /// Answer strictly from the retrieved context
    Grounded,
    /// Short answers, admit when the context does not cover the question
    Concise,
}

impl FromStr for PromptStyle {
    type Err = DocchatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "grounded" => Ok(PromptStyle::Grounded),
            "concise" => Ok(PromptStyle::Concise),
            _ => Err(DocchatError::ConfigInvalid {
                key: "prompt_style".to_string(),
                reason: format!("Invalid prompt style: {}. Use grounded or concise", s),
            }),
        }
    }
}

impl fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptStyle::Grounded => f.write_str("grounded"),
            PromptStyle::Concise => f.write_str("concise"),
        }
    }
}

/// Layered configuration for Docchat
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub ollama_url: ConfigValue<String>,
    pub embedder_model: ConfigValue<String>,
    pub embedder_dim: ConfigValue<usize>,
    pub generator_model: ConfigValue<String>,
    pub temperature: ConfigValue<f32>,
    pub num_ctx: ConfigValue<u32>,
    pub request_timeout_secs: ConfigValue<u64>,
    pub index_path: ConfigValue<PathBuf>,
    pub top_k: ConfigValue<usize>,
    pub prompt_style: ConfigValue<PromptStyle>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            ollama_url: ConfigValue::new(
                "http://localhost:11434".to_string(),
                ConfigSource::Default,
            ),
            embedder_model: ConfigValue::new(
                "nomic-embed-text".to_string(),
                ConfigSource::Default,
            ),
            embedder_dim: ConfigValue::new(768, ConfigSource::Default),
            generator_model: ConfigValue::new("llama3.2".to_string(), ConfigSource::Default),
            temperature: ConfigValue::new(0.3, ConfigSource::Default),
            num_ctx: ConfigValue::new(2048, ConfigSource::Default),
            request_timeout_secs: ConfigValue::new(120, ConfigSource::Default),
            index_path: ConfigValue::new(
                PathBuf::from("vectorstore/index.json"),
                ConfigSource::Default,
            ),
            top_k: ConfigValue::new(5, ConfigSource::Default),
            prompt_style: ConfigValue::new(PromptStyle::Grounded, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| DocchatError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| DocchatError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(url) = file_config.ollama_url {
            self.ollama_url.update(url, ConfigSource::File);
        }
        if let Some(model) = file_config.embedder_model {
            self.embedder_model.update(model, ConfigSource::File);
        }
        if let Some(dim) = file_config.embedder_dim {
            self.embedder_dim.update(dim, ConfigSource::File);
        }
        if let Some(model) = file_config.generator_model {
            self.generator_model.update(model, ConfigSource::File);
        }
        if let Some(temperature) = file_config.temperature {
            self.temperature.update(temperature, ConfigSource::File);
        }
        if let Some(num_ctx) = file_config.num_ctx {
            self.num_ctx.update(num_ctx, ConfigSource::File);
        }
        if let Some(secs) = file_config.request_timeout_secs {
            self.request_timeout_secs.update(secs, ConfigSource::File);
        }
        if let Some(path) = file_config.index_path {
            self.index_path.update(path, ConfigSource::File);
        }
        if let Some(top_k) = file_config.top_k {
            self.top_k.update(top_k, ConfigSource::File);
        }
        if let Some(style) = file_config.prompt_style {
            self.prompt_style.update(style, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    ///
    /// Unparseable values are logged and ignored.
    pub fn load_from_env(mut self) -> Self {
        if let Ok(url) = env::var("DOCCHAT_OLLAMA_URL") {
            self.ollama_url.update(url, ConfigSource::Environment);
        }
        if let Ok(model) = env::var("DOCCHAT_EMBEDDER_MODEL") {
            self.embedder_model.update(model, ConfigSource::Environment);
        }
        if let Some(dim) = env_parse("DOCCHAT_EMBEDDER_DIM", "positive integer") {
            self.embedder_dim.update(dim, ConfigSource::Environment);
        }
        if let Ok(model) = env::var("DOCCHAT_GENERATOR_MODEL") {
            self.generator_model.update(model, ConfigSource::Environment);
        }
        if let Some(temperature) = env_parse("DOCCHAT_TEMPERATURE", "number between 0 and 2") {
            self.temperature.update(temperature, ConfigSource::Environment);
        }
        if let Some(num_ctx) = env_parse("DOCCHAT_NUM_CTX", "positive integer") {
            self.num_ctx.update(num_ctx, ConfigSource::Environment);
        }
        if let Some(secs) = env_parse("DOCCHAT_REQUEST_TIMEOUT_SECS", "number of seconds") {
            self.request_timeout_secs.update(secs, ConfigSource::Environment);
        }
        if let Ok(path) = env::var("DOCCHAT_INDEX_PATH") {
            self.index_path.update(PathBuf::from(path), ConfigSource::Environment);
        }
        if let Some(top_k) = env_parse("DOCCHAT_TOP_K", "positive integer") {
            self.top_k.update(top_k, ConfigSource::Environment);
        }
        if let Some(style) = env_parse("DOCCHAT_PROMPT_STYLE", "grounded or concise") {
            self.prompt_style.update(style, ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(url) = overrides.ollama_url {
            self.ollama_url.update(url, ConfigSource::Cli);
        }
        if let Some(model) = overrides.generator_model {
            self.generator_model.update(model, ConfigSource::Cli);
        }
        if let Some(path) = overrides.index_path {
            self.index_path.update(path, ConfigSource::Cli);
        }
        if let Some(top_k) = overrides.top_k {
            self.top_k.update(top_k, ConfigSource::Cli);
        }
        if let Some(style) = overrides.prompt_style {
            self.prompt_style.update(style, ConfigSource::Cli);
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "ollama_url".to_string(),
            (self.ollama_url.value.clone(), self.ollama_url.source),
        );
        map.insert(
            "embedder_model".to_string(),
            (self.embedder_model.value.clone(), self.embedder_model.source),
        );
        map.insert(
            "embedder_dim".to_string(),
            (self.embedder_dim.value.to_string(), self.embedder_dim.source),
        );
        map.insert(
            "generator_model".to_string(),
            (self.generator_model.value.clone(), self.generator_model.source),
        );
        map.insert(
            "temperature".to_string(),
            (self.temperature.value.to_string(), self.temperature.source),
        );
        map.insert("num_ctx".to_string(), (self.num_ctx.value.to_string(), self.num_ctx.source));
        map.insert(
            "request_timeout_secs".to_string(),
            (self.request_timeout_secs.value.to_string(), self.request_timeout_secs.source),
        );
        map.insert(
            "index_path".to_string(),
            (self.index_path.value.display().to_string(), self.index_path.source),
        );
        map.insert("top_k".to_string(), (self.top_k.value.to_string(), self.top_k.source));
        map.insert(
            "prompt_style".to_string(),
            (self.prompt_style.value.to_string(), self.prompt_style.source),
        );

        map
    }

    /// Validate and freeze the configuration for the lifetime of the process
    pub fn resolve(&self) -> Result<RagSettings> {
        require_non_empty("ollama_url", &self.ollama_url.value)?;
        require_non_empty("embedder_model", &self.embedder_model.value)?;
        require_non_empty("generator_model", &self.generator_model.value)?;

        if self.embedder_dim.value == 0 {
            return Err(invalid("embedder_dim", "must be greater than zero"));
        }
        if self.top_k.value == 0 {
            return Err(invalid("top_k", "must be greater than zero"));
        }
        if self.num_ctx.value == 0 {
            return Err(invalid("num_ctx", "must be greater than zero"));
        }
        if self.request_timeout_secs.value == 0 {
            return Err(invalid("request_timeout_secs", "must be greater than zero"));
        }
        let temperature = self.temperature.value;
        if !temperature.is_finite() || !(0.0..=2.0).contains(&temperature) {
            return Err(invalid("temperature", format!("{} is outside 0.0..=2.0", temperature)));
        }
        if self.index_path.value.as_os_str().is_empty() {
            return Err(DocchatError::ConfigMissing {
                key: "index_path".to_string(),
            });
        }

        Ok(RagSettings {
            ollama_url: self.ollama_url.value.trim_end_matches('/').to_string(),
            embedder_model: self.embedder_model.value.clone(),
            embedder_dim: self.embedder_dim.value,
            generator_model: self.generator_model.value.clone(),
            temperature,
            num_ctx: self.num_ctx.value,
            request_timeout: Duration::from_secs(self.request_timeout_secs.value),
            index_path: self.index_path.value.clone(),
            top_k: self.top_k.value,
            prompt_style: self.prompt_style.value,
        })
    }
}

/// Resolved, validated settings consumed by the query pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct RagSettings {
    /// Base URL of the Ollama server, without trailing slash
    pub ollama_url: String,
    pub embedder_model: String,
    pub embedder_dim: usize,
    pub generator_model: String,
    pub temperature: f32,
    /// Context window passed to the generation model
    pub num_ctx: u32,
    pub request_timeout: Duration,
    /// Location of the persisted similarity index snapshot
    pub index_path: PathBuf,
    /// Passages retrieved per query
    pub top_k: usize,
    pub prompt_style: PromptStyle,
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    ollama_url: Option<String>,
    embedder_model: Option<String>,
    embedder_dim: Option<usize>,
    generator_model: Option<String>,
    temperature: Option<f32>,
    num_ctx: Option<u32>,
    request_timeout_secs: Option<u64>,
    index_path: Option<PathBuf>,
    top_k: Option<usize>,
    prompt_style: Option<PromptStyle>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub ollama_url: Option<String>,
    pub generator_model: Option<String>,
    pub index_path: Option<PathBuf>,
    pub top_k: Option<usize>,
    pub prompt_style: Option<PromptStyle>,
}

fn env_parse<T: FromStr>(key: &str, expected: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {} value '{}': expected {}", key, raw, expected);
            None
        }
    }
}

fn require_non_empty(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DocchatError::ConfigMissing {
            key: key.to_string(),
        });
    }
    Ok(())
}

fn invalid(key: &str, reason: impl Into<String>) -> DocchatError {
    DocchatError::ConfigInvalid {
        key: key.to_string(),
        reason: reason.into(),
    }
}
