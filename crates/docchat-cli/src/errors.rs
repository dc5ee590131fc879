use console::style;
use docchat_core::error::{DocchatError, ErrorKind};
use std::fmt;

use crate::output::OutputWriter;

/// Error with suggestions for the user
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<&DocchatError> for CliError {
    fn from(err: &DocchatError) -> Self {
        let base = CliError::new(err.to_string());
        match err.kind() {
            ErrorKind::InvalidInput => base.with_suggestion("Ask a non-empty question"),
            ErrorKind::EmbeddingFailure => base
                .with_suggestion("Start Ollama: ollama serve")
                .with_suggestion("Check --ollama-url or DOCCHAT_OLLAMA_URL"),
            ErrorKind::IndexUnavailable => base
                .with_suggestion("Build the index snapshot with the ingestion pipeline")
                .with_suggestion("Point --index or DOCCHAT_INDEX_PATH at an existing snapshot"),
            ErrorKind::DimensionMismatch => base
                .with_context("The embedding model differs from the one the index was built with.")
                .with_suggestion(
                    "Set embedder_model and embedder_dim to the values used at ingestion",
                ),
            ErrorKind::GenerationFailed => base
                .with_suggestion("Pull the generation model: ollama pull <model>")
                .with_suggestion("Check --model or DOCCHAT_GENERATOR_MODEL"),
            ErrorKind::Configuration => base.with_suggestion("Run: docchat inspect"),
            ErrorKind::Internal => base,
        }
    }
}

/// Print a failed command's error in the active output format
pub fn report(err: &anyhow::Error, output: &OutputWriter) {
    let docchat = err.chain().find_map(|cause| cause.downcast_ref::<DocchatError>());

    if output.is_json() {
        output.error(format!("{:#}", err));
        return;
    }

    match docchat {
        Some(cause) => {
            let mut cli_error = CliError::from(cause);
            if err.to_string() != cause.to_string() {
                cli_error = cli_error.with_context(format!("{:#}", err));
            }
            cli_error.display();
        }
        None => output.error(format!("{:#}", err)),
    }
}
