use clap::{Parser, Subcommand};
use docchat_core::config::{CliConfigOverrides, PromptStyle};
use std::path::PathBuf;

/// Docchat - Question answering over your indexed documents
#[derive(Parser, Debug)]
#[command(name = "docchat")]
#[command(about = "Question answering over a pre-indexed document corpus", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (TOML); defaults to ./docchat.toml when present
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Ollama server URL
    #[arg(long, global = true, value_name = "URL")]
    pub ollama_url: Option<String>,

    /// Generation model name
    #[arg(long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Index snapshot to answer from
    #[arg(long, global = true, value_name = "PATH")]
    pub index: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a question
    Query(QueryArgs),

    /// Show the effective configuration and index status
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// The question to answer
    pub query: String,

    /// Print the answer as it is generated
    #[arg(long)]
    pub stream: bool,

    /// Number of passages to retrieve
    #[arg(long, short = 'k')]
    pub top_k: Option<usize>,

    /// Prompt template (grounded or concise)
    #[arg(long)]
    pub style: Option<PromptStyle>,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Skip opening the index snapshot
    #[arg(long)]
    pub no_index: bool,
}

impl Cli {
    /// Configuration overrides given on the command line
    pub fn overrides(&self) -> CliConfigOverrides {
        let (top_k, prompt_style) = match &self.command {
            Commands::Query(args) => (args.top_k, args.style),
            Commands::Inspect(_) => (None, None),
        };

        CliConfigOverrides {
            ollama_url: self.ollama_url.clone(),
            generator_model: self.model.clone(),
            index_path: self.index.clone(),
            top_k,
            prompt_style,
        }
    }
}
