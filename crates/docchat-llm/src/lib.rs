//! Docchat LLM - Embedding and generation ports
//!
//! This crate defines the ports for embedding and text generation,
//! along with the Ollama adapter implementations.

pub mod ndjson;
pub mod ollama;
pub mod ports;

// Re-export main types
pub use ollama::{OllamaEmbedder, OllamaGenerator};
pub use ports::{Embedder, FragmentStream, Generator};
