//! LLM port definitions

use async_trait::async_trait;
use docchat_core::error::Result;
use docchat_core::models::{EmbeddingVector, PromptText};
use futures::Stream;
use std::pin::Pin;

/// Incremental generation output
///
/// Yields text fragments in emission order and ends when the backend signals
/// completion. A backend failure mid-generation is yielded as an `Err` item,
/// after which the stream ends. Dropping the stream abandons the backend call.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Port for embedding text into vector representations
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text
    ///
    /// Fails with `InvalidInput` for empty text and `EmbedderUnavailable` when
    /// the model cannot be reached or answers with something unusable.
    async fn embed(&self, text: &str) -> Result<EmbeddingVector>;

    /// Get the dimensionality of embeddings produced by this embedder
    fn dimensions(&self) -> usize;

    /// Get the name/identifier of the embedding model
    fn model_name(&self) -> &str;
}

/// Port for text generation
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate the complete answer for a prompt
    async fn generate(&self, prompt: &PromptText) -> Result<String>;

    /// Start an incremental generation
    ///
    /// Every call issues an independent backend request.
    async fn generate_stream(&self, prompt: &PromptText) -> Result<FragmentStream>;

    /// Get the name/identifier of the generation model
    fn model_name(&self) -> &str;
}
