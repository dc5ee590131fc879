use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Query or passage embedding
///
/// The dimension is fixed by the embedding model and must equal the dimension
/// the similarity index was built with.
pub type EmbeddingVector = Vec<f32>;

/// Metadata stored alongside an indexed passage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassageMetadata {
    /// Source document identifier (e.g. `"data/policy.pdf"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Chunk identifier (e.g. `"data/policy.pdf:3:2"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Any further properties written by the ingestion pipeline
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PassageMetadata {
    pub fn with_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Identifier shown to clients: `source`, else the chunk `id`
    pub fn citation_source(&self) -> Option<&str> {
        self.source.as_deref().or(self.id.as_deref())
    }
}

/// Passage retrieved from the similarity index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageMatch {
    /// Passage text
    pub content: String,

    /// Source information
    pub metadata: PassageMetadata,

    /// Cosine distance to the query vector (lower is closer)
    pub score: f32,
}

impl PassageMatch {
    pub fn new(content: impl Into<String>, metadata: PassageMetadata, score: f32) -> Self {
        Self {
            content: content.into(),
            metadata,
            score,
        }
    }
}
