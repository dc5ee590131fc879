use serde::{Deserialize, Serialize};

use super::SourceCitation;

/// Prefix of every degraded batch answer
pub const ERROR_ANSWER_PREFIX: &str = "Error processing your query:";

/// Batch response: the generated answer and the passages it was grounded on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<SourceCitation>,
}

impl RagAnswer {
    /// Well-formed answer that carries an error description instead of model output
    pub fn degraded(description: impl std::fmt::Display) -> Self {
        Self {
            answer: format!("{} {}", ERROR_ANSWER_PREFIX, description),
            sources: Vec::new(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.sources.is_empty() && self.answer.starts_with(ERROR_ANSWER_PREFIX)
    }
}
