pub mod answer;
pub mod citation;
pub mod passage;
pub mod prompt;
pub mod query;

pub use answer::{RagAnswer, ERROR_ANSWER_PREFIX};
pub use citation::{preview, SourceCitation, PREVIEW_CHARS, TRUNCATION_MARKER};
pub use passage::{EmbeddingVector, PassageMatch, PassageMetadata};
pub use prompt::PromptText;
pub use query::Query;
