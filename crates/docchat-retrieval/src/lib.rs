//! Docchat Retrieval - Query-time RAG pipeline
//!
//! This crate turns a question into an answer: it embeds the question,
//! retrieves the closest passages, renders the prompt, runs generation
//! (whole or streamed), and frames the result for the caller.

pub mod frame;
pub mod pipeline;
pub mod prompt;

pub use frame::{FrameSequence, FrameStream, ResponseFrame, StreamFramer};
pub use pipeline::{RagPipeline, DEFAULT_TOP_K, NO_ANSWER};
pub use prompt::{PromptAssembler, PromptTemplate, CONTEXT_SEPARATOR};
