use docchat_core::config::RagSettings;
use docchat_core::error::{DocchatError, Result};
use docchat_core::models::{PassageMatch, PromptText, Query, RagAnswer, SourceCitation};
use docchat_llm::{Embedder, Generator, OllamaEmbedder, OllamaGenerator};
use docchat_store::SimilarityIndex;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};

use crate::frame::{FrameStream, ResponseFrame};
use crate::prompt::PromptAssembler;

/// Passages retrieved per query unless configured otherwise
pub const DEFAULT_TOP_K: usize = 5;

/// Batch answer used when the model returns nothing
pub const NO_ANSWER: &str = "No answer found.";

// Frames buffered between the producer task and a slow consumer
const FRAME_CHANNEL_CAPACITY: usize = 32;

/// Query-time RAG pipeline
///
/// Holds shared handles to the backends, so clones are cheap and every clone
/// serves requests against the same index and models.
#[derive(Clone)]
pub struct RagPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn SimilarityIndex>,
    generator: Arc<dyn Generator>,
    assembler: Arc<PromptAssembler>,
    top_k: usize,
}

impl RagPipeline {
    /// Create a pipeline with the grounded prompt and [`DEFAULT_TOP_K`]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn SimilarityIndex>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
            assembler: Arc::new(PromptAssembler::default()),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Build the Ollama-backed pipeline described by `settings`
    pub fn from_settings(settings: &RagSettings, index: Arc<dyn SimilarityIndex>) -> Result<Self> {
        let embedder = OllamaEmbedder::from_settings(settings);
        let generator = OllamaGenerator::from_settings(settings)?;

        info!(
            ollama_url = %settings.ollama_url,
            embedder = %settings.embedder_model,
            generator = %settings.generator_model,
            top_k = settings.top_k,
            prompt_style = %settings.prompt_style,
            "Configured RAG pipeline"
        );

        Ok(Self::new(Arc::new(embedder), index, Arc::new(generator))
            .with_assembler(PromptAssembler::from_style(settings.prompt_style))
            .with_top_k(settings.top_k))
    }

    pub fn with_assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = Arc::new(assembler);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Check that the embedder produces vectors the index can compare against
    ///
    /// An index that has not recorded a dimension accepts any embedder.
    pub async fn verify_dimensions(&self) -> Result<()> {
        let actual = self.embedder.dimensions();
        match self.index.dimensions().await? {
            Some(expected) if expected != actual => {
                Err(DocchatError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }

    /// Answer a question, reporting failures in the answer text
    ///
    /// Never fails: any error yields a degraded answer with no sources.
    pub async fn answer_query(&self, raw_query: &str) -> RagAnswer {
        match self.try_answer_query(raw_query).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, kind = ?e.kind(), "Query failed, returning degraded answer");
                RagAnswer::degraded(e)
            }
        }
    }

    /// Answer a question, propagating the first failure
    pub async fn try_answer_query(&self, raw_query: &str) -> Result<RagAnswer> {
        let (passages, prompt) = self.retrieve(raw_query).await?;

        let answer = self.generator.generate(&prompt).await?;
        debug!(answer_len = answer.len(), "Generation finished");

        let answer = if answer.trim().is_empty() { NO_ANSWER.to_string() } else { answer };

        Ok(RagAnswer {
            answer,
            sources: citations(&passages),
        })
    }

    /// Answer a question as a stream of frames
    ///
    /// Retrieval finishes before the first frame. Dropping the returned
    /// stream stops the work in flight, including the generation request.
    /// Must be called from within a tokio runtime.
    pub fn answer_query_stream(&self, raw_query: &str) -> FrameStream {
        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);

        let pipeline = self.clone();
        let raw_query = raw_query.to_string();
        tokio::spawn(async move {
            pipeline.produce_frames(raw_query, tx).await;
        });

        Box::pin(ReceiverStream::new(rx))
    }

    async fn produce_frames(self, raw_query: String, tx: mpsc::Sender<ResponseFrame>) {
        let retrieved = tokio::select! {
            biased;
            _ = tx.closed() => {
                debug!("Stream consumer left during retrieval");
                return;
            }
            retrieved = self.retrieve(&raw_query) => retrieved,
        };

        let (passages, prompt) = match retrieved {
            Ok(retrieved) => retrieved,
            Err(e) => {
                error!(error = %e, kind = ?e.kind(), "Streaming query failed before generation");
                let _ = tx.send(ResponseFrame::Error(e.to_string())).await;
                return;
            }
        };

        if tx.send(ResponseFrame::Sources(citations(&passages))).await.is_err() {
            return;
        }

        let started = tokio::select! {
            biased;
            _ = tx.closed() => {
                debug!("Stream consumer left before generation started");
                return;
            }
            started = self.generator.generate_stream(&prompt) => started,
        };

        let mut fragments = match started {
            Ok(fragments) => fragments,
            Err(e) => {
                error!(error = %e, "Failed to start streaming generation");
                let _ = tx.send(ResponseFrame::Error(e.to_string())).await;
                return;
            }
        };

        let mut answer = String::new();
        let mut chunks = 0usize;
        loop {
            let next = tokio::select! {
                biased;
                _ = tx.closed() => {
                    debug!(chunks, "Stream consumer left during generation");
                    return;
                }
                next = fragments.next() => next,
            };

            match next {
                Some(Ok(text)) => {
                    if text.is_empty() {
                        continue;
                    }
                    answer.push_str(&text);
                    chunks += 1;
                    if tx.send(ResponseFrame::Chunk(text)).await.is_err() {
                        return;
                    }
                }
                Some(Err(e)) => {
                    error!(error = %e, chunks, "Generation failed mid-stream");
                    let _ = tx.send(ResponseFrame::Error(e.to_string())).await;
                    return;
                }
                None => break,
            }
        }

        info!(chunks, answer_len = answer.len(), "Streaming answer complete");
        let _ = tx.send(ResponseFrame::Done(answer)).await;
    }

    async fn retrieve(&self, raw_query: &str) -> Result<(Vec<PassageMatch>, PromptText)> {
        let query = Query::parse(raw_query)?;
        info!(query_len = query.as_str().len(), top_k = self.top_k, "Answering query");

        let vector = self.embedder.embed(query.as_str()).await?;
        debug!(dimensions = vector.len(), model = self.embedder.model_name(), "Embedded query");

        let mut passages = self.index.search(&vector, self.top_k).await?;
        passages.truncate(self.top_k);
        if passages.is_empty() {
            warn!("No passages retrieved, generating from an empty context");
        } else {
            debug!(
                passages = passages.len(),
                best_score = passages[0].score,
                "Retrieved passages"
            );
        }

        let prompt = self.assembler.assemble(&passages, &query);
        Ok((passages, prompt))
    }
}

fn citations(passages: &[PassageMatch]) -> Vec<SourceCitation> {
    passages.iter().map(SourceCitation::from_passage).collect()
}
