use async_trait::async_trait;
use docchat_core::config::RagSettings;
use docchat_core::error::{DocchatError, Result};
use docchat_core::models::{EmbeddingVector, PromptText};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use std::time::Duration;

use crate::ndjson::LineBuffer;
use crate::ports::{Embedder, FragmentStream, Generator};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Ollama embedder implementation
pub struct OllamaEmbedder {
    /// Base URL for Ollama API (e.g., "http://localhost:11434")
    base_url: String,

    /// Model name to use for embeddings
    model: String,

    /// Embedding dimensions (model-specific)
    dimensions: usize,

    /// Per-request timeout
    timeout: Duration,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            dimensions,
            timeout: DEFAULT_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    /// Create with default localhost URL
    pub fn localhost(model: impl Into<String>, dimensions: usize) -> Self {
        Self::new("http://localhost:11434", model, dimensions)
    }

    pub fn from_settings(settings: &RagSettings) -> Self {
        Self::new(&settings.ollama_url, &settings.embedder_model, settings.embedder_dim)
            .with_timeout(settings.request_timeout)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn unavailable(&self, reason: String) -> DocchatError {
        DocchatError::EmbedderUnavailable {
            reason,
            remediation: format!(
                "Ensure Ollama is running at {} and the model '{}' is available. \
                 Run 'ollama pull {}' to download the model.",
                self.base_url, self.model, self.model
            ),
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        if text.trim().is_empty() {
            return Err(DocchatError::invalid_input("cannot embed empty text"));
        }

        let request = OllamaEmbedRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.unavailable(format!("Failed to connect to Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DocchatError::EmbedderUnavailable {
                reason: format!("Ollama API error ({}): {}", status, error_text),
                remediation: format!(
                    "Check that the model '{}' is available. Run 'ollama list' to see installed models.",
                    self.model
                ),
            });
        }

        let embed_response: OllamaEmbedResponse = response.json().await.map_err(|e| {
            DocchatError::EmbedderUnavailable {
                reason: format!("Failed to parse Ollama response: {}", e),
                remediation: "Check Ollama API compatibility".to_string(),
            }
        })?;

        if embed_response.embedding.is_empty() {
            return Err(self.unavailable("Ollama returned an empty embedding".to_string()));
        }

        Ok(embed_response.embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Ollama text generation implementation
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    options: GenerateOptions,

    /// Whole-request limit for blocking generation, idle limit between stream chunks
    timeout: Duration,

    client: reqwest::Client,
}

impl OllamaGenerator {
    /// Create a new Ollama generator
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| DocchatError::generation_failed(format!("HTTP client setup: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            model: model.into(),
            options: GenerateOptions {
                temperature: 0.3,
                num_ctx: 2048,
            },
            timeout: DEFAULT_TIMEOUT,
            client,
        })
    }

    pub fn from_settings(settings: &RagSettings) -> Result<Self> {
        Ok(Self::new(&settings.ollama_url, &settings.generator_model)?
            .with_sampling(settings.temperature, settings.num_ctx)
            .with_timeout(settings.request_timeout))
    }

    pub fn with_sampling(mut self, temperature: f32, num_ctx: u32) -> Self {
        self.options = GenerateOptions {
            temperature,
            num_ctx,
        };
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn request<'a>(&'a self, prompt: &'a PromptText, stream: bool) -> OllamaGenerateRequest<'a> {
        OllamaGenerateRequest {
            model: &self.model,
            prompt: prompt.as_str(),
            stream,
            options: &self.options,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DocchatError::generation_failed(format!(
                    "Ollama did not answer within {}s",
                    self.timeout.as_secs()
                ))
            } else {
                DocchatError::generation_failed(format!(
                    "Failed to connect to Ollama at {}: {}",
                    self.base_url, e
                ))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DocchatError::generation_failed(format!(
                "Ollama API error ({}) for model '{}': {}",
                status, self.model, error_text
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, prompt: &PromptText) -> Result<String> {
        let request = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.timeout)
            .json(&self.request(prompt, false));

        let response = self.send(request).await?;

        let body: OllamaGenerateChunk = response.json().await.map_err(|e| {
            DocchatError::generation_failed(format!("Failed to parse Ollama response: {}", e))
        })?;

        if let Some(error) = body.error {
            return Err(DocchatError::generation_failed(error));
        }
        if body.done == Some(false) {
            return Err(DocchatError::generation_failed("Ollama returned an incomplete response"));
        }

        body.response.ok_or_else(|| {
            DocchatError::generation_failed("Ollama response has no 'response' field")
        })
    }

    async fn generate_stream(&self, prompt: &PromptText) -> Result<FragmentStream> {
        let request = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&self.request(prompt, true));

        let response = self.send(request).await?;

        tracing::debug!(model = %self.model, "Ollama generation stream opened");

        Ok(parse_generate_stream(response.bytes_stream(), self.timeout))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Turn an Ollama `/api/generate` NDJSON body into a fragment stream
///
/// The stream yields an error if the body reports one, contains a line that is
/// not a generate chunk, or ends before a chunk with `"done": true`. A body that
/// sends nothing for `idle_timeout` is reported as a failed generation.
pub fn parse_generate_stream<S, B, E>(body: S, idle_timeout: Duration) -> FragmentStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = StreamState {
        body: Box::pin(body),
        lines: LineBuffer::new(),
        pending: VecDeque::new(),
        idle_timeout,
        eof: false,
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if state.finished {
                return None;
            }

            if let Some(line) = state.pending.pop_front() {
                let chunk: OllamaGenerateChunk = match serde_json::from_str(&line) {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        state.finished = true;
                        let err = DocchatError::generation_failed(format!(
                            "Malformed line in Ollama stream: {}",
                            e
                        ));
                        return Some((Err(err), state));
                    }
                };

                if let Some(error) = chunk.error {
                    state.finished = true;
                    return Some((Err(DocchatError::generation_failed(error)), state));
                }

                if chunk.done == Some(true) {
                    state.finished = true;
                }

                match chunk.response {
                    Some(text) if !text.is_empty() => return Some((Ok(text), state)),
                    _ => continue,
                }
            }

            if state.eof {
                state.finished = true;
                let err = DocchatError::generation_failed(
                    "Ollama stream ended before the model signalled completion",
                );
                return Some((Err(err), state));
            }

            let next = match tokio::time::timeout(state.idle_timeout, state.body.next()).await {
                Ok(next) => next,
                Err(_) => {
                    state.finished = true;
                    let err = DocchatError::generation_failed(format!(
                        "No output from Ollama for {}s",
                        state.idle_timeout.as_secs()
                    ));
                    return Some((Err(err), state));
                }
            };

            match next {
                Some(Ok(bytes)) => {
                    let lines = state.lines.push(bytes.as_ref());
                    state.pending.extend(lines);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    let err = DocchatError::generation_failed(format!(
                        "Ollama stream interrupted: {}",
                        e
                    ));
                    return Some((Err(err), state));
                }
                None => {
                    state.eof = true;
                    state.pending.extend(state.lines.finish());
                }
            }
        }
    }))
}

struct StreamState<S> {
    body: Pin<Box<S>>,
    lines: LineBuffer,
    pending: VecDeque<String>,
    idle_timeout: Duration,
    eof: bool,
    finished: bool,
}

/// Request body for Ollama embeddings API
#[derive(Debug, Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response from Ollama embeddings API
#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embedding: Vec<f32>,
}

/// Sampling options for Ollama generate API
#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_ctx: u32,
}

/// Request body for Ollama generate API
#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a GenerateOptions,
}

/// One generate response object (whole body, or one NDJSON line when streaming)
#[derive(Debug, Deserialize)]
struct OllamaGenerateChunk {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchat_core::config::LayeredConfig;
    use docchat_core::error::ErrorKind;
    use futures::stream;

    const IDLE: Duration = Duration::from_secs(5);

    fn body(chunks: &[&str]) -> impl Stream<Item = std::result::Result<Vec<u8>, String>> {
        let chunks: Vec<_> = chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect();
        stream::iter(chunks)
    }

    fn parse(chunks: &[&str]) -> FragmentStream {
        parse_generate_stream(body(chunks), IDLE)
    }

    async fn collect(stream: FragmentStream) -> Vec<Result<String>> {
        stream.collect().await
    }

    #[test]
    fn test_ollama_embedder_creation() {
        let embedder = OllamaEmbedder::localhost("nomic-embed-text", 768);
        assert_eq!(embedder.model_name(), "nomic-embed-text");
        assert_eq!(embedder.dimensions(), 768);
    }

    #[test]
    fn test_ollama_embedder_custom_url() {
        let embedder = OllamaEmbedder::new("http://custom:11434", "test-model", 512);
        assert_eq!(embedder.base_url, "http://custom:11434");
        assert_eq!(embedder.model_name(), "test-model");
        assert_eq!(embedder.dimensions(), 512);
    }

    #[test]
    fn test_generator_from_settings() {
        let settings = LayeredConfig::with_defaults().resolve().unwrap();
        let generator = OllamaGenerator::from_settings(&settings).unwrap();
        assert_eq!(generator.model_name(), "llama3.2");
        assert_eq!(generator.options.num_ctx, 2048);
        assert_eq!(generator.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_generate_request_shape() {
        let generator = OllamaGenerator::new("http://localhost:11434", "llama3.2")
            .unwrap()
            .with_sampling(0.3, 2048);
        let prompt = PromptText::new("Question?");
        let json = serde_json::to_value(generator.request(&prompt, true)).unwrap();
        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["prompt"], "Question?");
        assert_eq!(json["stream"], true);
        assert_eq!(json["options"]["num_ctx"], 2048);
    }

    #[tokio::test]
    async fn test_embed_rejects_empty_text() {
        let embedder = OllamaEmbedder::localhost("nomic-embed-text", 768);
        let err = embedder.embed("   ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_embed_unreachable_server() {
        // Port 9 (discard) is closed on test machines
        let embedder = OllamaEmbedder::new("http://127.0.0.1:9", "nomic-embed-text", 768);
        let err = embedder.embed("hello").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmbeddingFailure);
    }

    #[tokio::test]
    async fn test_stream_yields_fragments_in_order() {
        let stream = parse(&[
            "{\"response\":\"Refunds \",\"done\":false}\n{\"respon",
            "se\":\"take 30\",\"done\":false}\n",
            "{\"response\":\" days.\",\"done\":false}\n{\"response\":\"\",\"done\":true}\n",
        ]);

        let fragments: Vec<String> =
            collect(stream).await.into_iter().map(|f| f.unwrap()).collect();
        assert_eq!(fragments, vec!["Refunds ", "take 30", " days."]);
    }

    #[tokio::test]
    async fn test_stream_final_line_without_newline() {
        let stream = parse(&[
            "{\"response\":\"ok\",\"done\":false}\n",
            "{\"response\":\"\",\"done\":true}",
        ]);
        let items = collect(stream).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_stream_truncation_is_an_error() {
        let stream = parse(&[
            "{\"response\":\"partial\",\"done\":false}\n",
        ]);
        let items = collect(stream).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "partial");
        assert_eq!(items[1].as_ref().unwrap_err().kind(), ErrorKind::GenerationFailed);
    }

    #[tokio::test]
    async fn test_stream_error_line() {
        let stream = parse(&[
            "{\"response\":\"a\",\"done\":false}\n{\"error\":\"model runner crashed\"}\n",
            "{\"response\":\"never\",\"done\":false}\n",
        ]);
        let items = collect(stream).await;
        assert_eq!(items.len(), 2);
        let err = items[1].as_ref().unwrap_err();
        assert!(err.to_string().contains("model runner crashed"));
    }

    #[tokio::test]
    async fn test_stream_transport_error() {
        let chunks: Vec<std::result::Result<Vec<u8>, String>> = vec![
            Ok(b"{\"response\":\"a\",\"done\":false}\n".to_vec()),
            Err("connection reset".to_string()),
        ];
        let items = collect(parse_generate_stream(stream::iter(chunks), IDLE)).await;
        assert_eq!(items.len(), 2);
        assert!(items[1].as_ref().unwrap_err().to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_stream_malformed_line() {
        let items = collect(parse(&["not json\n"])).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap_err().kind(), ErrorKind::GenerationFailed);
    }

    #[tokio::test]
    async fn test_stream_ignores_data_after_done() {
        let stream = parse(&[
            "{\"response\":\"x\",\"done\":true}\n{\"response\":\"y\",\"done\":false}\n",
        ]);
        let items = collect(stream).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), "x");
    }

    #[tokio::test]
    async fn test_stalled_stream_times_out() {
        let stalled =
            body(&["{\"response\":\"Refunds \",\"done\":false}\n"]).chain(stream::pending());
        let stream = parse_generate_stream(stalled, Duration::from_millis(50));

        let items = tokio::time::timeout(Duration::from_secs(5), collect(stream))
            .await
            .expect("stalled stream should end on its own");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "Refunds ");
        let err = items[1].as_ref().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GenerationFailed);
        assert!(err.to_string().contains("No output from Ollama"));
    }
}
