//! Scripted backends shared by the pipeline tests
#![allow(dead_code)]

use async_trait::async_trait;
use docchat_core::error::{DocchatError, Result};
use docchat_core::models::{EmbeddingVector, PassageMatch, PassageMetadata, PromptText};
use docchat_llm::{Embedder, FragmentStream, Generator};
use docchat_retrieval::{FrameStream, ResponseFrame};
use docchat_store::SimilarityIndex;
use futures::{stream, StreamExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const REFUND_QUESTION: &str = "What is the refund policy?";

pub fn refund_passages() -> Vec<PassageMatch> {
    vec![
        PassageMatch::new(
            "Refunds are accepted within 30 days of purchase.",
            PassageMetadata::with_source("policy.pdf#3"),
            0.12,
        ),
        PassageMatch::new(
            "Items must be unused and in original packaging.",
            PassageMetadata::with_source("policy.pdf#7"),
            0.31,
        ),
    ]
}

pub struct ScriptedEmbedder {
    vector: EmbeddingVector,
    fail: bool,
    pub queries: Mutex<Vec<String>>,
}

impl ScriptedEmbedder {
    pub fn returning(vector: EmbeddingVector) -> Self {
        Self {
            vector,
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            vector: Vec::new(),
            fail: true,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Embedder for ScriptedEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        self.queries.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(DocchatError::EmbedderUnavailable {
                reason: "connection refused".to_string(),
                remediation: "start the embedder".to_string(),
            });
        }
        Ok(self.vector.clone())
    }

    fn dimensions(&self) -> usize {
        self.vector.len()
    }

    fn model_name(&self) -> &str {
        "scripted-embedder"
    }
}

pub struct ScriptedIndex {
    passages: Vec<PassageMatch>,
    fail: bool,
    pub requested_k: Mutex<Vec<usize>>,
}

impl ScriptedIndex {
    pub fn with(passages: Vec<PassageMatch>) -> Self {
        Self {
            passages,
            fail: false,
            requested_k: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            passages: Vec::new(),
            fail: true,
            requested_k: Mutex::new(Vec::new()),
        }
    }

    pub fn ks(&self) -> Vec<usize> {
        self.requested_k.lock().unwrap().clone()
    }
}

#[async_trait]
impl SimilarityIndex for ScriptedIndex {
    async fn search(&self, _query: &[f32], k: usize) -> Result<Vec<PassageMatch>> {
        self.requested_k.lock().unwrap().push(k);
        if self.fail {
            return Err(DocchatError::index_unavailable("snapshot missing"));
        }
        Ok(self.passages.iter().take(k).cloned().collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.passages.len())
    }

    async fn dimensions(&self) -> Result<Option<usize>> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Complete,
    /// Both blocking and streaming calls fail before producing anything
    FailStart,
    /// Streaming yields this many fragments, then an error
    FailAfter(usize),
    /// Streaming yields every fragment, then never finishes
    HangAfterFragments,
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

pub struct ScriptedGenerator {
    fragments: Vec<String>,
    mode: GenerationMode,
    prompts: Mutex<Vec<String>>,
    stream_dropped: Arc<AtomicBool>,
}

impl ScriptedGenerator {
    pub fn new(fragments: &[&str], mode: GenerationMode) -> Self {
        Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            mode,
            prompts: Mutex::new(Vec::new()),
            stream_dropped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn complete(fragments: &[&str]) -> Self {
        Self::new(fragments, GenerationMode::Complete)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn stream_dropped(&self) -> bool {
        self.stream_dropped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &PromptText) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.as_str().to_string());
        match self.mode {
            GenerationMode::FailStart => Err(DocchatError::generation_failed("model crashed")),
            _ => Ok(self.fragments.concat()),
        }
    }

    async fn generate_stream(&self, prompt: &PromptText) -> Result<FragmentStream> {
        self.prompts.lock().unwrap().push(prompt.as_str().to_string());

        let mut items: VecDeque<Result<String>> = VecDeque::new();
        match self.mode {
            GenerationMode::FailStart => {
                return Err(DocchatError::generation_failed("model crashed"));
            }
            GenerationMode::FailAfter(n) => {
                items.extend(self.fragments.iter().take(n).cloned().map(Ok));
                items.push_back(Err(DocchatError::generation_failed("connection reset")));
            }
            GenerationMode::Complete | GenerationMode::HangAfterFragments => {
                items.extend(self.fragments.iter().cloned().map(Ok));
            }
        }

        let hang = self.mode == GenerationMode::HangAfterFragments;
        let guard = DropFlag(self.stream_dropped.clone());

        Ok(Box::pin(stream::unfold((items, guard), move |(mut items, guard)| async move {
            match items.pop_front() {
                Some(item) => Some((item, (items, guard))),
                None if hang => {
                    futures::future::pending::<()>().await;
                    None
                }
                None => None,
            }
        })))
    }

    fn model_name(&self) -> &str {
        "scripted-generator"
    }
}

pub async fn collect_frames(frames: FrameStream) -> Vec<ResponseFrame> {
    tokio::time::timeout(Duration::from_secs(5), frames.collect::<Vec<_>>())
        .await
        .expect("frame stream did not finish")
}

pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
