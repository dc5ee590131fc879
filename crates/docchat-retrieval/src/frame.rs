//! Streamed response frames and their newline-delimited JSON encoding
//!
//! A well-formed stream is one `sources` frame, any number of `chunk` frames,
//! and a single terminal `done` frame; or an `error` frame in place of either
//! the whole sequence or its terminal frame. Nothing follows a terminal frame.

use docchat_core::error::{DocchatError, Result};
use docchat_core::models::SourceCitation;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Streamed output of a query
pub type FrameStream = Pin<Box<dyn Stream<Item = ResponseFrame> + Send>>;

/// One unit of a streamed answer, serialized as `{"type": ..., "data": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ResponseFrame {
    /// Citations for the passages the answer is grounded on
    Sources(Vec<SourceCitation>),
    /// Next fragment of the answer
    Chunk(String),
    /// Full answer, equal to the concatenated chunks
    Done(String),
    /// The request failed; any chunks already sent form a truncated answer
    Error(String),
}

impl ResponseFrame {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResponseFrame::Done(_) | ResponseFrame::Error(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ResponseFrame::Sources(_) => "sources",
            ResponseFrame::Chunk(_) => "chunk",
            ResponseFrame::Done(_) => "done",
            ResponseFrame::Error(_) => "error",
        }
    }
}

// Written verbatim if a frame itself cannot be encoded
const ENCODE_FAILURE_LINE: &str = "{\"type\":\"error\",\"data\":\"failed to encode response frame\"}\n";

/// Serializes frames one per line
pub struct StreamFramer;

impl StreamFramer {
    /// Encode a frame as a single JSON line, newline included
    pub fn encode(frame: &ResponseFrame) -> Result<String> {
        let mut line = serde_json::to_string(frame)?;
        line.push('\n');
        Ok(line)
    }

    /// Parse one line produced by [`StreamFramer::encode`]
    pub fn decode_line(line: &str) -> Result<ResponseFrame> {
        Ok(serde_json::from_str(line.trim())?)
    }

    /// Parse a complete NDJSON body, skipping blank lines
    pub fn decode_body(body: &str) -> Result<Vec<ResponseFrame>> {
        body.lines()
            .filter(|l| !l.trim().is_empty())
            .map(Self::decode_line)
            .collect()
    }

    /// Map a frame stream to encoded lines, in the same order
    ///
    /// The line stream ends after the first terminal frame.
    pub fn frame_lines(frames: FrameStream) -> impl Stream<Item = String> + Send {
        frames
            .scan(false, |ended, frame| {
                if *ended {
                    return futures::future::ready(None);
                }
                *ended = frame.is_terminal();
                let line = match Self::encode(&frame) {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::error!(error = %e, frame = frame.kind(), "Failed to encode frame");
                        *ended = true;
                        ENCODE_FAILURE_LINE.to_string()
                    }
                };
                futures::future::ready(Some(line))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequenceState {
    Start,
    Streaming,
    Finished,
}

/// Checks that frames arrive in the documented order
#[derive(Debug)]
pub struct FrameSequence {
    state: SequenceState,
    answer: String,
}

impl Default for FrameSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSequence {
    pub fn new() -> Self {
        Self {
            state: SequenceState::Start,
            answer: String::new(),
        }
    }

    /// Accept the next frame, or report the ordering rule it breaks
    pub fn push(&mut self, frame: &ResponseFrame) -> Result<()> {
        let violation = |reason: &str| {
            DocchatError::invalid_input(format!("out-of-order {} frame: {}", frame.kind(), reason))
        };

        match (self.state, frame) {
            (SequenceState::Finished, _) => Err(violation("stream already terminated")),
            (SequenceState::Start, ResponseFrame::Sources(_)) => {
                self.state = SequenceState::Streaming;
                Ok(())
            }
            (SequenceState::Start, ResponseFrame::Error(_)) => {
                self.state = SequenceState::Finished;
                Ok(())
            }
            (SequenceState::Start, _) => Err(violation("expected sources or error first")),
            (SequenceState::Streaming, ResponseFrame::Sources(_)) => {
                Err(violation("sources already sent"))
            }
            (SequenceState::Streaming, ResponseFrame::Chunk(text)) => {
                self.answer.push_str(text);
                Ok(())
            }
            (SequenceState::Streaming, ResponseFrame::Done(full)) => {
                if *full != self.answer {
                    return Err(violation("done payload differs from concatenated chunks"));
                }
                self.state = SequenceState::Finished;
                Ok(())
            }
            (SequenceState::Streaming, ResponseFrame::Error(_)) => {
                self.state = SequenceState::Finished;
                Ok(())
            }
        }
    }

    /// True once a terminal frame has been accepted
    pub fn is_complete(&self) -> bool {
        self.state == SequenceState::Finished
    }

    /// Answer text received so far
    pub fn answer(&self) -> &str {
        &self.answer
    }
}
