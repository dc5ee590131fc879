use serde::Deserialize;

/// Body of both chat endpoints
///
/// Blank queries are accepted here and answered by the pipeline with an
/// error answer or frame.
#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    pub query: String,
}
