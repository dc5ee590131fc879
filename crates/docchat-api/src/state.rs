use docchat_retrieval::RagPipeline;

/// Shared by every request; the pipeline is opened once at startup
#[derive(Clone)]
pub struct AppState {
    pub pipeline: RagPipeline,
}

impl AppState {
    pub fn new(pipeline: RagPipeline) -> Self {
        Self { pipeline }
    }
}
