use async_trait::async_trait;
use docchat_core::error::Result;
use docchat_core::models::PassageMatch;

/// Port for nearest-neighbour search over indexed passages
///
/// Scores are cosine distances: lower is closer, results are ordered best
/// match first. Implementations must tolerate concurrent `search` calls.
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    /// Return at most `k` passages closest to `query`
    ///
    /// An empty index yields an empty result, not an error. A query whose
    /// dimension differs from the stored vectors fails with `DimensionMismatch`.
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<PassageMatch>>;

    /// Number of indexed passages
    async fn len(&self) -> Result<usize>;

    /// Check whether the index holds no passages
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Dimensionality of stored vectors, `None` while the index has never been given one
    async fn dimensions(&self) -> Result<Option<usize>>;
}
