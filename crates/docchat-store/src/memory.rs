//! In-memory similarity index
//!
//! The index is populated once (from a snapshot written by the ingestion
//! pipeline, or via [`MemoryIndex::insert`]) and then shared read-only between
//! requests. Searches take a read lock, so any number may run concurrently.

use async_trait::async_trait;
use docchat_core::error::{DocchatError, Result};
use docchat_core::models::{PassageMatch, PassageMetadata};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard};

use crate::ports::SimilarityIndex;

/// One passage as persisted in an index snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub content: String,
    #[serde(default)]
    pub metadata: PassageMetadata,
    pub vector: Vec<f32>,
}

impl IndexEntry {
    pub fn new(content: impl Into<String>, metadata: PassageMetadata, vector: Vec<f32>) -> Self {
        Self {
            content: content.into(),
            metadata,
            vector,
        }
    }
}

/// On-disk snapshot format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub dimensions: usize,
    #[serde(default)]
    pub entries: Vec<IndexEntry>,
}

#[derive(Debug)]
struct StoredEntry {
    entry: IndexEntry,
    norm: f32,
}

#[derive(Debug, Default)]
struct IndexData {
    dimensions: Option<usize>,
    entries: Vec<StoredEntry>,
}

/// In-memory implementation of SimilarityIndex
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    data: Arc<RwLock<IndexData>>,
}

impl MemoryIndex {
    /// Create a new, empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index that only accepts vectors of `dimensions`
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            data: Arc::new(RwLock::new(IndexData {
                dimensions: Some(dimensions),
                entries: Vec::new(),
            })),
        }
    }

    /// Open a persisted snapshot
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            DocchatError::index_unavailable(format!("cannot read {}: {}", path.display(), e))
        })?;

        let snapshot: IndexSnapshot = serde_json::from_str(&content).map_err(|e| {
            DocchatError::index_unavailable(format!("cannot parse {}: {}", path.display(), e))
        })?;

        let index = Self::from_snapshot(snapshot)?;

        tracing::info!(
            path = %path.display(),
            entries = index.entry_count()?,
            "Loaded similarity index"
        );

        Ok(index)
    }

    /// Build an index from an already-parsed snapshot
    pub fn from_snapshot(snapshot: IndexSnapshot) -> Result<Self> {
        if snapshot.dimensions == 0 {
            return Err(DocchatError::index_unavailable("snapshot declares zero dimensions"));
        }

        let index = Self::with_dimensions(snapshot.dimensions);
        for (position, entry) in snapshot.entries.into_iter().enumerate() {
            index.insert(entry).map_err(|e| {
                DocchatError::index_unavailable(format!("snapshot entry {}: {}", position, e))
            })?;
        }
        Ok(index)
    }

    /// Add a passage
    ///
    /// The first vector fixes the dimension of an index created with [`MemoryIndex::new`].
    pub fn insert(&self, entry: IndexEntry) -> Result<()> {
        if entry.vector.is_empty() {
            return Err(DocchatError::invalid_input("passage vector is empty"));
        }
        if entry.vector.iter().any(|x| !x.is_finite()) {
            return Err(DocchatError::invalid_input("passage vector contains non-finite values"));
        }

        let mut data = self
            .data
            .write()
            .map_err(|_| DocchatError::index_unavailable("index lock poisoned"))?;

        match data.dimensions {
            Some(expected) if expected != entry.vector.len() => {
                return Err(DocchatError::DimensionMismatch {
                    expected,
                    actual: entry.vector.len(),
                });
            }
            Some(_) => {}
            None => data.dimensions = Some(entry.vector.len()),
        }

        let norm = norm(&entry.vector);
        data.entries.push(StoredEntry { entry, norm });
        Ok(())
    }

    /// Number of stored passages
    pub fn entry_count(&self) -> Result<usize> {
        Ok(self.read()?.entries.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, IndexData>> {
        self.data.read().map_err(|_| DocchatError::index_unavailable("index lock poisoned"))
    }
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine distance `1 - cos(a, b)`; zero vectors are treated as orthogonal
fn cosine_distance(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 1.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    1.0 - dot / (a_norm * b_norm)
}

#[async_trait]
impl SimilarityIndex for MemoryIndex {
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<PassageMatch>> {
        if k == 0 {
            return Err(DocchatError::invalid_input("k must be greater than zero"));
        }

        let data = self.read()?;

        if data.entries.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(expected) = data.dimensions {
            if expected != query.len() {
                return Err(DocchatError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let query_norm = norm(query);

        let mut scored: Vec<(usize, f32)> = data
            .entries
            .iter()
            .enumerate()
            .map(|(position, stored)| {
                (position, cosine_distance(query, query_norm, &stored.entry.vector, stored.norm))
            })
            .collect();

        // Stable sort keeps insertion order for equal distances
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| {
                let entry = &data.entries[position].entry;
                PassageMatch::new(entry.content.clone(), entry.metadata.clone(), score)
            })
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        self.entry_count()
    }

    async fn dimensions(&self) -> Result<Option<usize>> {
        Ok(self.read()?.dimensions)
    }
}
