//! Docchat Store - Similarity index port and adapters
//!
//! This crate defines the query-side contract of the similarity index and
//! provides an in-memory implementation loaded from a JSON snapshot.

pub mod memory;
pub mod ports;

pub use memory::{IndexEntry, IndexSnapshot, MemoryIndex};
pub use ports::SimilarityIndex;
