//! Docchat Core - Domain models, error taxonomy, and configuration
//!
//! This crate contains the core domain types shared by the retrieval, storage,
//! and model-backend crates of the Docchat system.

pub mod config;
pub mod error;
pub mod models;

pub use error::{DocchatError, ErrorKind, Result};
