//! Error types for Docchat

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocchatError {
    // Input errors
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    // Embedder errors
    #[error("Embedder unavailable: {reason}. Try: {remediation}")]
    EmbedderUnavailable {
        reason: String,
        remediation: String,
    },

    // Index errors
    #[error("Similarity index unavailable: {reason}")]
    IndexUnavailable { reason: String },

    #[error("Dimension mismatch: index stores {expected}-dimensional vectors, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    // Generation errors
    #[error("Generation failed: {reason}")]
    GenerationFailed { reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification of a [`DocchatError`], observable by calling layers
/// that want to apply their own retry or reporting policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    EmbeddingFailure,
    IndexUnavailable,
    DimensionMismatch,
    GenerationFailed,
    Configuration,
    Internal,
}

impl DocchatError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn index_unavailable(reason: impl Into<String>) -> Self {
        Self::IndexUnavailable {
            reason: reason.into(),
        }
    }

    pub fn generation_failed(reason: impl Into<String>) -> Self {
        Self::GenerationFailed {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::EmbedderUnavailable { .. } => ErrorKind::EmbeddingFailure,
            Self::IndexUnavailable { .. } => ErrorKind::IndexUnavailable,
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::GenerationFailed { .. } => ErrorKind::GenerationFailed,
            Self::ConfigMissing { .. } | Self::ConfigInvalid { .. } => ErrorKind::Configuration,
            Self::Io(_) | Self::Serialization(_) => ErrorKind::Internal,
        }
    }
}

impl From<serde_json::Error> for DocchatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DocchatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(DocchatError::invalid_input("empty").kind(), ErrorKind::InvalidInput);
        assert_eq!(
            DocchatError::EmbedderUnavailable {
                reason: "down".to_string(),
                remediation: "start it".to_string(),
            }
            .kind(),
            ErrorKind::EmbeddingFailure
        );
        assert_eq!(
            DocchatError::DimensionMismatch {
                expected: 768,
                actual: 384,
            }
            .kind(),
            ErrorKind::DimensionMismatch
        );
        assert_eq!(DocchatError::generation_failed("timeout").kind(), ErrorKind::GenerationFailed);
        assert_eq!(
            DocchatError::ConfigMissing {
                key: "top_k".to_string(),
            }
            .kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = DocchatError::DimensionMismatch {
            expected: 768,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: index stores 768-dimensional vectors, query has 3"
        );
    }
}
