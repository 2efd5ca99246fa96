//! Error types for RagKit
//!
//! Provides a small error taxonomy with:
//! - Distinct error types for different failure modes
//! - A machine-readable kind for programmatic handling
//!
//! Every error that crosses a crate boundary is a [`RagError`]; the four
//! kinds map one-to-one onto the failure modes a caller can act on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using RagError
pub type Result<T> = std::result::Result<T, RagError>;

/// Machine-readable error classification.
///
/// Callers dispatch on this rather than parsing display strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Invalid parameters or an embedding-model mismatch on load
    Configuration,
    /// Embedding provider unreachable, timed out, or returned garbage
    EmbeddingProvider,
    /// Generation provider unreachable, timed out, or returned garbage
    GenerationProvider,
    /// Missing file or corrupt snapshot blob
    Persistence,
}

/// Application error types
#[derive(Error, Debug)]
pub enum RagError {
    /// Fatal to the operation; never retried automatically.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Surfaced per-operation: ingestion treats it as a per-document skip,
    /// queries treat it as fatal.
    #[error("Embedding provider error: {message}")]
    EmbeddingProvider { message: String },

    /// Surfaced at the composer boundary; retrieval context is never lost
    /// to a generation failure.
    #[error("Generation provider error: {message}")]
    GenerationProvider { message: String },

    #[error("Persistence error: {message}")]
    Persistence { message: String },
}

impl RagError {
    pub fn configuration(message: impl Into<String>) -> Self {
        RagError::Configuration {
            message: message.into(),
        }
    }

    pub fn embedding(message: impl Into<String>) -> Self {
        RagError::EmbeddingProvider {
            message: message.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        RagError::GenerationProvider {
            message: message.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        RagError::Persistence {
            message: message.into(),
        }
    }

    /// Get the kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::Configuration { .. } => ErrorKind::Configuration,
            RagError::EmbeddingProvider { .. } => ErrorKind::EmbeddingProvider,
            RagError::GenerationProvider { .. } => ErrorKind::GenerationProvider,
            RagError::Persistence { .. } => ErrorKind::Persistence,
        }
    }

    /// Check if this error originated at an external provider
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::EmbeddingProvider | ErrorKind::GenerationProvider
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        let err = RagError::configuration("overlap must be smaller than chunk size");
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(!err.is_provider_error());
    }

    #[test]
    fn test_provider_errors() {
        let embed = RagError::embedding("connection refused");
        let generate = RagError::generation("model not found");
        assert!(embed.is_provider_error());
        assert!(generate.is_provider_error());
        assert_ne!(embed.kind(), generate.kind());
    }

    #[test]
    fn test_display_includes_message() {
        let err = RagError::persistence("snapshot not found: index.json");
        assert!(err.to_string().contains("index.json"));
    }
}
