//! Configuration management for RagKit
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with RAG__)
//! - Configuration files (config/default, config/local)
//! - Default values
//!
//! There is no process-wide configuration state: the loaded struct is
//! passed explicitly into constructors.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{RagError, Result};

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RagConfig {
    /// Provider configuration (embedding + generation endpoint)
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingSettings,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Provider backend: ollama, mock
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Base URL of the provider server
    #[serde(default = "default_host")]
    pub host: String,

    /// Model used for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Model used for answer generation
    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkingSettings {
    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between adjacent chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalSettings {
    /// Number of documents to retrieve per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Concurrent embedding requests during batch ingestion
    /// (1 = strictly sequential)
    #[serde(default = "default_embed_concurrency")]
    pub embed_concurrency: usize,
}

// Default value functions
fn default_provider() -> String {
    "ollama".to_string()
}
fn default_host() -> String {
    "http://localhost:11434".to_string()
}
fn default_embedding_model() -> String {
    crate::DEFAULT_EMBEDDING_MODEL.to_string()
}
fn default_llm_model() -> String {
    crate::DEFAULT_LLM_MODEL.to_string()
}
fn default_timeout() -> u64 {
    120
}
fn default_chunk_size() -> usize {
    500
}
fn default_chunk_overlap() -> usize {
    50
}
fn default_top_k() -> usize {
    3
}
fn default_embed_concurrency() -> usize {
    4
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            host: default_host(),
            embedding_model: default_embedding_model(),
            llm_model: default_llm_model(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            embed_concurrency: default_embed_concurrency(),
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            chunking: ChunkingSettings::default(),
            retrieval: RetrievalSettings::default(),
        }
    }
}

impl RagConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with RAG__ prefix
            // e.g., RAG__PROVIDER__HOST=http://ollama:11434
            .add_source(Environment::with_prefix("RAG").separator("__").try_parsing(true))
            .build()
            .map_err(|e| RagError::configuration(e.to_string()))?;

        let config: RagConfig = config
            .try_deserialize()
            .map_err(|e| RagError::configuration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("RAG").separator("__").try_parsing(true))
            .build()
            .map_err(|e| RagError::configuration(e.to_string()))?;

        let config: RagConfig = config
            .try_deserialize()
            .map_err(|e| RagError::configuration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde defaults cannot express
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(RagError::configuration("chunk_size must be greater than zero"));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(RagError::configuration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(RagError::configuration("top_k must be greater than zero"));
        }
        if self.retrieval.embed_concurrency == 0 {
            return Err(RagError::configuration(
                "embed_concurrency must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Get the provider request timeout as Duration
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RagConfig::default();
        assert_eq!(config.provider.host, "http://localhost:11434");
        assert_eq!(config.provider.embedding_model, "nomic-embed-text");
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.retrieval.top_k, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let mut config = RagConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }
}
