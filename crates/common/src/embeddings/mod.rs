//! Embedding provider abstraction
//!
//! Provides a unified interface over embedding backends:
//! - Ollama (`/api/embeddings`)
//! - Deterministic mock for offline use and tests
//!
//! The [`EmbeddingGateway`] wraps a provider and enforces the invariants a
//! remote backend cannot be trusted with: a stable vector dimension for the
//! lifetime of the session, and finite non-zero vectors. The gateway itself
//! never retries; retry policy belongs to callers.

use crate::config::ProviderConfig;
use crate::errors::{RagError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Trait for embedding generation
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the model name
    fn model(&self) -> &str;
}

impl std::fmt::Debug for dyn Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder")
            .field("model", &self.model())
            .finish()
    }
}

/// Ollama embedding client
pub struct OllamaEmbedder {
    client: reqwest::Client,
    host: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder from provider configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RagError::configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            host: config.host.trim_end_matches('/').to_string(),
            model: config.embedding_model.clone(),
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.host);

        let request = EmbeddingsRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::embedding(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::embedding(format!("API error {}: {}", status, body)));
        }

        let result: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| RagError::embedding(format!("failed to parse response: {}", e)))?;

        Ok(result.embedding)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Deterministic mock embedder for offline use and testing.
///
/// Hashes whitespace-separated tokens into a fixed number of buckets, so
/// identical text always produces an identical vector and texts sharing
/// vocabulary land near each other under cosine similarity.
pub struct MockEmbedder {
    dimension: usize,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of embed calls served so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn bucket(&self, token: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        (hasher.finish() % self.dimension as u64) as usize
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let mut vector = vec![0.0f32; self.dimension];
        for token in text.split_whitespace() {
            vector[self.bucket(&token.to_lowercase())] += 1.0;
        }

        // Whitespace-only input still gets a valid unit vector.
        if vector.iter().all(|v| *v == 0.0) {
            vector[0] = 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        for v in &mut vector {
            *v /= norm;
        }

        Ok(vector)
    }

    fn model(&self) -> &str {
        "mock-embedding"
    }
}

/// Gateway in front of an embedding provider.
///
/// All vectors handed out by one gateway share the same dimension; the first
/// successful embed pins it, and loading a snapshot may seed it. Clones share
/// the pinned dimension.
#[derive(Clone, Debug)]
pub struct EmbeddingGateway {
    provider: Arc<dyn Embedder>,
    dimension: Arc<OnceLock<usize>>,
}

impl EmbeddingGateway {
    pub fn new(provider: Arc<dyn Embedder>) -> Self {
        Self {
            provider,
            dimension: Arc::new(OnceLock::new()),
        }
    }

    /// The configured embedding model identifier
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// The pinned embedding dimension, if any embed has succeeded yet
    pub fn dimension(&self) -> Option<usize> {
        self.dimension.get().copied()
    }

    /// Pin the expected dimension (used when adopting a persisted index).
    ///
    /// Fails if a different dimension is already pinned.
    pub fn pin_dimension(&self, dimension: usize) -> Result<()> {
        let pinned = *self.dimension.get_or_init(|| dimension);
        if pinned != dimension {
            return Err(RagError::configuration(format!(
                "embedding dimension mismatch for model '{}': expected {}, got {}",
                self.model(),
                pinned,
                dimension
            )));
        }
        Ok(())
    }

    /// Embed a text, enforcing the gateway invariants
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.provider.embed(text).await?;

        if vector.is_empty() {
            return Err(RagError::embedding(format!(
                "model '{}' returned an empty embedding",
                self.model()
            )));
        }
        if !vector.iter().all(|v| v.is_finite()) {
            return Err(RagError::embedding(format!(
                "model '{}' returned non-finite embedding components",
                self.model()
            )));
        }
        if vector.iter().all(|v| *v == 0.0) {
            return Err(RagError::embedding(format!(
                "model '{}' returned a zero-norm embedding",
                self.model()
            )));
        }

        self.pin_dimension(vector.len())?;
        Ok(vector)
    }
}

/// Create an embedder based on configuration
pub fn create_embedder(config: &ProviderConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(config)?)),
        "mock" => Ok(Arc::new(MockEmbedder::new(MOCK_DIMENSION))),
        other => Err(RagError::configuration(format!(
            "unknown embedding provider: {}",
            other
        ))),
    }
}

/// Dimension used by the mock provider
pub const MOCK_DIMENSION: usize = 384;
