//! In-memory vector store with brute-force cosine similarity search.
//!
//! Insertion order is the stable handle for a document: batch ingestion
//! appends completed embeddings in submission order even when the embedding
//! requests themselves run concurrently, and score ties rank earlier
//! documents first.

use futures::stream::{self, StreamExt};
use ragkit_common::embeddings::EmbeddingGateway;
use ragkit_common::{RagError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// Default number of concurrent embedding requests during batch insertion
pub(crate) const DEFAULT_EMBED_CONCURRENCY: usize = 4;

/// A document with its embedding, as stored in the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: BTreeMap<String, String>,
}

/// A document submitted for indexing
#[derive(Debug, Clone, Default)]
pub struct DocumentInput {
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

impl DocumentInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A retrieved document with its relevance score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub text: String,
    pub score: f32,
    pub metadata: BTreeMap<String, String>,
}

/// Outcome of a batch insertion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchAddOutcome {
    /// Documents embedded and appended to the index
    pub added: usize,
    /// Documents skipped because their embedding failed
    pub skipped: usize,
}

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexStats {
    pub document_count: usize,
    pub embedding_model: String,
    pub embedding_dimension: Option<usize>,
}

/// Ordered collection of embedded documents with cosine-similarity search.
///
/// Search is an exact linear scan, O(documents × dimension) per query;
/// approximate indexing is out of scope. Suitable for small corpora.
#[derive(Debug)]
pub struct VectorIndex {
    gateway: EmbeddingGateway,
    documents: Vec<IndexedDocument>,
    embed_concurrency: usize,
}

impl VectorIndex {
    /// Create an empty index backed by the given gateway
    pub fn new(gateway: EmbeddingGateway) -> Self {
        Self {
            gateway,
            documents: Vec::new(),
            embed_concurrency: DEFAULT_EMBED_CONCURRENCY,
        }
    }

    /// Set the number of concurrent embedding requests used by
    /// [`add_many`](Self::add_many). `1` embeds strictly sequentially.
    pub fn with_embed_concurrency(mut self, concurrency: usize) -> Self {
        self.embed_concurrency = concurrency.max(1);
        self
    }

    /// The gateway this index embeds through
    pub fn gateway(&self) -> &EmbeddingGateway {
        &self.gateway
    }

    pub(crate) fn from_parts(gateway: EmbeddingGateway, documents: Vec<IndexedDocument>) -> Self {
        Self {
            gateway,
            documents,
            embed_concurrency: DEFAULT_EMBED_CONCURRENCY,
        }
    }

    pub(crate) fn documents(&self) -> &[IndexedDocument] {
        &self.documents
    }

    /// Embed and append one document, returning its position.
    ///
    /// On embedding failure nothing is added.
    pub async fn add(&mut self, document: DocumentInput) -> Result<usize> {
        let embedding = self.gateway.embed(&document.text).await?;
        self.documents.push(IndexedDocument {
            text: document.text,
            embedding,
            metadata: document.metadata,
        });
        Ok(self.documents.len() - 1)
    }

    /// Embed and append a batch of documents.
    ///
    /// Embedding requests run with bounded concurrency, but documents are
    /// appended in submission order and one document's failure only skips
    /// that document. The outcome reports how many of the submitted
    /// documents were actually indexed.
    #[instrument(skip(self, documents), fields(submitted = documents.len()))]
    pub async fn add_many(&mut self, documents: Vec<DocumentInput>) -> Result<BatchAddOutcome> {
        if documents.is_empty() {
            return Ok(BatchAddOutcome::default());
        }

        let concurrency = self.embed_concurrency;
        let gateway = &self.gateway;
        let results: Vec<(usize, DocumentInput, Result<Vec<f32>>)> =
            stream::iter(documents.into_iter().enumerate())
                .map(|(position, document)| async move {
                    let embedding = gateway.embed(&document.text).await;
                    (position, document, embedding)
                })
                .buffered(concurrency)
                .collect()
                .await;

        let mut outcome = BatchAddOutcome::default();
        for (position, document, embedding) in results {
            match embedding {
                Ok(embedding) => {
                    self.documents.push(IndexedDocument {
                        text: document.text,
                        embedding,
                        metadata: document.metadata,
                    });
                    outcome.added += 1;
                }
                Err(error) => {
                    warn!(position, error = %error, "Skipping document: embedding failed");
                    outcome.skipped += 1;
                }
            }
        }

        debug!(
            added = outcome.added,
            skipped = outcome.skipped,
            total = self.documents.len(),
            "Batch add complete"
        );

        Ok(outcome)
    }

    /// Retrieve the `top_k` most similar documents for a query.
    ///
    /// An empty index returns an empty result without calling the embedding
    /// provider. A query embedding failure fails the whole search.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievalResult>> {
        if top_k == 0 {
            return Err(RagError::configuration("top_k must be greater than zero"));
        }
        if self.documents.is_empty() {
            debug!("Search on empty index");
            return Ok(Vec::new());
        }

        let query_embedding = self.gateway.embed(query).await?;

        let mut results: Vec<RetrievalResult> = self
            .documents
            .iter()
            .map(|document| RetrievalResult {
                text: document.text.clone(),
                score: cosine_similarity(&query_embedding, &document.embedding),
                metadata: document.metadata.clone(),
            })
            .collect();

        // Stable sort: ties keep insertion order.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);

        debug!(
            results = results.len(),
            top_score = ?results.first().map(|r| r.score),
            "Search complete"
        );

        Ok(results)
    }

    /// Remove all documents. Idempotent.
    pub fn clear(&mut self) {
        self.documents.clear();
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Get statistics about the index
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            document_count: self.documents.len(),
            embedding_model: self.gateway.model().to_string(),
            embedding_dimension: self
                .gateway
                .dimension()
                .or_else(|| self.documents.first().map(|d| d.embedding.len())),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 means identical direction. A
/// zero-norm vector scores 0.0; the gateway rejects those at embedding
/// time, so this path only matters for snapshots produced elsewhere.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
