//! Retrieval engine
//!
//! Wires the chunker, the vector index, and the answer composer into the
//! ingestion and query flows.

use crate::composer::{AnswerComposer, GeneratedAnswer};
use ragkit_common::config::RagConfig;
use ragkit_common::embeddings::{create_embedder, EmbeddingGateway};
use ragkit_common::generation::create_generator;
use ragkit_common::{RagError, Result};
use ragkit_index::{DocumentInput, IndexStats, RetrievalResult, VectorIndex};
use ragkit_ingestion::chunker::{chunk_text, Chunk, ChunkingConfig};
use ragkit_ingestion::loader::{load_directory, LoadedDocument};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, instrument, warn};

/// A source document submitted for ingestion
#[derive(Debug, Clone, Default)]
pub struct SourceDocument {
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

impl SourceDocument {
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

impl From<LoadedDocument> for SourceDocument {
    fn from(document: LoadedDocument) -> Self {
        Self {
            text: document.text,
            metadata: document.metadata,
        }
    }
}

/// Outcome of an ingestion call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Documents submitted
    pub documents: usize,
    /// Documents that produced zero chunks (e.g. whitespace-only text)
    pub empty_documents: usize,
    /// Chunks produced and submitted for embedding
    pub chunks_submitted: usize,
    /// Chunks embedded and appended to the index
    pub chunks_indexed: usize,
    /// Chunks skipped because their embedding failed
    pub chunks_skipped: usize,
}

/// Outcome of a query.
///
/// The retrieved context is returned even when generation fails, so a
/// caller can retry generation alone.
#[derive(Debug)]
pub struct QueryOutcome {
    pub context: Vec<RetrievalResult>,
    pub answer: Result<GeneratedAnswer>,
}

/// Engine statistics
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub total_queries: u64,
    pub total_tokens_generated: u64,
    pub top_k: usize,
    pub generation_model: String,
    pub index: IndexStats,
}

/// RAG engine combining retrieval and generation
pub struct RagEngine {
    index: VectorIndex,
    composer: AnswerComposer,
    chunking: ChunkingConfig,
    top_k: usize,
    total_queries: AtomicU64,
    total_tokens: AtomicU64,
}

impl RagEngine {
    /// Create an engine from already-built components
    pub fn new(
        index: VectorIndex,
        composer: AnswerComposer,
        chunking: ChunkingConfig,
        top_k: usize,
    ) -> Result<Self> {
        chunking.validate()?;
        if top_k == 0 {
            return Err(RagError::configuration("top_k must be greater than zero"));
        }

        Ok(Self {
            index,
            composer,
            chunking,
            top_k,
            total_queries: AtomicU64::new(0),
            total_tokens: AtomicU64::new(0),
        })
    }

    /// Create an engine with providers built from configuration
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        config.validate()?;

        let gateway = EmbeddingGateway::new(create_embedder(&config.provider)?);
        let index = VectorIndex::new(gateway)
            .with_embed_concurrency(config.retrieval.embed_concurrency);
        let composer = AnswerComposer::new(create_generator(&config.provider)?);

        Self::new(
            index,
            composer,
            ChunkingConfig::new(config.chunking.chunk_size, config.chunking.chunk_overlap),
            config.retrieval.top_k,
        )
    }

    /// Chunk and index a batch of documents.
    ///
    /// Chunks keep per-document then per-chunk order. A document whose text
    /// trims away to nothing is counted in `empty_documents` rather than
    /// silently ignored, and embedding failures skip only the affected
    /// chunk.
    #[instrument(skip(self, documents), fields(documents = documents.len()))]
    pub async fn ingest(&mut self, documents: Vec<SourceDocument>) -> Result<IngestReport> {
        let mut report = IngestReport {
            documents: documents.len(),
            ..IngestReport::default()
        };

        let mut inputs = Vec::new();
        for (position, document) in documents.into_iter().enumerate() {
            let chunks = chunk_text(&document.text, &self.chunking, &document.metadata)?;
            if chunks.is_empty() {
                warn!(document = position, "Document produced zero chunks");
                report.empty_documents += 1;
                continue;
            }
            inputs.extend(chunks.into_iter().map(chunk_to_input));
        }
        report.chunks_submitted = inputs.len();

        let outcome = self.index.add_many(inputs).await?;
        report.chunks_indexed = outcome.added;
        report.chunks_skipped = outcome.skipped;

        info!(
            documents = report.documents,
            empty_documents = report.empty_documents,
            chunks_indexed = report.chunks_indexed,
            chunks_skipped = report.chunks_skipped,
            "Ingestion complete"
        );

        Ok(report)
    }

    /// Load and ingest every `.{extension}` file from a directory
    pub async fn ingest_directory(&mut self, dir: &Path, extension: &str) -> Result<IngestReport> {
        let documents = load_directory(dir, extension)?
            .into_iter()
            .map(SourceDocument::from)
            .collect();
        self.ingest(documents).await
    }

    /// Retrieve the configured number of most relevant chunks for a query
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievalResult>> {
        self.index.search(query, self.top_k).await
    }

    /// Answer a question using retrieved context.
    ///
    /// Fails only when retrieval fails; a generation failure is carried in
    /// [`QueryOutcome::answer`] with the context intact.
    #[instrument(skip(self))]
    pub async fn query(&self, question: &str) -> Result<QueryOutcome> {
        self.total_queries.fetch_add(1, Ordering::Relaxed);

        let context = self.retrieve(question).await?;
        let answer = self.composer.answer(question, &context).await;

        match &answer {
            Ok(generated) => {
                if let Some(tokens) = generated.usage.completion_tokens {
                    self.total_tokens.fetch_add(tokens, Ordering::Relaxed);
                }
            }
            Err(error) => {
                warn!(error = %error, "Generation failed; retrieval context preserved");
            }
        }

        Ok(QueryOutcome { context, answer })
    }

    /// Number of chunks retrieved per query
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Change `top_k` for subsequent retrievals
    pub fn set_top_k(&mut self, top_k: usize) -> Result<()> {
        if top_k == 0 {
            return Err(RagError::configuration("top_k must be greater than zero"));
        }
        self.top_k = top_k;
        Ok(())
    }

    /// Change chunking parameters for subsequent ingestions
    pub fn set_chunking(&mut self, chunking: ChunkingConfig) -> Result<()> {
        chunking.validate()?;
        self.chunking = chunking;
        Ok(())
    }

    /// Write the index snapshot to a file
    pub fn save_index(&self, path: &Path) -> Result<()> {
        self.index.save_to(path)
    }

    /// Replace the index with a snapshot loaded from a file.
    ///
    /// The snapshot must have been built with the engine's embedding model.
    pub fn load_index(&mut self, path: &Path) -> Result<()> {
        let gateway = self.index.gateway().clone();
        self.index = VectorIndex::load_from(path, gateway)?;
        Ok(())
    }

    /// Remove all indexed documents
    pub fn clear_index(&mut self) {
        self.index.clear();
    }

    /// Get engine statistics, including the underlying index stats
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            total_queries: self.total_queries.load(Ordering::Relaxed),
            total_tokens_generated: self.total_tokens.load(Ordering::Relaxed),
            top_k: self.top_k,
            generation_model: self.composer.model().to_string(),
            index: self.index.stats(),
        }
    }
}

fn chunk_to_input(chunk: Chunk) -> DocumentInput {
    let mut metadata = chunk.metadata;
    metadata.insert("chunk_index".to_string(), chunk.chunk_index.to_string());
    metadata.insert("start_char".to_string(), chunk.start_char.to_string());
    metadata.insert("end_char".to_string(), chunk.end_char.to_string());
    DocumentInput {
        text: chunk.text,
        metadata,
    }
}
