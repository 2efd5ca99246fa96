//! Whole-index snapshot persistence.
//!
//! A snapshot is a single JSON blob carrying the documents, their
//! embeddings, and the embedding model tag. There is no incremental form:
//! load fully replaces the index. Adopting a snapshot built with a
//! different embedding model than the gateway's is a configuration error,
//! because scores across models are not comparable.

use crate::store::{IndexedDocument, VectorIndex};
use ragkit_common::embeddings::EmbeddingGateway;
use ragkit_common::{RagError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Serialize, Deserialize)]
struct IndexSnapshot {
    embedding_model: String,
    embedding_dimension: Option<usize>,
    documents: Vec<IndexedDocument>,
}

impl VectorIndex {
    /// Serialize the whole index to a snapshot blob
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let snapshot = IndexSnapshot {
            embedding_model: self.gateway().model().to_string(),
            embedding_dimension: self.stats().embedding_dimension,
            documents: self.documents().to_vec(),
        };

        serde_json::to_vec(&snapshot)
            .map_err(|e| RagError::persistence(format!("failed to encode index snapshot: {}", e)))
    }

    /// Rebuild an index from a snapshot blob.
    ///
    /// The snapshot's embedding model must match the gateway's configured
    /// model, and its dimension seeds the gateway's pinned dimension so
    /// later embeds are checked against the persisted vectors.
    pub fn deserialize(bytes: &[u8], gateway: EmbeddingGateway) -> Result<VectorIndex> {
        let snapshot: IndexSnapshot = serde_json::from_slice(bytes)
            .map_err(|e| RagError::persistence(format!("corrupt index snapshot: {}", e)))?;

        if snapshot.embedding_model != gateway.model() {
            return Err(RagError::configuration(format!(
                "snapshot was built with embedding model '{}' but the gateway is configured for '{}'",
                snapshot.embedding_model,
                gateway.model()
            )));
        }

        let dimension = snapshot
            .embedding_dimension
            .or_else(|| snapshot.documents.first().map(|d| d.embedding.len()));

        if let Some(dimension) = dimension {
            if snapshot
                .documents
                .iter()
                .any(|d| d.embedding.len() != dimension)
            {
                return Err(RagError::persistence(
                    "corrupt index snapshot: documents with mixed embedding dimensions",
                ));
            }
            gateway.pin_dimension(dimension)?;
        }

        Ok(VectorIndex::from_parts(gateway, snapshot.documents))
    }

    /// Write a snapshot to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let bytes = self.serialize()?;
        fs::write(path, bytes).map_err(|e| {
            RagError::persistence(format!("failed to write snapshot {}: {}", path.display(), e))
        })?;

        info!(
            path = %path.display(),
            documents = self.len(),
            "Index snapshot written"
        );
        Ok(())
    }

    /// Load a snapshot from a file
    pub fn load_from(path: &Path, gateway: EmbeddingGateway) -> Result<VectorIndex> {
        let bytes = fs::read(path).map_err(|e| {
            RagError::persistence(format!("failed to read snapshot {}: {}", path.display(), e))
        })?;

        let index = Self::deserialize(&bytes, gateway)?;

        info!(
            path = %path.display(),
            documents = index.len(),
            model = index.gateway().model(),
            "Index snapshot loaded"
        );
        Ok(index)
    }
}
