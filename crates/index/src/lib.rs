//! RagKit Vector Index
//!
//! An ordered in-memory collection of embedded documents with:
//! - Per-document and order-preserving batch insertion
//! - Exact cosine-similarity search (full linear scan)
//! - Whole-index snapshot persistence tagged with the embedding model
//!
//! The index embeds both inserted documents and queries through the
//! [`EmbeddingGateway`](ragkit_common::EmbeddingGateway), so every stored
//! vector is guaranteed to share one model and one dimension.

mod snapshot;
mod store;

pub use store::{
    BatchAddOutcome, DocumentInput, IndexStats, IndexedDocument, RetrievalResult, VectorIndex,
};
