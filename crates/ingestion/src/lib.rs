//! RagKit Ingestion
//!
//! Turns raw documents into embedding-ready chunks:
//! - Boundary-aware overlapping chunking with positional metadata
//! - Plain-text file and directory loading

pub mod chunker;
pub mod loader;

pub use chunker::{chunk_text, Chunk, ChunkingConfig};
pub use loader::{load_directory, load_text_file, LoadedDocument};
