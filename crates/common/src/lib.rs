//! RagKit Common Library
//!
//! Shared code for all RagKit crates including:
//! - Error types and handling
//! - Configuration management
//! - Embedding provider abstraction
//! - Generation provider abstraction

pub mod config;
pub mod embeddings;
pub mod errors;
pub mod generation;

// Re-export commonly used types
pub use config::{ProviderConfig, RagConfig};
pub use embeddings::{Embedder, EmbeddingGateway};
pub use errors::{ErrorKind, RagError, Result};
pub use generation::{ChatMessage, GenerationResponse, Generator, UsageStats};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Default generation model
pub const DEFAULT_LLM_MODEL: &str = "llama3.1";
