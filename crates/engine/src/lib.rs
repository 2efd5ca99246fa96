//! RagKit Retrieval Engine
//!
//! Orchestrates the full pipeline:
//! - Ingestion: chunk documents, embed the chunks, append them to the
//!   vector index in order
//! - Query: embed the question, retrieve the top-matching chunks, compose
//!   a grounded prompt, and generate an answer
//!
//! Retrieval context always survives a generation failure, so callers can
//! retry generation without re-running retrieval.

pub mod composer;
pub mod engine;

pub use composer::{AnswerComposer, GeneratedAnswer};
pub use engine::{EngineStats, IngestReport, QueryOutcome, RagEngine, SourceDocument};
