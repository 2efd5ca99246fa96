//! End-to-end pipeline tests against the mock providers.

use ragkit_common::config::RagConfig;
use ragkit_common::embeddings::{EmbeddingGateway, MockEmbedder};
use ragkit_common::generation::MockGenerator;
use ragkit_engine::{AnswerComposer, RagEngine, SourceDocument};
use ragkit_index::VectorIndex;
use ragkit_ingestion::chunker::ChunkingConfig;
use std::fs;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn mock_engine(top_k: usize) -> RagEngine {
    let gateway = EmbeddingGateway::new(Arc::new(MockEmbedder::new(128)));
    RagEngine::new(
        VectorIndex::new(gateway),
        AnswerComposer::new(Arc::new(MockGenerator)),
        ChunkingConfig::new(120, 20),
        top_k,
    )
    .expect("engine construction")
}

fn sample_corpus() -> Vec<SourceDocument> {
    vec![
        SourceDocument::new(
            "The borrow checker enforces ownership rules at compile time. \
             Each value has a single owner and the compiler tracks lifetimes.",
        )
        .with_metadata("filename", "ownership.txt"),
        SourceDocument::new(
            "Sourdough bread is leavened with a wild yeast starter. \
             The starter needs regular feeding with flour and water.",
        )
        .with_metadata("filename", "sourdough.txt"),
        SourceDocument::new(
            "Telescopes gather light with mirrors or lenses. \
             Larger apertures resolve fainter and more distant objects.",
        )
        .with_metadata("filename", "telescopes.txt"),
    ]
}

#[tokio::test]
async fn ingest_then_retrieve_ranks_the_right_document_first() {
    init_tracing();
    let mut engine = mock_engine(3);

    let report = engine.ingest(sample_corpus()).await.unwrap();
    assert_eq!(report.documents, 3);
    assert_eq!(report.empty_documents, 0);
    assert_eq!(report.chunks_indexed, report.chunks_submitted);
    assert_eq!(report.chunks_skipped, 0);

    let results = engine
        .retrieve("how does a wild yeast starter leaven sourdough bread")
        .await
        .unwrap();
    assert!(!results.is_empty());
    assert!(results.len() <= 3);
    assert_eq!(
        results[0].metadata.get("filename").map(String::as_str),
        Some("sourdough.txt")
    );
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn query_returns_answer_and_context() {
    init_tracing();
    let mut engine = mock_engine(2);
    engine.ingest(sample_corpus()).await.unwrap();

    let outcome = engine.query("What enforces ownership rules?").await.unwrap();
    assert_eq!(outcome.context.len(), 2);

    let answer = outcome.answer.unwrap();
    assert!(answer.text.contains("What enforces ownership rules?"));
    assert!(answer.usage.completion_tokens.is_some());

    let stats = engine.stats();
    assert_eq!(stats.total_queries, 1);
    assert!(stats.total_tokens_generated > 0);
}

#[tokio::test]
async fn snapshot_reload_preserves_ranked_results() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.json");
    let probe = "mirrors and lenses gather light";

    let mut engine = mock_engine(3);
    engine.ingest(sample_corpus()).await.unwrap();
    let before = engine.retrieve(probe).await.unwrap();
    engine.save_index(&path).unwrap();

    let mut restored = mock_engine(3);
    restored.load_index(&path).unwrap();
    assert_eq!(restored.stats().index, engine.stats().index);

    let after = restored.retrieve(probe).await.unwrap();
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        assert_eq!(b.text, a.text);
        assert_eq!(b.score, a.score);
    }
}

#[tokio::test]
async fn ingest_directory_attaches_file_provenance() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("astronomy.txt"),
        "Telescopes gather light with mirrors or lenses.",
    )
    .unwrap();
    fs::write(
        dir.path().join("baking.txt"),
        "Sourdough starters need regular feeding.",
    )
    .unwrap();
    fs::write(dir.path().join("notes.md"), "ignored markdown file").unwrap();

    let mut engine = mock_engine(1);
    let report = engine.ingest_directory(dir.path(), "txt").await.unwrap();
    assert_eq!(report.documents, 2);

    let results = engine
        .retrieve("telescopes gather light")
        .await
        .unwrap();
    assert_eq!(
        results[0].metadata.get("filename").map(String::as_str),
        Some("astronomy.txt")
    );
}

#[tokio::test]
async fn engine_builds_from_mock_provider_config() {
    init_tracing();
    let mut config = RagConfig::default();
    config.provider.provider = "mock".to_string();
    config.retrieval.top_k = 1;

    let mut engine = RagEngine::from_config(&config).unwrap();
    engine
        .ingest(vec![SourceDocument::new("Configuration driven ingestion works.")])
        .await
        .unwrap();

    let outcome = engine.query("does configuration driven ingestion work").await.unwrap();
    assert_eq!(outcome.context.len(), 1);
    assert!(outcome.answer.is_ok());
    assert_eq!(engine.stats().index.embedding_model, "mock-embedding");
}

#[tokio::test]
async fn clearing_the_index_empties_retrieval() {
    init_tracing();
    let mut engine = mock_engine(3);
    engine.ingest(sample_corpus()).await.unwrap();
    assert!(!engine.retrieve("anything at all").await.unwrap().is_empty());

    engine.clear_index();
    assert!(engine.retrieve("anything at all").await.unwrap().is_empty());
    assert_eq!(engine.stats().index.document_count, 0);
}
