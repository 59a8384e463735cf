//! Integration tests for the file-backed evidence store and its service.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use climarisk::embedding::CharCodeEmbedder;
use climarisk::evidence::{LocalEvidenceStore, seed_corpus};
use climarisk::models::EvidenceDocument;
use climarisk::services::ADDED_AT_KEY;
use climarisk::{Error, EvidenceService, EvidenceStore, NewDocument};
use std::sync::Arc;
use tempfile::TempDir;

fn embedder() -> Arc<CharCodeEmbedder> {
    Arc::new(CharCodeEmbedder::new())
}

#[test]
fn test_corpus_persists_across_reopen() {
    let dir = TempDir::new().expect("creates temp dir");
    let path = dir.path().join("evidence.json");

    let store = LocalEvidenceStore::open(&path, embedder());
    let added = store
        .add(vec![
            NewDocument::new("Heat stroke risk rises sharply above 40°C.").with_metadata("source", "Heat Guide"),
            NewDocument::new("Ozone peaks in the afternoon on sunny days."),
        ])
        .expect("adds");
    assert_eq!(added, 2);
    assert!(path.exists());

    let reopened = LocalEvidenceStore::open(&path, embedder());
    assert_eq!(reopened.len(), 2);

    let hits = reopened
        .search("Heat stroke risk rises sharply above 40°C.", 1)
        .expect("searches");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].source, "Heat Guide");
    assert!((hits[0].relevance_score - 1.0).abs() < 1e-5);
}

#[test]
fn test_corrupt_corpus_starts_empty() {
    let dir = TempDir::new().expect("creates temp dir");
    let path = dir.path().join("evidence.json");
    std::fs::write(&path, "{ not json").expect("writes");

    let store = LocalEvidenceStore::open(&path, embedder());
    assert!(store.is_empty());
    assert!(store.search("anything", 5).expect("searches").is_empty());
}

#[test]
fn test_dimension_mismatch_starts_empty() {
    let dir = TempDir::new().expect("creates temp dir");
    let path = dir.path().join("evidence.json");

    let small = LocalEvidenceStore::open(&path, Arc::new(CharCodeEmbedder::with_dimensions(8)));
    small
        .add(vec![NewDocument::new("short vectors")])
        .expect("adds");

    let store = LocalEvidenceStore::open(&path, embedder());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_seed_then_search() {
    let dir = TempDir::new().expect("creates temp dir");
    let store: Arc<dyn EvidenceStore> = Arc::new(LocalEvidenceStore::open(
        dir.path().join("evidence.json"),
        embedder(),
    ));
    let service = EvidenceService::new(store.clone());

    let seeded = service.seed_if_empty().await.expect("seeds");
    assert_eq!(seeded, seed_corpus().len());
    assert_eq!(service.seed_if_empty().await.expect("no-op"), 0);
    assert_eq!(service.count().await.expect("counts"), seeded);

    let hits = service
        .chat_evidence("air pollution and asthma", 4)
        .await
        .expect("searches");
    assert_eq!(hits.len(), 4);
    assert!(hits.windows(2).all(|w| w[0].relevance_score >= w[1].relevance_score));
}

#[tokio::test]
async fn test_ingest_stamps_source_and_time() {
    let dir = TempDir::new().expect("creates temp dir");
    let path = dir.path().join("evidence.json");
    let store = Arc::new(LocalEvidenceStore::open(&path, embedder()));
    let service = EvidenceService::new(store.clone());

    let added = service
        .ingest_documents(vec![NewDocument::new("Monsoon flooding spreads waterborne disease.")], "Field Notes")
        .await
        .expect("ingests");
    assert_eq!(added, 1);

    let hits = store.search("Monsoon flooding", 1).expect("searches");
    assert_eq!(hits[0].source, "Field Notes");

    let err = service
        .ingest_documents(vec![NewDocument::new("text")], "  ")
        .await
        .expect_err("blank source is rejected");
    assert!(matches!(err, Error::InvalidInput(_)));

    let err = service
        .ingest_documents(vec![NewDocument::new(" ")], "Field Notes")
        .await
        .expect_err("blank content is rejected");
    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(store.len(), 1);

    let saved: Vec<EvidenceDocument> =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("reads")).expect("parses");
    let added_at = saved[0].metadata[ADDED_AT_KEY].as_str().expect("timestamp string");
    assert!(chrono::DateTime::parse_from_rfc3339(added_at).is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_add_and_search() {
    let dir = TempDir::new().expect("creates temp dir");
    let path = dir.path().join("evidence.json");
    let store = Arc::new(LocalEvidenceStore::open(&path, embedder()));
    store.add(seed_corpus()).expect("seeds");
    let seeded = store.len();

    let mut tasks = Vec::new();
    for writer in 0..4 {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            for i in 0..10 {
                let doc = NewDocument::new(format!("Writer {writer} note {i} on heat and smog"));
                store.add_documents(vec![doc]).await.expect("adds");
            }
        }));
    }
    for _ in 0..4 {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            for _ in 0..10 {
                let hits = store
                    .similarity_search("heat and smog", 5)
                    .await
                    .expect("searches");
                assert_eq!(hits.len(), 5);
                assert!(hits.windows(2).all(|w| w[0].relevance_score >= w[1].relevance_score));
            }
        }));
    }
    for task in tasks {
        task.await.expect("task completes");
    }

    assert_eq!(store.count().await.expect("counts"), seeded + 40);
    let reopened = LocalEvidenceStore::open(&path, embedder());
    assert_eq!(reopened.len(), seeded + 40);
}
