use super::*;

use std::io::Write;

use serde_json::json;
use tempfile::NamedTempFile;

use crate::embedding::{FailingEmbedder, StubEmbedder};
use crate::store::{MockRecordStore, RecordStore};

fn catalog_file(lines: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

fn record_line(id: usize, name: &str, developer: &str) -> String {
    json!({
        "_id": format!("g{}", id),
        "name": name,
        "developer": developer,
        "positive": 10 + id,
        "negative": 2,
    })
    .to_string()
}

#[test]
fn test_embedding_text() {
    let record = GameRecord::new("1", "  Portal ").with_developer("Valve");
    assert_eq!(embedding_text(&record).as_deref(), Some("Portal Valve"));

    let blank_dev = GameRecord::new("2", "Portal").with_developer("   ");
    assert_eq!(embedding_text(&blank_dev), None);

    let numeric_dev = GameRecord::new("3", "Portal").with_developer(json!(7));
    assert_eq!(embedding_text(&numeric_dev), None);

    let blank_name = GameRecord::new("4", "").with_developer("Valve");
    assert_eq!(embedding_text(&blank_name), None);
}

#[tokio::test]
async fn test_index_file_embeds_and_upserts() {
    let file = catalog_file(&[
        record_line(1, "Portal", "Valve"),
        String::new(),
        record_line(2, "Celeste", "Maddy Makes Games"),
        "{not json".to_string(),
        record_line(3, "Untitled", ""),
    ]);

    let embedder = StubEmbedder::default();
    let store = MockRecordStore::new();
    let summary = CatalogIndexer::new(&embedder, &store)
        .index_file(file.path())
        .await
        .unwrap();

    assert_eq!(summary.read, 3);
    assert_eq!(summary.skipped_lines, 1);
    assert_eq!(summary.embedded, 2);
    assert_eq!(summary.without_vector, 1);
    assert_eq!(summary.upserted, 3);
    assert_eq!(summary.failed_batches, 0);

    assert_eq!(store.len(), 3);
    assert_eq!(
        store.vector_of("g1"),
        Some(embedder.embed_sync("Portal Valve"))
    );
    assert_eq!(store.vector_of("g3"), None);

    let found = store.find(10).await.unwrap();
    let ids: Vec<&str> = found.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["g1", "g2", "g3"]);
}

#[tokio::test]
async fn test_index_file_batches() {
    let lines: Vec<String> = (0..7)
        .map(|i| record_line(i, &format!("Game {}", i), "Studio"))
        .collect();
    let file = catalog_file(&lines);

    let embedder = StubEmbedder::default();
    let store = MockRecordStore::new();
    let config = IndexerConfig {
        batch_size: 3,
        ..IndexerConfig::default()
    };
    let summary = CatalogIndexer::with_config(&embedder, &store, config)
        .index_file(file.path())
        .await
        .unwrap();

    assert_eq!(summary.read, 7);
    assert_eq!(summary.upserted, 7);
    assert_eq!(store.len(), 7);
}

#[tokio::test]
async fn test_reindex_replaces_points() {
    let embedder = StubEmbedder::default();
    let store = MockRecordStore::new();
    let records = vec![
        GameRecord::new("g1", "Portal").with_developer("Valve"),
        GameRecord::new("g2", "Portal 2").with_developer("Valve"),
    ];

    let mut indexer = CatalogIndexer::new(&embedder, &store);
    indexer.index_records(records.clone()).await.unwrap();
    indexer.index_records(records).await.unwrap();

    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_embedder_failure_stores_without_vector() {
    let embedder = FailingEmbedder::new();
    let store = MockRecordStore::new();
    let records = vec![
        GameRecord::new("g1", "Portal").with_developer("Valve"),
        GameRecord::new("g2", "Nameless"),
    ];

    let summary = CatalogIndexer::new(&embedder, &store)
        .index_records(records)
        .await
        .unwrap();

    assert_eq!(embedder.calls(), 1);
    assert_eq!(summary.embed_failures, 1);
    assert_eq!(summary.without_vector, 2);
    assert_eq!(summary.upserted, 2);
    assert_eq!(store.vector_of("g1"), None);
}

#[tokio::test]
async fn test_failed_batch_is_counted() {
    let embedder = StubEmbedder::default();
    let store = MockRecordStore::new();
    let mut indexer = CatalogIndexer::new(&embedder, &store);

    indexer
        .index_records(vec![GameRecord::new("g1", "Portal").with_developer("Valve")])
        .await
        .unwrap();

    // A vector of the wrong size makes the mock reject the whole batch.
    let other = StubEmbedder::new(8);
    let mut mismatched = CatalogIndexer::new(&other, &store);
    mismatched.dimension = Some(8);
    let summary = mismatched
        .index_records(vec![GameRecord::new("g2", "Celeste").with_developer("Exok")])
        .await
        .unwrap();

    assert_eq!(summary.failed_batches, 1);
    assert_eq!(summary.upserted, 0);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_unavailable_store_is_fatal() {
    let embedder = StubEmbedder::default();
    let store = MockRecordStore::new();
    store.set_unavailable(true);

    let err = CatalogIndexer::new(&embedder, &store)
        .index_records(vec![GameRecord::new("g1", "Portal")])
        .await
        .unwrap_err();
    assert!(matches!(err, IndexerError::Store(_)));
}

#[tokio::test]
async fn test_missing_file() {
    let embedder = StubEmbedder::default();
    let store = MockRecordStore::new();
    let err = CatalogIndexer::new(&embedder, &store)
        .index_file("/nonexistent/catalog.jsonl")
        .await
        .unwrap_err();
    assert!(matches!(err, IndexerError::Io { .. }));
}
